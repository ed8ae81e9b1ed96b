use log::warn;
use thiserror::Error;

use crate::model::{FamilyGraph, Gender, Person};
use crate::store::{FamilyStore, StoreError};

#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),
}

pub type InterchangeResult<T> = Result<T, InterchangeError>;

const NAME_COLUMNS: [&str; 2] = ["name", "名前"];
const GENDER_COLUMNS: [&str; 2] = ["gender", "性別"];
const BIRTH_COLUMNS: [&str; 2] = ["birth_date", "生年月日"];
const DEATH_COLUMNS: [&str; 2] = ["death_date", "没年月日"];
const ADOPTED_COLUMNS: [&str; 2] = ["is_adopted", "養子"];
const NOTES_COLUMNS: [&str; 2] = ["notes", "備考"];

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| names.contains(&header.trim()))
}

fn cell<'a>(record: &'a csv::StringRecord, column: Option<usize>) -> Option<&'a str> {
    let value = record.get(column?)?.trim();
    if value.is_empty() { None } else { Some(value) }
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(value, Some("true") | Some("1"))
}

/// Parse person rows from CSV text. Either English or Japanese column
/// names are accepted; only the name column is required.
pub fn parse_persons_csv(data: &str) -> InterchangeResult<Vec<Person>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();

    let name_col = find_column(&headers, &NAME_COLUMNS)
        .ok_or(InterchangeError::MissingColumn("name"))?;
    let gender_col = find_column(&headers, &GENDER_COLUMNS);
    let birth_col = find_column(&headers, &BIRTH_COLUMNS);
    let death_col = find_column(&headers, &DEATH_COLUMNS);
    let adopted_col = find_column(&headers, &ADOPTED_COLUMNS);
    let notes_col = find_column(&headers, &NOTES_COLUMNS);

    let mut persons = Vec::new();
    for record in reader.records() {
        let record = record?;
        persons.push(Person {
            id: 0,
            name: cell(&record, Some(name_col)).unwrap_or("").to_string(),
            gender: cell(&record, gender_col)
                .map(Gender::from_token)
                .unwrap_or_default(),
            birth_date: cell(&record, birth_col).map(str::to_string),
            death_date: cell(&record, death_col).map(str::to_string),
            is_adopted: parse_bool(cell(&record, adopted_col)),
            notes: cell(&record, notes_col).map(str::to_string),
        });
    }
    Ok(persons)
}

/// Append the CSV rows to the store as new person records. Rows with
/// an empty name are skipped rather than aborting the batch.
pub fn import_csv(store: &FamilyStore, data: &str) -> InterchangeResult<usize> {
    let mut imported = 0usize;
    for person in parse_persons_csv(data)? {
        if person.name.trim().is_empty() {
            warn!("event=csv_import_row_skipped reason=empty_name");
            continue;
        }
        store.add_person(&person)?;
        imported += 1;
    }
    Ok(imported)
}

pub fn persons_to_csv(persons: &[Person]) -> InterchangeResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "name",
        "gender",
        "birth_date",
        "death_date",
        "is_adopted",
        "notes",
    ])?;
    for person in persons {
        writer.write_record([
            person.id.to_string(),
            person.name.clone(),
            person.gender.as_str().to_string(),
            person.birth_date.clone().unwrap_or_default(),
            person.death_date.clone().unwrap_or_default(),
            person.is_adopted.to_string(),
            person.notes.clone().unwrap_or_default(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Import a full graph document, keeping record ids intact so the
/// relationship references still line up.
pub fn import_json(store: &FamilyStore, data: &str) -> InterchangeResult<(usize, usize)> {
    let graph: FamilyGraph = serde_json::from_str(data)?;
    for person in &graph.persons {
        store.import_person(person)?;
    }
    for rel in &graph.relationships {
        store.import_relationship(rel)?;
    }
    Ok((graph.persons.len(), graph.relationships.len()))
}

pub fn export_json(graph: &FamilyGraph) -> InterchangeResult<String> {
    Ok(serde_json::to_string_pretty(graph)?)
}
