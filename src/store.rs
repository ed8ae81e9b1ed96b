use std::path::Path;

use log::{debug, info};
use rusqlite::{params, Connection, Row};
use thiserror::Error;

use crate::model::{
    FamilyGraph, Gender, Person, PersonId, RelationKind, Relationship, RelationshipId,
};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS persons (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    gender TEXT,
    birth_date TEXT,
    death_date TEXT,
    is_adopted INTEGER NOT NULL DEFAULT 0,
    notes TEXT
);
CREATE TABLE IF NOT EXISTS relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    person1_id INTEGER NOT NULL REFERENCES persons(id),
    person2_id INTEGER NOT NULL REFERENCES persons(id),
    relationship_type TEXT NOT NULL
);
";

const PERSON_SELECT_SQL: &str =
    "SELECT id, name, gender, birth_date, death_date, is_adopted, notes FROM persons";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("person not found: {0}")]
    PersonNotFound(PersonId),
    #[error("relationship not found: {0}")]
    RelationshipNotFound(RelationshipId),
    #[error("a person cannot be related to themselves")]
    SelfReferential,
    #[error("person name must not be empty")]
    EmptyName,
    #[error("invalid persisted record: {0}")]
    InvalidData(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed store for person and relationship records. Opening
/// bootstraps the schema, so a fresh path is immediately usable.
pub struct FamilyStore {
    conn: Connection,
}

impl FamilyStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::bootstrap(&conn)?;
        info!(
            "event=db_open status=ok mode=file path={}",
            path.as_ref().display()
        );
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(&conn)?;
        info!("event=db_open status=ok mode=memory");
        Ok(Self { conn })
    }

    fn bootstrap(conn: &Connection) -> StoreResult<()> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    pub fn add_person(&self, person: &Person) -> StoreResult<PersonId> {
        validate_person(person)?;
        self.conn.execute(
            "INSERT INTO persons (name, gender, birth_date, death_date, is_adopted, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                person.name,
                person.gender.as_str(),
                person.birth_date,
                person.death_date,
                person.is_adopted as i64,
                person.notes,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("event=person_created id={id}");
        Ok(id)
    }

    /// Insert preserving the record's own id when it carries one, so
    /// imported relationships keep pointing at the right rows.
    pub fn import_person(&self, person: &Person) -> StoreResult<PersonId> {
        if person.id <= 0 {
            return self.add_person(person);
        }
        validate_person(person)?;
        self.conn.execute(
            "INSERT INTO persons (id, name, gender, birth_date, death_date, is_adopted, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                person.id,
                person.name,
                person.gender.as_str(),
                person.birth_date,
                person.death_date,
                person.is_adopted as i64,
                person.notes,
            ],
        )?;
        debug!("event=person_imported id={}", person.id);
        Ok(person.id)
    }

    pub fn update_person(&self, person: &Person) -> StoreResult<()> {
        validate_person(person)?;
        let changed = self.conn.execute(
            "UPDATE persons
             SET name = ?2, gender = ?3, birth_date = ?4, death_date = ?5,
                 is_adopted = ?6, notes = ?7
             WHERE id = ?1",
            params![
                person.id,
                person.name,
                person.gender.as_str(),
                person.birth_date,
                person.death_date,
                person.is_adopted as i64,
                person.notes,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::PersonNotFound(person.id));
        }
        debug!("event=person_updated id={}", person.id);
        Ok(())
    }

    pub fn get_person(&self, id: PersonId) -> StoreResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE id = ?1"))?;
        let mut rows = stmt.query_map(params![id], row_to_person)?;
        match rows.next() {
            Some(person) => Ok(Some(person?)),
            None => Ok(None),
        }
    }

    pub fn list_persons(&self) -> StoreResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} ORDER BY id"))?;
        let rows = stmt.query_map([], row_to_person)?;
        let mut persons = Vec::new();
        for person in rows {
            persons.push(person?);
        }
        Ok(persons)
    }

    /// Removes the person and every relationship touching them, in one
    /// transaction.
    pub fn delete_person(&mut self, id: PersonId) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM relationships WHERE person1_id = ?1 OR person2_id = ?1",
            params![id],
        )?;
        let changed = tx.execute("DELETE FROM persons WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::PersonNotFound(id));
        }
        tx.commit()?;
        debug!("event=person_deleted id={id}");
        Ok(())
    }

    pub fn add_relationship(
        &self,
        person1: PersonId,
        person2: PersonId,
        kind: RelationKind,
    ) -> StoreResult<RelationshipId> {
        self.validate_endpoints(person1, person2)?;
        self.conn.execute(
            "INSERT INTO relationships (person1_id, person2_id, relationship_type)
             VALUES (?1, ?2, ?3)",
            params![person1, person2, kind.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("event=relationship_created id={id} kind={}", kind.as_str());
        Ok(id)
    }

    pub fn import_relationship(&self, rel: &Relationship) -> StoreResult<RelationshipId> {
        if rel.id <= 0 {
            return self.add_relationship(rel.person1_id, rel.person2_id, rel.kind);
        }
        self.validate_endpoints(rel.person1_id, rel.person2_id)?;
        self.conn.execute(
            "INSERT INTO relationships (id, person1_id, person2_id, relationship_type)
             VALUES (?1, ?2, ?3, ?4)",
            params![rel.id, rel.person1_id, rel.person2_id, rel.kind.as_str()],
        )?;
        Ok(rel.id)
    }

    pub fn list_relationships(&self) -> StoreResult<Vec<Relationship>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, person1_id, person2_id, relationship_type
             FROM relationships ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, RelationshipId>(0)?,
                row.get::<_, PersonId>(1)?,
                row.get::<_, PersonId>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut relationships = Vec::new();
        for row in rows {
            let (id, person1_id, person2_id, kind) = row?;
            let kind = RelationKind::from_token(&kind)
                .map_err(|err| StoreError::InvalidData(err.to_string()))?;
            relationships.push(Relationship {
                id,
                person1_id,
                person2_id,
                kind,
            });
        }
        Ok(relationships)
    }

    pub fn delete_relationship(&self, id: RelationshipId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM relationships WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::RelationshipNotFound(id));
        }
        debug!("event=relationship_deleted id={id}");
        Ok(())
    }

    pub fn load_graph(&self) -> StoreResult<FamilyGraph> {
        Ok(FamilyGraph {
            persons: self.list_persons()?,
            relationships: self.list_relationships()?,
        })
    }

    fn validate_endpoints(&self, person1: PersonId, person2: PersonId) -> StoreResult<()> {
        if person1 == person2 {
            return Err(StoreError::SelfReferential);
        }
        for id in [person1, person2] {
            if !self.person_exists(id)? {
                return Err(StoreError::PersonNotFound(id));
            }
        }
        Ok(())
    }

    fn person_exists(&self, id: PersonId) -> StoreResult<bool> {
        let mut stmt = self.conn.prepare("SELECT 1 FROM persons WHERE id = ?1")?;
        Ok(stmt.exists(params![id])?)
    }
}

fn validate_person(person: &Person) -> StoreResult<()> {
    if person.name.trim().is_empty() {
        return Err(StoreError::EmptyName);
    }
    Ok(())
}

fn row_to_person(row: &Row) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        gender: Gender::from_token(&row.get::<_, Option<String>>(2)?.unwrap_or_default()),
        birth_date: row.get(3)?,
        death_date: row.get(4)?,
        is_adopted: row.get::<_, i64>(5)? != 0,
        notes: row.get(6)?,
    })
}
