use crate::config::{Config, load_config};
use crate::interchange;
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::logging;
use crate::model::{FamilyGraph, Gender, Person, RelationKind};
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::render::{render_svg, write_output_svg};
use crate::store::FamilyStore;
use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "famtree",
    version,
    about = "Genealogy record store and family-tree diagram renderer"
)]
pub struct Args {
    /// SQLite database file
    #[arg(short = 'd', long = "db", default_value = "family_tree.db")]
    pub db: PathBuf,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long = "logLevel")]
    pub log_level: Option<String>,

    /// Log to rolling files in this directory instead of stderr
    #[arg(long = "logDir")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the family tree diagram
    Render {
        /// JSON snapshot to render instead of the database, '-' for stdin
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,

        /// Output file (svg/png). Defaults to stdout for SVG if omitted.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
        output_format: OutputFormat,

        /// Show only this person (name fragment) and their relatives
        #[arg(long = "focus")]
        focus: Option<String>,

        /// Also write the computed layout as JSON
        #[arg(long = "dumpLayout")]
        dump_layout: Option<PathBuf>,
    },
    /// Import records into the database
    Import {
        #[arg(short = 'f', long = "format", value_enum)]
        format: DataFormat,

        /// Input file, '-' or omitted for stdin
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,
    },
    /// Export records from the database
    Export {
        #[arg(short = 'f', long = "format", value_enum)]
        format: DataFormat,

        /// Output file; stdout if omitted
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Manage person records
    #[command(subcommand)]
    Person(PersonCommand),
    /// Manage relationship records
    #[command(subcommand)]
    Rel(RelCommand),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DataFormat {
    Csv,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum PersonCommand {
    /// Add a person
    Add {
        #[arg(long)]
        name: String,
        /// male / female; omitted means unknown
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        birth: Option<String>,
        #[arg(long)]
        death: Option<String>,
        #[arg(long)]
        adopted: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Update fields of an existing person
    Set {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        birth: Option<String>,
        #[arg(long)]
        death: Option<String>,
        #[arg(long)]
        adopted: Option<bool>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List all people
    List,
    /// Delete a person and their relationships
    Rm { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum RelCommand {
    /// Add a relationship (spouse | ex_spouse | parent_child)
    Add {
        person1: i64,
        person2: i64,
        kind: String,
    },
    /// List all relationships
    List,
    /// Delete a relationship
    Rm { id: i64 },
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| logging::default_log_level().to_string());
    logging::init_logging(&level, args.log_dir.as_deref()).map_err(|err| anyhow!(err))?;
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Render {
            input,
            output,
            output_format,
            focus,
            dump_layout,
        } => cmd_render(
            &args.db,
            input.as_deref(),
            output.as_deref(),
            output_format,
            focus.as_deref(),
            dump_layout.as_deref(),
            &config,
        ),
        Command::Import { format, input } => cmd_import(&args.db, format, input.as_deref()),
        Command::Export { format, output } => cmd_export(&args.db, format, output.as_deref()),
        Command::Person(command) => cmd_person(&args.db, command),
        Command::Rel(command) => cmd_rel(&args.db, command),
    }
}

fn cmd_render(
    db: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
    output_format: OutputFormat,
    focus: Option<&str>,
    dump_layout: Option<&Path>,
    config: &Config,
) -> Result<()> {
    let mut graph = match input {
        Some(path) => {
            let data = read_input(Some(path))?;
            serde_json::from_str::<FamilyGraph>(&data)?
        }
        None => FamilyStore::open(db)?.load_graph()?,
    };

    if let Some(fragment) = focus {
        let person_id = graph
            .find_by_name(fragment)
            .map(|person| person.id)
            .ok_or_else(|| anyhow!("no person matching `{fragment}`"))?;
        graph = graph.focused(person_id);
    }

    let layout = compute_layout(&graph, &config.layout);
    if let Some(path) = dump_layout {
        write_layout_dump(path, &layout)?;
    }
    let svg = render_svg(&layout, &config.theme, &config.layout);

    match output_format {
        OutputFormat::Svg => write_output_svg(&svg, output)?,
        OutputFormat::Png => {
            #[cfg(feature = "png")]
            {
                let path =
                    output.ok_or_else(|| anyhow!("output path required for png output"))?;
                write_output_png(&svg, path, &config.render, &config.theme)?;
            }
            #[cfg(not(feature = "png"))]
            {
                return Err(anyhow!(
                    "this build has no PNG support; rebuild with the `png` feature"
                ));
            }
        }
    }
    Ok(())
}

fn cmd_import(db: &Path, format: DataFormat, input: Option<&Path>) -> Result<()> {
    let data = read_input(input)?;
    let store = FamilyStore::open(db)?;
    match format {
        DataFormat::Csv => {
            let imported = interchange::import_csv(&store, &data)?;
            println!("Imported {imported} people");
        }
        DataFormat::Json => {
            let (persons, relationships) = interchange::import_json(&store, &data)?;
            println!("Imported {persons} people and {relationships} relationships");
        }
    }
    Ok(())
}

fn cmd_export(db: &Path, format: DataFormat, output: Option<&Path>) -> Result<()> {
    let store = FamilyStore::open(db)?;
    let graph = store.load_graph()?;
    let data = match format {
        DataFormat::Csv => interchange::persons_to_csv(&graph.persons)?,
        DataFormat::Json => interchange::export_json(&graph)?,
    };
    write_text_output(&data, output)
}

fn cmd_person(db: &Path, command: PersonCommand) -> Result<()> {
    let mut store = FamilyStore::open(db)?;
    match command {
        PersonCommand::Add {
            name,
            gender,
            birth,
            death,
            adopted,
            notes,
        } => {
            let person = Person {
                id: 0,
                name,
                gender: gender.as_deref().map(Gender::from_token).unwrap_or_default(),
                birth_date: birth,
                death_date: death,
                is_adopted: adopted,
                notes,
            };
            let id = store.add_person(&person)?;
            println!("Added person {id}");
        }
        PersonCommand::Set {
            id,
            name,
            gender,
            birth,
            death,
            adopted,
            notes,
        } => {
            let mut person = store
                .get_person(id)?
                .ok_or_else(|| anyhow!("person {id} not found"))?;
            if let Some(name) = name {
                person.name = name;
            }
            if let Some(gender) = gender {
                person.gender = Gender::from_token(&gender);
            }
            if let Some(birth) = birth {
                person.birth_date = Some(birth);
            }
            if let Some(death) = death {
                person.death_date = Some(death);
            }
            if let Some(adopted) = adopted {
                person.is_adopted = adopted;
            }
            if let Some(notes) = notes {
                person.notes = Some(notes);
            }
            store.update_person(&person)?;
            println!("Updated person {id}");
        }
        PersonCommand::List => {
            for person in store.list_persons()? {
                println!(
                    "{:>5}  {:<24} {:<8} {:<12} {:<12} {}{}",
                    person.id,
                    person.name,
                    match person.gender {
                        Gender::Unknown => "-",
                        gender => gender.as_str(),
                    },
                    person.birth_date.as_deref().unwrap_or("-"),
                    person.death_date.as_deref().unwrap_or("-"),
                    if person.is_adopted { "adopted " } else { "" },
                    person.notes.as_deref().unwrap_or("")
                );
            }
        }
        PersonCommand::Rm { id } => {
            store.delete_person(id)?;
            println!("Deleted person {id}");
        }
    }
    Ok(())
}

fn cmd_rel(db: &Path, command: RelCommand) -> Result<()> {
    let store = FamilyStore::open(db)?;
    match command {
        RelCommand::Add {
            person1,
            person2,
            kind,
        } => {
            let kind = RelationKind::from_token(&kind).map_err(|err| anyhow!(err))?;
            let id = store.add_relationship(person1, person2, kind)?;
            println!("Added relationship {id}");
        }
        RelCommand::List => {
            let graph = store.load_graph()?;
            for rel in &graph.relationships {
                let name = |id| {
                    graph
                        .person(id)
                        .map(|person| person.name.clone())
                        .unwrap_or_else(|| format!("#{id}"))
                };
                println!(
                    "{:>5}  {:<24} {:<12} {}",
                    rel.id,
                    name(rel.person1_id),
                    rel.kind.as_str(),
                    name(rel.person2_id)
                );
            }
        }
        RelCommand::Rm { id } => {
            store.delete_relationship(id)?;
            println!("Deleted relationship {id}");
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_text_output(data: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, data)?,
        None => io::stdout().write_all(data.as_bytes())?,
    }
    Ok(())
}
