use buttress::db_operations::{AddOutcome, DocumentQuery, Projection};
use buttress::logging::{LogConfig, LoggingSystem};
use buttress::schema::{flatten_schema, CompiledSchema, SchemaRegistry};
use buttress::{load_node_config, DbOperations, ObjectId, SchemaDescription, SchemaModel};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the node configuration file (storage commands only)
    #[arg(short, long, default_value = "config/node_config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the flattened form of a schema description
    Flatten {
        /// Schema description JSON file
        schema: PathBuf,
    },
    /// Validate a document (or an array of documents) against a schema
    Validate { schema: PathBuf, body: PathBuf },
    /// Reduce a document to the schema's fields, filling in defaults
    Populate { schema: PathBuf, body: PathBuf },
    /// List the update paths a schema accepts
    Paths { schema: PathBuf },
    /// Validate an update request (or an array of them) against a schema
    CheckUpdate { schema: PathBuf, update: PathBuf },
    /// Insert a document into a configured collection
    Add {
        /// Schema name from the configured schema directory
        name: String,
        body: PathBuf,
    },
    /// Apply path updates to a stored document
    Update {
        name: String,
        id: String,
        update: PathBuf,
    },
    /// Print every document of a collection
    Find { name: String },
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn read_schema(path: &Path) -> Result<SchemaDescription, Box<dyn std::error::Error>> {
    Ok(serde_json::from_value(read_json(path)?)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_flatten(schema: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let flattened = flatten_schema(&read_schema(schema)?)?;
    let fields: Map<String, Value> = flattened
        .iter()
        .map(|(path, config)| Ok((path.to_string(), serde_json::to_value(config)?)))
        .collect::<Result<_, serde_json::Error>>()?;
    print_json(&fields)
}

fn handle_paths(schema: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let compiled = CompiledSchema::compile(read_schema(schema)?)?;
    let paths: Vec<Value> = compiled
        .path_context
        .specs()
        .map(|spec| json!({"pattern": spec.pattern(), "type": spec.update_type, "values": spec.values}))
        .collect();
    print_json(&paths)
}

async fn open_model(config_path: &Path, name: &str) -> Result<SchemaModel, Box<dyn std::error::Error>> {
    let config = load_node_config(config_path)?;
    let schema_dir = config
        .schema_dir
        .clone()
        .ok_or("schema_dir is not configured")?;
    let mut registry = SchemaRegistry::new();
    registry.load_from_dir(&schema_dir)?;
    let schema: Arc<CompiledSchema> = registry.get(name)?;

    let db = DbOperations::open(&config.storage_path)?;
    Ok(SchemaModel::new(&db, schema, config.app_short_id.as_deref())?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    LoggingSystem::init_with_config(LogConfig::from_env()).await?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Flatten { schema } => handle_flatten(&schema)?,
        Commands::Validate { schema, body } => {
            let result = buttress::validate(&read_schema(&schema)?, &read_json(&body)?)?;
            print_json(&result)?;
        }
        Commands::Populate { schema, body } => {
            let populated = buttress::apply_app_properties(&read_schema(&schema)?, &read_json(&body)?)?;
            print_json(&populated)?;
        }
        Commands::Paths { schema } => handle_paths(&schema)?,
        Commands::CheckUpdate { schema, update } => {
            let result = buttress::validate_update(
                &buttress::PathContext::new(),
                &read_schema(&schema)?,
                &read_json(&update)?,
            )?;
            print_json(&result)?;
        }
        Commands::Add { name, body } => {
            let model = open_model(&cli.config, &name).await?;
            let body = read_json(&body)?;
            let validation = model.validate(&body);
            if !validation.is_valid {
                print_json(&validation)?;
                return Err(format!("{name}: {validation}").into());
            }
            match model.add(&body, &Map::new()).await? {
                AddOutcome::Document(document) => print_json(&document)?,
                AddOutcome::Ids(ids) => print_json(&ids)?,
            }
        }
        Commands::Update { name, id, update } => {
            let model = open_model(&cli.config, &name).await?;
            let id: ObjectId = id.parse()?;
            let results = model.update_by_path(&read_json(&update)?, id).await?;
            info!("Applied {} updates to {}", results.len(), id);
            print_json(&results)?;
        }
        Commands::Find { name } => {
            let model = open_model(&cli.config, &name).await?;
            let documents = model
                .find(&DocumentQuery::all(), &Projection::none())
                .await?;
            print_json(&documents)?;
        }
    }

    Ok(())
}
