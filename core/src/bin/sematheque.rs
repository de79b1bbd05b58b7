//! Sematheque - federated SPARQL query CLI
//!
//! Command-line front end over the query core: discovery, filtering,
//! details, search, graph exploration and ontology inference.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sematheque_core::{
    shaping, AppConfig, FilterLogic, FilterSpec, SemanticExplorer,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sematheque")]
#[command(version)]
#[command(about = "Federated SPARQL query layer", long_about = None)]
struct Cli {
    /// Configuration file (JSON or YAML)
    #[arg(long, short = 'c', default_value = "config.json", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// List available resource classes (configured + discovered)
    Classes,
    /// List predicates in use across the endpoints
    Properties {
        /// Substring filter on the property URI
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// List distinct values of one predicate
    Values {
        /// Property URI
        property: String,
        /// Substring filter on value or label
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Filter subjects with a structured specification
    Filter {
        /// Filter specification (JSON, property URI -> values/nestedFilters)
        spec: String,
        /// How top-level conditions combine
        #[arg(long, value_enum, default_value_t = LogicArg::And)]
        logic: LogicArg,
        /// Print the generated SPARQL instead of executing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show all properties and values of one resource, pivoted
    Details {
        /// Resource URI(s)
        uris: Vec<String>,
    },
    /// Search resources by label substring
    Search {
        text: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Restrict matches to one class URI
        #[arg(long = "type")]
        type_uri: Option<String>,
    },
    /// Explore the neighborhood of one resource
    Explore {
        uri: String,
        /// Expansion depth (1 or 2)
        #[arg(long, default_value_t = 1)]
        depth: u8,
    },
    /// Show label and type of one resource
    Metadata { uri: String },
    /// List instances of one class (URI or label)
    ByType { class: String },
    /// Infer the ontology structure from instance data
    Ontology {
        /// Use a single global pass against one named endpoint instead of
        /// per-class sampling across the federation
        #[arg(long)]
        global: Option<String>,
    },
    /// Execute raw SPARQL text
    Query {
        sparql: String,
        /// Target one named endpoint instead of the whole federation
        #[arg(long)]
        endpoint: Option<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogicArg {
    And,
    Or,
}

impl From<LogicArg> for FilterLogic {
    fn from(arg: LogicArg) -> Self {
        match arg {
            LogicArg::And => FilterLogic::And,
            LogicArg::Or => FilterLogic::Or,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sematheque_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config);
    let explorer = SemanticExplorer::new(config)?;

    match cli.command {
        Commands::Classes => {
            print_json(&explorer.list_classes().await)?;
        }
        Commands::Properties { search, limit } => {
            print_json(&explorer.list_properties(search.as_deref(), limit).await)?;
        }
        Commands::Values {
            property,
            search,
            limit,
        } => {
            print_json(
                &explorer
                    .list_unique_values(&property, search.as_deref(), limit)
                    .await,
            )?;
        }
        Commands::Filter {
            spec,
            logic,
            dry_run,
        } => {
            let spec: FilterSpec =
                serde_json::from_str(&spec).context("invalid filter specification")?;
            if dry_run {
                println!("{}", explorer.build_filter_query(&spec, logic.into()));
            } else {
                let rows = explorer.filter_resources(&spec, logic.into()).await;
                print_records(&explorer.pivot(&rows), cli.format)?;
            }
        }
        Commands::Details { uris } => {
            let rows = match uris.as_slice() {
                [uri] => {
                    // Single-resource detail rows carry no subject column;
                    // stamp the URI on so the pivot can group them.
                    let mut rows = explorer.resource_details(uri).await;
                    rows.fill_column("subject", uri);
                    rows
                }
                many => explorer.bulk_details(many).await,
            };
            print_records(&explorer.pivot(&rows), cli.format)?;
        }
        Commands::Search {
            text,
            limit,
            type_uri,
        } => {
            print_json(
                &explorer
                    .search_resources(&text, limit, type_uri.as_deref())
                    .await,
            )?;
        }
        Commands::Explore { uri, depth } => {
            print_json(&explorer.explore_graph(&uri, depth).await)?;
        }
        Commands::Metadata { uri } => {
            print_json(&explorer.resource_metadata(&uri).await)?;
        }
        Commands::ByType { class } => {
            print_json(&explorer.resources_by_type(&class).await?)?;
        }
        Commands::Ontology { global } => {
            let structure = match global {
                Some(name) => {
                    let endpoint = explorer
                        .config()
                        .endpoints
                        .iter()
                        .find(|e| e.name == name)
                        .cloned()
                        .with_context(|| format!("no endpoint named '{}'", name))?;
                    explorer.ontology_structure_global(&endpoint).await
                }
                None => explorer.ontology_structure().await,
            };
            print_json(&structure)?;
        }
        Commands::Query { sparql, endpoint } => {
            let target = match endpoint {
                Some(name) => Some(
                    explorer
                        .config()
                        .endpoints
                        .iter()
                        .find(|e| e.name == name)
                        .cloned()
                        .with_context(|| format!("no endpoint named '{}'", name))?,
                ),
                None => None,
            };
            let rows = explorer.execute(&sparql, target.as_ref()).await;
            print_rows(&rows)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_records(records: &[shaping::WideRecord], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print!("{}", shaping::to_json(records)?),
        OutputFormat::Csv => print!("{}", shaping::to_csv(records)),
    }
    println!();
    Ok(())
}

fn print_rows(rows: &sematheque_core::ResultSet) -> anyhow::Result<()> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = rows
        .row_indices()
        .map(|i| {
            rows.columns()
                .iter()
                .filter_map(|column| {
                    rows.get(i, column).map(|value| {
                        (column.clone(), serde_json::Value::String(value.to_string()))
                    })
                })
                .collect()
        })
        .collect();
    print_json(&records)
}
