use crate::error::CliError;
use clap::Parser;
use commands::{Commands, TableArgs};
use connectors::postgres::PgExecutor;
use grid::{
    backend::{DryRunExecutor, QueryExecutor, SqlQuery},
    definition::TableDefinition,
    factory::{FactoryConfig, GridFactory},
};
use model::metadata::{MetadataProvider, registry::MetadataRegistry};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod request;

#[derive(Parser)]
#[command(name = "datagrid", version = "0.1.0", about = "Server-side data grid tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            table,
            request,
            dialect,
        } => {
            let dialect =
                query::dialect::by_name(&dialect).ok_or(CliError::UnknownDialect(dialect))?;
            let executor: Arc<dyn QueryExecutor> = Arc::new(DryRunExecutor::new(dialect));
            let (definition, metadata) = load_definition(&table)?;
            let factory = load_factory(&table)?;

            let mut data_table = definition.build(&factory, metadata.clone(), executor.clone())?;
            let params = request::load_request(&request, data_table.name())?;
            data_table.handle_request(&params, None)?;

            let Some(state) = data_table.state() else {
                return Err(CliError::InvalidRequest);
            };
            let mut planner = definition.adapter(metadata, executor)?;
            let plan = planner.plan(state, data_table.columns())?;

            info!(table = %data_table.name(), "Planned grid request");
            print_query("total", &plan.total);
            if let Some(filtered) = &plan.filtered {
                print_query("filtered", filtered);
            }
            print_query("data", &plan.data);
        }
        Commands::Describe { table } => {
            let executor: Arc<dyn QueryExecutor> =
                Arc::new(DryRunExecutor::new(Box::new(query::dialect::Postgres)));
            let (definition, metadata) = load_definition(&table)?;
            let factory = load_factory(&table)?;
            let data_table = definition.build(&factory, metadata, executor)?;
            println!("{}", serde_json::to_string_pretty(&data_table.config())?);
        }
        Commands::Fetch {
            table,
            request,
            url,
        } => {
            let executor: Arc<dyn QueryExecutor> = Arc::new(PgExecutor::connect(&url).await?);
            let (definition, metadata) = load_definition(&table)?;
            let factory = load_factory(&table)?;

            let mut data_table = definition.build(&factory, metadata, executor)?;
            let params = request::load_request(&request, data_table.name())?;
            let response = data_table.handle_request(&params, None)?.get_response().await?;

            info!(
                table = %data_table.name(),
                total = response.records_total,
                filtered = response.records_filtered,
                "Fetched grid data"
            );
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

fn load_definition(
    args: &TableArgs,
) -> Result<(TableDefinition, Arc<dyn MetadataProvider>), CliError> {
    let definition = TableDefinition::from_path(&args.table)?;
    let metadata: Arc<dyn MetadataProvider> = Arc::new(MetadataRegistry::from_path(&args.metadata)?);
    Ok((definition, metadata))
}

fn load_factory(args: &TableArgs) -> Result<GridFactory, CliError> {
    let config = match &args.config {
        Some(path) => serde_json::from_str::<FactoryConfig>(&std::fs::read_to_string(path)?)?,
        None => FactoryConfig::default(),
    };
    Ok(GridFactory::new(config))
}

fn print_query(label: &str, query: &SqlQuery) {
    println!("-- {label}");
    println!("{};", query.sql);
    if !query.params.is_empty() {
        let params = query
            .params
            .iter()
            .enumerate()
            .map(|(idx, value)| format!("#{} = {value}", idx + 1))
            .collect::<Vec<_>>()
            .join(", ");
        println!("-- params: {params}");
    }
    println!();
}
