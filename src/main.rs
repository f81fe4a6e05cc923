use clap::{Parser, builder::styling};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use pg2teradata::{
    Config, Normalizer, Pipeline, PostgresExtractor, TeradataClient, TeradataLoader,
    report::print_summary,
};
use std::process::ExitCode;
use std::time::Instant;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Replicate a PostgreSQL table into two Teradata tables in a single snapshot copy
///
/// Exit status: 0 when every table was loaded, 2 when some inserts failed,
/// 3 when every insert failed, 1 on any fatal error.
#[derive(Parser)]
#[command(name = "pg2td", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source connection settings from [default: .env, if present]
    #[arg(short, long)]
    env: Option<String>,

    /// More verbose logging, including every SQL statement
    #[arg(long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let started = Instant::now();
    let cli = Cli::parse();
    match &cli.env {
        Some(path) => {
            dotenvy::from_filename(path).with_context(|| format!("Failed to load {}", path))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    log::info!("Starting the sync process from PostgreSQL to Teradata...");
    log::info!("Step 1: Reading connection settings...");
    let config = Config::from_env().context("Invalid configuration")?;
    log::info!(
        "Replicating {} into {}.{} and {}.{}",
        config.postgres.table.bright_black(),
        config.teradata.database,
        config.teradata.ft_table.cyan(),
        config.teradata.database,
        config.teradata.ofs_table.cyan(),
    );

    let warehouse =
        TeradataClient::try_new(&config.teradata).context("Failed to set up Teradata client")?;

    let pipeline = Pipeline::new(
        PostgresExtractor::new(config.postgres.clone()),
        Normalizer::new(),
        TeradataLoader::new(warehouse, &config.teradata.database, config.teradata.tables()),
    );
    let run = pipeline.run_since(started).await?;

    print_summary(&run);
    Ok(run.report.outcome().exit_code())
}
