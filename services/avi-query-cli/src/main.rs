//! Aviation message query tool
//!
//! Validates message query requests against the configured limits and
//! prints the resulting query options as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use avi_query::{AviConfig, GroupAuthorizer, LimitsTable, Query, RawParameters, StaticAuthorizer};

#[derive(Parser, Debug)]
#[command(name = "avi-query")]
#[command(about = "Validate aviation message query requests")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "AVI_CONFIG")]
    config: Option<PathBuf>,

    /// Api key group memberships file path
    #[arg(long, env = "AVI_MEMBERSHIPS")]
    memberships: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Log as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a query and print the query options
    Parse {
        /// Api key of the caller
        #[arg(long, env = "AVI_APIKEY")]
        apikey: Option<String>,

        /// Query parameter as name=value; may be repeated
        #[arg(short = 'p', long = "param", value_parser = parse_name_value)]
        params: Vec<(String, String)>,

        /// Url encoded query string, e.g. "param=icao,message&icao=EFHK"
        query_string: Option<String>,
    },

    /// Print the limits tiers, or the limits applicable for an api key
    Limits {
        /// Api key of the caller
        #[arg(long, env = "AVI_APIKEY")]
        apikey: Option<String>,
    },
}

fn parse_name_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", s))
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let config = match &args.config {
        Some(path) => AviConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => {
            info!("No configuration given, using default limits");
            AviConfig::default()
        }
    };

    let table = LimitsTable::from_config(&config).context("Invalid limits configuration")?;

    let authorizer = match &args.memberships {
        Some(path) => Some(
            StaticAuthorizer::from_file(path)
                .with_context(|| format!("Failed to load memberships {}", path.display()))?,
        ),
        None => None,
    };
    let authorizer = authorizer.as_ref().map(|a| a as &dyn GroupAuthorizer);

    match args.command {
        Command::Parse {
            apikey,
            params,
            query_string,
        } => {
            let mut raw = query_string
                .as_deref()
                .map(RawParameters::from_query_string)
                .unwrap_or_default();

            for (name, value) in params {
                raw.add(name, value);
            }

            match Query::parse(&raw, &table, authorizer, apikey.as_deref()) {
                Ok(query) => {
                    print_json(&query)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    info!(category = ?e.category(), "Query rejected: {}", e);
                    print_json(&json!({
                        "status": e.http_status_code(),
                        "error": e.header_message(),
                    }))?;
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Limits { apikey } => {
            match apikey {
                Some(apikey) => {
                    let tier = table.resolve(authorizer, Some(apikey.as_str()))?;
                    print_json(tier)?;
                }
                None => print_json(&json!({
                    "authorization": table.uses_authorization(),
                    "tiers": table.tiers(),
                }))?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", output);
    Ok(())
}
