//! vpcwatch: operator CLI for the detection pipeline.
//!
//! `run` performs one local invocation, `check` tests each external
//! component, `queries` prints the detector SQL.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use vpcwatch_core::config::{load_dotenv, load_dotenv_from};
use vpcwatch_core::Config;
use vpcwatch_detector::{build_pipeline, build_queries, check_components, handle_invocation};

/// VPC flow-log anomaly detection.
#[derive(Parser, Debug)]
#[command(name = "vpcwatch", version, about)]
struct Cli {
    /// Configuration profile; keys are looked up as {PROFILE}_{KEY} first.
    #[arg(long, global = true, env = "VPCWATCH_PROFILE")]
    profile: Option<String>,

    /// Load environment from this file instead of ./.env.
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Emit JSON logs.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the detection pipeline once and print the response.
    Run {
        /// Request id to report; a random UUID when omitted.
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Check connectivity to Athena, SNS and the model.
    Check {
        /// Also publish a test notification to the configured topic.
        #[arg(long)]
        send_test: bool,
    },
    /// Print the detector SQL for the current configuration.
    Queries,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => load_dotenv_from(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => load_dotenv(),
    }
    init_tracing(cli.json_logs);

    let config = match cli.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };

    match cli.command {
        Command::Queries => {
            let queries = build_queries(&config).context("configuration is incomplete")?;
            for query in queries {
                println!("-- {}\n{};\n", query.name, query.sql);
            }
        }
        Command::Run { request_id } => {
            config.log_summary();
            let pipeline = build_pipeline(config).await;
            let request_id = request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let response = handle_invocation(&pipeline, &request_id).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_success() {
                bail!("invocation {request_id} failed");
            }
        }
        Command::Check { send_test } => {
            let pipeline = build_pipeline(config).await;
            let checks = check_components(&pipeline, send_test).await;

            for check in &checks {
                let mark = if check.ok { "ok" } else { "FAIL" };
                println!("{:<8} {:<5} {}", check.component, mark, check.detail);
            }

            let failed = checks.iter().filter(|c| !c.ok).count();
            if failed > 0 {
                bail!("{failed} component check(s) failed");
            }
            info!("All component checks passed");
        }
    }

    Ok(())
}
