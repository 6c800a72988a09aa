//! patterns - run text patterns locally or through a worker

use anyhow::bail;
use clap::{Parser, Subcommand};
use pattern_cli::{health, init_logging, load_batch_file, version_info, App, AppConfig, HealthStatus};
use pattern_core::intent::parse_parameters;
use pattern_core::{run_intent, PatternInput, PatternKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "patterns")]
#[command(about = "Run text patterns locally or through a worker", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(short, long, global = true, env = "PATTERNS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered patterns
    List {
        /// Only show one kind: local, remote-worker, remote-api
        #[arg(short, long)]
        kind: Option<PatternKind>,
    },

    /// Run a single pattern
    Run {
        /// Pattern ID
        pattern_id: String,
        /// Text to process
        text: String,
        /// Parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a JSON array of {pattern_id, text, parameters} concurrently
    Batch {
        /// Batch file
        file: PathBuf,
    },

    /// Check registry and worker health
    Health {
        /// Output format: text (default), json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information, including the worker's when configured
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref())?;
    let app = App::bootstrap(&config).await?;

    let outcome = run(cli.command, &app).await;
    app.shutdown().await;
    outcome
}

async fn run(command: Commands, app: &App) -> anyhow::Result<()> {
    match command {
        Commands::List { kind } => {
            let descriptors = match kind {
                Some(kind) => app.registry.list_by_kind(kind),
                None => app.registry.list(),
            };

            println!("{:<20} {:<15} {:<10} {}", "ID", "Kind", "Version", "Description");
            println!("{}", "-".repeat(80));
            for d in descriptors {
                println!("{:<20} {:<15} {:<10} {}", d.id, d.kind, d.version, d.description);
            }
            Ok(())
        }

        Commands::Run {
            pattern_id,
            text,
            params,
            json,
        } => {
            let params = params.unwrap_or_default();

            if json {
                let parameters = parse_parameters(&pattern_id, &params)?;
                let input = PatternInput::new(text).with_parameters(parameters);
                let result = app.registry.execute(&pattern_id, input).await?;
                println!("{}", serde_json::to_string_pretty(&result)?);
                if !result.is_success() {
                    bail!("Pattern '{}' failed", pattern_id);
                }
                return Ok(());
            }

            let outcome = run_intent(&app.registry, &pattern_id, &text, &params).await;
            if !outcome.success {
                bail!(outcome.output);
            }
            println!("{}", outcome.output);
            Ok(())
        }

        Commands::Batch { file } => {
            let requests = load_batch_file(&file)?;
            let results = app.registry.execute_batch(requests).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }

        Commands::Health { format } => {
            let report = health::check(app).await;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Overall Status: {}", match report.status {
                    HealthStatus::Healthy => "✓ Healthy",
                    HealthStatus::Degraded => "⚠ Degraded",
                    HealthStatus::Unhealthy => "✗ Unhealthy",
                });
                println!("Local patterns:  {}", report.local_patterns);
                println!("Remote patterns: {}", report.remote_patterns);
                if let Some(worker) = &report.worker {
                    println!(
                        "Worker:          {} ({}, {}, {}ms)",
                        worker.base_url,
                        worker.state,
                        if worker.healthy { "reachable" } else { "unreachable" },
                        worker.response_time_ms
                    );
                }
            }

            if report.status == HealthStatus::Unhealthy {
                bail!("System is unhealthy");
            }
            Ok(())
        }

        Commands::Version => {
            println!("{}", version_info());
            if let Some(bridge) = &app.bridge {
                match bridge.get_version().await {
                    Ok(versions) => {
                        for (component, version) in versions {
                            println!("  worker {}: {}", component, version);
                        }
                    }
                    Err(e) => println!("  worker: unavailable ({})", e),
                }
            }
            Ok(())
        }
    }
}
