//! seo-evaluator - SEO evaluation of CMS content records
//!
//! `evaluate` runs one sweep from the console, `serve` exposes the ajax
//! trigger and the stored evaluations over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seo_common::config::{locate_config_file, RootFolderInitializer, RootFolderResolver, TomlConfig};
use seo_common::db::init_database;
use seo_evaluator::{build_router, AppState, EvaluationOrchestrator, SweepReport};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for seo-evaluator
#[derive(Parser, Debug)]
#[command(name = "seo-evaluator")]
#[command(about = "SEO evaluation of CMS content records")]
#[command(version)]
struct Args {
    /// Root folder holding the database
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides root folder)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one record, or every record of the table when UID is 0
    Evaluate {
        /// Content table, default table when omitted
        table: Option<String>,
        /// Record uid, 0 when omitted or not a number
        uid: Option<String>,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:5790", env = "SEO_BIND")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = locate_config_file(args.config.as_deref());
    let config = TomlConfig::load_or_default(config_path.as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting seo-evaluator v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Configuration file: {}", path.display());
    }

    let db_path = match args.database.clone().or_else(|| config.database.clone()) {
        Some(path) => path,
        None => {
            let root_folder = RootFolderResolver::new()
                .with_cli_arg(args.root_folder.clone())
                .with_config(&config)
                .resolve();
            let initializer = RootFolderInitializer::new(root_folder);
            initializer.ensure_directory_exists()?;
            initializer.database_path()
        }
    };
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path, &config.evaluation)
        .await
        .context("Failed to initialize database")?;

    let orchestrator = Arc::new(
        EvaluationOrchestrator::from_config(pool, &config)
            .context("Failed to initialize evaluation pipeline")?,
    );

    match args.command {
        Command::Evaluate { table, uid } => {
            let table = table.unwrap_or_default();
            let uid = uid.and_then(|u| u.trim().parse().ok()).unwrap_or(0);

            let report = orchestrator
                .evaluate(&table, uid)
                .await
                .context("Evaluation failed")?;
            print_report(&report);
        }
        Command::Serve { bind } => {
            let app = build_router(AppState::new(orchestrator));

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind to {}", bind))?;
            info!("seo-evaluator listening on http://{}", bind);
            info!("Health check: http://{}/health", bind);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;

            info!("Server shutdown complete");
        }
    }

    Ok(())
}

fn print_report(report: &SweepReport) {
    println!(
        "Evaluated {} record(s) of {} (uid {}), skipped {} without content",
        report.evaluated.len(),
        report.table,
        report.uid,
        report.skipped
    );
    for entity in &report.evaluated {
        println!(
            "  {}:{} {}% {}",
            entity.table, entity.uid_foreign, entity.percentage, entity.url
        );
    }
    for diagnostic in report.diagnostics.warnings() {
        println!("warning: {}", diagnostic);
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
