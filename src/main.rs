use std::sync::Arc;

use anyhow::Context;

use job_tracker::config::{RunMode, TrackerConfig};
use job_tracker::jobs::{JobStore, JobsState, job_routes};
use job_tracker::menu;

const USAGE: &str = "Usage: job-tracker [menu | serve [PORT]]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let serve = match args.next().as_deref() {
        None | Some("menu") => false,
        Some("serve") => true,
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let mut config = TrackerConfig::from_env()?;
    if serve && let Some(port) = args.next() {
        config = config.with_port_arg(&port)?;
    }

    // The menu owns stdout; keep routine logs out of its way unless debugging.
    let default_filter = match (serve, config.mode) {
        (false, RunMode::Production) => "warn",
        _ => config.default_log_filter(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(JobStore::new(config.data_file.clone()));

    if !serve {
        menu::run_stdio(store).await?;
        return Ok(());
    }

    let addr = config.bind_addr();
    eprintln!("📋 Job Tracker v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Data file: {}", config.data_file.display());
    eprintln!("   Mode: {:?}", config.mode);
    eprintln!("   Jobs API: http://{}/api/jobs", addr);

    let app = job_routes(JobsState::new(store));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Job tracker server started");
    axum::serve(listener, app).await?;

    Ok(())
}
