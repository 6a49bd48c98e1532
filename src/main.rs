use std::sync::Arc;

use arbit::app::{App, AppState};
use arbit::config::Config;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "arbit", about = "Triangular arbitrage decision and execution engine")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.init_logging();
    info!("arbit starting");

    let state = Arc::new(AppState::new());
    let mut run = tokio::spawn(App::run(config, Arc::clone(&state)));

    tokio::select! {
        result = &mut run => finish(result),
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, draining in-flight attempts");
            state.request_shutdown();
            finish(run.await);
        }
    }

    info!("arbit stopped");
}

fn finish(result: Result<arbit::error::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(error = %e, "Fatal error");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Runtime task failed");
            std::process::exit(1);
        }
    }
}
