//! Profile service executable.
//!
//! Reads `PROFILE_*` configuration, starts logging and storage, then serves
//! HTTP until Ctrl-C and lets in-flight requests finish before exiting.

use log::{error, info, warn};
use profile_api::{App, AppConfig, SessionCookie};
use profile_core::{init_logging, SessionStore, Storage};
use profile_server::{prune_sessions, serve, SHUTDOWN_GRACE};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=app_exit module=server status=error error={err}");
            eprintln!("profile_server: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;
    init_logging(&config.log_level, config.log_dir.as_deref())?;

    let storage = Storage::open(&config.backend)?;
    let sessions = Arc::new(SessionStore::new(config.session_ttl));
    let cookie = SessionCookie::new(config.session_ttl, config.cookie_secure);
    let app = Arc::new(App::new(storage, Arc::clone(&sessions), cookie));

    let pruner = tokio::spawn(prune_sessions(sessions, config.session_prune_interval));
    let listener = TcpListener::bind(config.bind_addr).await?;
    let served = serve(listener, app, shutdown_signal(), SHUTDOWN_GRACE).await;
    pruner.abort();
    served?;

    info!("event=app_exit module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=signal_listen module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
}
