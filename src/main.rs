mod telemetry;

use anyhow::Context;
use api::AppState;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = optional_dotenv(dotenvy::dotenv()).context("failed to load .env")?;

    telemetry::init().context("failed to initialize tracing")?;
    if let Some(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }

    let state = AppState::from_env()
        .inspect_err(|e| error!(error = %e, "startup configuration is invalid"))
        .context("failed to build application state")?;

    api::start(state).await.context("HTTP server failed")?;
    Ok(())
}

/// A missing .env is fine; a malformed one is a configuration error.
fn optional_dotenv<T>(loaded: Result<T, dotenvy::Error>) -> Result<Option<T>, dotenvy::Error> {
    match loaded {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
