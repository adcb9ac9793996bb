//! Backend entry-point: loads configuration, initialises tracing and runs the
//! HTTP server.

use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use coredump::inbound::http::session_config::{BuildMode, session_settings_from_env};
use coredump::server::{ServerConfig, create_server};
use coredump::settings::AppSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let config = ServerConfig::from_settings(&settings, session).map_err(std::io::Error::other)?;

    create_server(config).await?.await
}
