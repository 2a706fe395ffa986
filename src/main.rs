//! nexus-search server entry point

use anyhow::Result;
use clap::Parser;
use nexus_search::{
    config,
    engines::EngineLoader,
    network::HttpClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ENV_HELP: &str = "\
Environment:
  NEXUS_DEBUG             Enable debug logging (true/false)
  NEXUS_PORT              Server port
  NEXUS_BIND_ADDRESS      Bind address
  NEXUS_SEARXNG_INSTANCE  SearXNG instance URL
  NEXUS_OLLAMA_HOST       Ollama server for assisted breakdown and summaries
  NEXUS_OLLAMA_MODEL      Ollama model name
  NEXUS_ENABLE_ASSIST     Enable language-model assist (true/false)
  RUST_LOG                Log filter, overrides the debug setting";

/// Parallel multi-engine search with result synthesis
#[derive(Parser, Debug)]
#[command(name = "nexus-search", version, about, after_help = ENV_HELP)]
struct Args {
    /// Path to the settings file
    #[arg(short, long, value_name = "FILE", env = config::SETTINGS_PATH_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration before logging so `general.debug` can set the level
    let config_path = args.config.or_else(config::locate);
    let settings = config::load_from(config_path.as_deref())?;

    let default_level = if settings.general.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Starting nexus-search v{}", nexus_search::VERSION);
    match config_path {
        Some(ref path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;

    // Load engines
    let registry = EngineLoader::load(&settings, &client)?;
    info!("Engines in priority order: {}", registry.names().join(", "));

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    let state = AppState::new(settings, registry, client);
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_config_flag() {
        let args = Args::try_parse_from(["nexus-search", "-c", "/etc/nexus/settings.yml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/nexus/settings.yml")));

        let args = Args::try_parse_from(["nexus-search", "--config", "local.yml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("local.yml")));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Args::try_parse_from(["nexus-search", "--bogus"]).is_err());
    }
}
