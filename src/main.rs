mod config;
mod error;
mod fetch;
mod handlers;
mod ocr;
mod pipeline;
mod render;
mod routes;
mod state;
mod translate;
mod types;

#[cfg(test)]
mod tests;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("image_translate_backend=debug,tower_http=debug")),
        )
        .init();

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    let explicit_path = std::env::var("CONFIG_PATH").ok();
    if let Some(path) = &explicit_path {
        if !std::path::Path::new(path).exists() {
            anyhow::bail!("CONFIG_PATH points to a missing file: {}", path);
        }
    }
    let config_paths: Vec<String> = vec![
        explicit_path,
        Some("conf.yaml".to_string()),
        Some("conf.json".to_string()),
        exe_dir.join("conf.yaml").to_str().map(|s| s.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut config = None;
    for path in &config_paths {
        if !std::path::Path::new(path).exists() {
            tracing::debug!("No config at {}", path);
            continue;
        }
        config = Some(Config::load(path)?);
        info!("Loaded configuration from: {}", path);
        break;
    }

    let mut config = config.unwrap_or_else(|| {
        info!("No config file found, using defaults");
        Config::default()
    });
    config.apply_env_overrides()?;

    let bind_addr = (config.server.host.clone(), config.server.port);
    let route = config.server.route.clone();

    let app_state = AppState::new(config)?;
    let app = routes::build_app(app_state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Starting server on {} (translate route {})", listener.local_addr()?, route);
    axum::serve(listener, app).await?;

    Ok(())
}
