mod api;
mod auth;
mod config;
mod state;
mod streaming;
mod utils;

use api::api_router;
use auth::Credentials;
use config::{
    config_path_from_env, load_or_create_config, resolve_asset_path, resolve_music_root,
    resolve_path,
};
use library::{Library, LibraryConfig, SkipPolicy};
use state::AppState;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let skip_policy = if config.log_skipped_files {
        SkipPolicy::Log
    } else {
        SkipPolicy::Silent
    };
    let library = Library::open(LibraryConfig {
        storage_path: resolve_path(&config_path, &config.storage_path),
        artwork_path: resolve_path(&config_path, &config.artwork_path),
        placeholder_path: resolve_asset_path(&config_path, &config.placeholder_path),
        skip_policy,
    })?;

    let music_root = resolve_music_root(&config_path, &config.music_root);
    match &music_root {
        Some(root) if !root.is_dir() => warn!("Music root {:?} does not exist yet", root),
        Some(_) => {}
        None => info!("music_root is not configured; /sync is unavailable."),
    }

    let credentials = Credentials::from_config(&config.auth);
    if credentials.is_some() {
        info!("Basic auth enabled");
    }

    let state = AppState {
        library,
        music_root,
        credentials,
    };

    if config.sync_on_start {
        if let Some(root) = state.music_root.clone() {
            let library = state.library.clone();
            tokio::task::spawn_blocking(move || match library.sync(&root) {
                Ok(report) => info!(
                    "Startup sync complete: {} tracks, {} albums",
                    report.tracks,
                    report.albums.len()
                ),
                Err(err) => error!("Startup sync failed: {}", err),
            });
        }
    }

    let app = api_router(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
