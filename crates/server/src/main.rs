mod api;
mod catalog;
mod config;
mod media;
mod state;
mod upload;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use analysis::Analyzer;
use axum::Router;
use catalog::Catalog;
use config::{config_path_from_env, load_or_create_config, resolve_path, StorageBackend};
use parking_lot::RwLock;
use state::AppState;
use store::{
    open_or_create_db, FsObjectStore, MemoryObjectStore, MemorySongStore, ObjectStore,
    RedbSongStore, SongStore,
};
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

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

    let (songs, objects): (Arc<dyn SongStore>, Arc<dyn ObjectStore>) =
        match config.storage_backend {
            StorageBackend::Filesystem => {
                let index_path = resolve_path(&config_path, &config.index_path);
                if let Some(parent) = index_path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let db = Arc::new(open_or_create_db(&index_path)?);
                let songs = RedbSongStore::new(db);
                if let Err(err) = songs.init_tables() {
                    warn!("Failed to create song tables: {}", err);
                }

                let media_root = resolve_path(&config_path, &config.media_root);
                std::fs::create_dir_all(&media_root)?;
                info!("Storing uploads under {:?}", media_root);
                (
                    Arc::new(songs),
                    Arc::new(FsObjectStore::new(media_root, &config.public_base)),
                )
            }
            StorageBackend::Memory => {
                info!("Memory storage backend selected; uploads will not survive a restart");
                (
                    Arc::new(MemorySongStore::new()),
                    Arc::new(MemoryObjectStore::new(&config.public_base)),
                )
            }
        };

    let analyzer = Analyzer::new(
        Duration::from_millis(config.analysis_delay_ms),
        Duration::from_millis(config.similar_delay_ms),
    );
    let port = config.port;
    let state = AppState {
        config_path,
        config: Arc::new(RwLock::new(config)),
        songs,
        objects,
        catalog: Catalog::new(),
        analyzer,
    };

    let app = Router::new()
        .nest("/api/v1", api::api_router(state.clone()))
        .merge(media::media_router(state))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("0.0.0.0:{}", port);
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
