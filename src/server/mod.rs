//! The HTTP surface: one classify route, one health route, CORS, and the
//! transport-level upload limit.

pub mod routes;

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use tower_http::cors::{Any, CorsLayer};

use crate::classifier::{Classifier, ImageInference};
use crate::labels::LabelTable;

/// File extensions accepted by the classify endpoint.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Server settings, read from the environment with the original service's
/// defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_mb: usize,
    pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            max_upload_mb: 16,
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

impl ServerConfig {
    /// Reads `PORT`, `MAX_UPLOAD_MB` and `UPLOAD_DIR`, falling back to the
    /// defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            max_upload_mb: env::var("MAX_UPLOAD_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_mb),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

/// Outcome of the one-shot model load at startup. `Failed` is terminal for
/// the process: the server keeps answering, health reports
/// `model_loaded: false`, and every classify call is rejected.
pub enum ModelState {
    Ready(Arc<dyn ImageInference>),
    Failed(String),
}

impl ModelState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Shared, read-only per-request context: the model-load outcome, the
/// immutable label tables and the server settings.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelState>,
    pub labels: Arc<LabelTable>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(model: ModelState, labels: Arc<LabelTable>, config: ServerConfig) -> Self {
        Self {
            model: Arc::new(model),
            labels,
            config: Arc::new(config),
        }
    }

    /// Folds the one-shot startup load (download plus session build) into
    /// shared state. Any failure is terminal for the process: the server
    /// still serves, health reports `model_loaded: false`, and every
    /// classify call is rejected with 500.
    pub fn from_load_outcome(outcome: anyhow::Result<Classifier>, config: ServerConfig) -> Self {
        match outcome {
            Ok(classifier) => {
                info!("Waste classifier loaded successfully");
                let labels = classifier.labels.clone();
                Self::new(ModelState::Ready(Arc::new(classifier)), labels, config)
            }
            Err(e) => {
                error!("Failed to load model: {:#}", e);
                let labels = Arc::new(LabelTable::waste_sorting());
                Self::new(ModelState::Failed(e.to_string()), labels, config)
            }
        }
    }
}

/// Builds the application router. Split from [`serve`] so tests can drive
/// it directly.
pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes();
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/classify", post(routes::classify))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Binds the listener and serves until the process is stopped.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    if let Err(e) = std::fs::create_dir_all(&state.config.upload_dir) {
        error!(
            "Could not create upload directory {:?}: {}",
            state.config.upload_dir, e
        );
    }

    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    let app = router(state);
    axum::serve(listener, app).await?;
    Ok(())
}
