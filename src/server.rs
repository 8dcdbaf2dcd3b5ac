use crate::config::{Config, EngineConfig, ServerConfig};
use crate::engine::Region;
use crate::engines::EngineInfo;
use crate::error::OcrError;
use crate::pipeline::{CaptureResult, ScreenReader};
use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Reader currently serving requests, with the configuration that asked for it
struct ActiveReader {
    reader: Arc<ScreenReader>,
    requested: EngineConfig,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    active: Arc<RwLock<ActiveReader>>,
    config: Arc<Config>,
    max_file_size: usize,
}

impl AppState {
    pub fn new(
        reader: ScreenReader,
        requested: EngineConfig,
        config: Config,
        max_file_size: usize,
    ) -> Self {
        Self {
            active: Arc::new(RwLock::new(ActiveReader {
                reader: Arc::new(reader),
                requested,
            })),
            config: Arc::new(config),
            max_file_size,
        }
    }

    async fn reader(&self) -> Arc<ScreenReader> {
        self.active.read().await.reader.clone()
    }
}

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Bare liveness response
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub requested: EngineConfig,
    pub active: EngineConfig,
    pub engines: Vec<EngineInfo>,
    pub max_file_size_bytes: usize,
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub message: String,
    pub requested: EngineConfig,
    pub active: EngineConfig,
}

/// Region capture request; all four fields are needed to select a region
#[derive(Debug, Default, Deserialize)]
pub struct CaptureRequest {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl CaptureRequest {
    fn region(&self) -> Option<Region> {
        match (self.x, self.y, self.width, self.height) {
            (Some(x), Some(y), Some(width), Some(height)) => {
                Some(Region::new(x, y, width, height))
            }
            _ => None,
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    let max_file_size = state.max_file_size;

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/healthz", get(handle_healthz))
        .route("/api/health", get(handle_health))
        .route("/api/info", get(handle_info))
        .route("/api/capture/screen", post(handle_capture_screen))
        .route("/api/capture/region", post(handle_capture_region))
        .route("/api/upload", post(handle_upload))
        .route("/api/config", post(handle_config))
        // Multipart framing needs headroom above the file size itself
        .layer(DefaultBodyLimit::max(max_file_size + 64 * 1024))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    server_config: ServerConfig,
    config: Config,
    engines: EngineConfig,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", server_config.host, server_config.port);

    // Model loading and downloads are blocking
    let reader = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || ScreenReader::with_engines(&engines, &config)).await?
    };

    let state = AppState::new(reader, engines, config, server_config.max_file_size);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Run one read on the blocking pool against the current reader
async fn read_blocking<F>(state: &AppState, read: F) -> Result<Json<CaptureResult>, OcrError>
where
    F: FnOnce(&ScreenReader) -> Result<CaptureResult, OcrError> + Send + 'static,
{
    let reader = state.reader().await;
    let result = tokio::task::spawn_blocking(move || read(&reader))
        .await
        .map_err(|e| OcrError::Internal(format!("OCR task failed: {}", e)))??;
    Ok(Json(result))
}

async fn handle_root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Screen Reader API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_healthz() -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.active.read().await;
    let registry = active.reader.pipeline().registry();

    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        requested: active.requested,
        active: registry.active(),
        engines: registry.info(),
        max_file_size_bytes: state.max_file_size,
    })
}

async fn handle_capture_screen(
    State(state): State<AppState>,
) -> Result<Json<CaptureResult>, OcrError> {
    read_blocking(&state, |reader| reader.read_screen(None)).await
}

async fn handle_capture_region(
    State(state): State<AppState>,
    payload: Result<Json<CaptureRequest>, JsonRejection>,
) -> Result<Json<CaptureResult>, OcrError> {
    let Json(request) = payload.map_err(|e| OcrError::InvalidRequest(e.body_text()))?;
    let region = request.region();
    read_blocking(&state, move |reader| reader.read_screen(region)).await
}

/// Handle image uploads
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CaptureResult>, OcrError> {
    let max = state.max_file_size;
    let mut file_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max, "Failed to parse multipart"))?
    {
        if field.name() == Some("file") {
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max, "Failed to read file data"))?,
            );
        }
    }

    let data = file_data.ok_or(OcrError::MissingFile)?;

    if data.len() > state.max_file_size {
        return Err(OcrError::ImageTooLarge {
            size: data.len(),
            max: state.max_file_size,
        });
    }

    tracing::debug!("Received upload of {} bytes", data.len());
    read_blocking(&state, move |reader| reader.read_upload(&data)).await
}

fn multipart_error(e: MultipartError, max: usize, context: &str) -> OcrError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        OcrError::BodyTooLarge { max }
    } else {
        OcrError::InvalidRequest(format!("{}: {}", context, e))
    }
}

/// Rebuild the engines and swap the active reader
async fn handle_config(
    State(state): State<AppState>,
    payload: Result<Json<EngineConfig>, JsonRejection>,
) -> Result<Json<ConfigResponse>, OcrError> {
    let Json(requested) = payload.map_err(|e| OcrError::InvalidRequest(e.body_text()))?;
    tracing::info!(
        "Reconfiguring engines (tesseract: {}, ocrs: {})",
        requested.use_tesseract,
        requested.use_ocrs
    );

    let config = state.config.clone();
    let reader =
        tokio::task::spawn_blocking(move || ScreenReader::with_engines(&requested, &config))
            .await
            .map_err(|e| OcrError::Internal(format!("Engine rebuild failed: {}", e)))?;
    let active = reader.pipeline().registry().active();

    *state.active.write().await = ActiveReader {
        reader: Arc::new(reader),
        requested,
    };

    Ok(Json(ConfigResponse {
        message: "Configuration updated".to_string(),
        requested,
        active,
    }))
}
