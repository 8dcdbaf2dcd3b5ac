use crate::engine::EngineId;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine '{engine}' is unavailable: {reason}")]
    EngineUnavailable { engine: EngineId, reason: String },

    #[error("OCR engine '{engine}' failed: {reason}")]
    EngineFailure { engine: EngineId, reason: String },

    #[error("Preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Request body exceeds the upload limit of {max} bytes")]
    BodyTooLarge { max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Pipeline stage the error originated from
    pub fn stage(&self) -> &'static str {
        match self {
            OcrError::EngineUnavailable { .. } => "initializing",
            OcrError::EngineFailure { .. } => "extracting",
            OcrError::Preprocessing(_) => "preprocessing",
            OcrError::Decode(_) | OcrError::Capture(_) => "capturing",
            OcrError::ImageTooLarge { .. }
            | OcrError::BodyTooLarge { .. }
            | OcrError::MissingFile
            | OcrError::InvalidRequest(_) => "request",
            OcrError::Internal(_) => "internal",
        }
    }

    /// Engine responsible for the error, if any
    pub fn engine(&self) -> Option<EngineId> {
        match self {
            OcrError::EngineUnavailable { engine, .. } | OcrError::EngineFailure { engine, .. } => {
                Some(*engine)
            }
            _ => None,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineId>,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            OcrError::EngineUnavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "ENGINE_UNAVAILABLE")
            }
            OcrError::EngineFailure { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "ENGINE_FAILURE"),
            OcrError::Preprocessing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PREPROCESSING_ERROR")
            }
            OcrError::Decode(_) => (StatusCode::BAD_REQUEST, "DECODE_ERROR"),
            OcrError::Capture(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CAPTURE_ERROR"),
            OcrError::ImageTooLarge { .. } | OcrError::BodyTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE")
            }
            OcrError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            OcrError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            OcrError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            stage: self.stage().to_string(),
            engine: self.engine(),
        });

        (status, body).into_response()
    }
}
