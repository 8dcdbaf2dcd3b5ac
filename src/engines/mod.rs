//! OCR engine adapters and backends
//!
//! Each adapter normalizes one backend's native output into an
//! `EngineResult`. Backends are conditionally compiled based on feature flags;
//! the adapters and their filtering rules are always available.

pub mod ocrs;
pub mod scene;
pub mod structured;
pub mod tesseract;

#[cfg(any(feature = "engine-ocrs", feature = "engine-tesseract"))]
mod download;

use crate::config::{Config, EngineConfig};
use crate::engine::{EngineId, EngineInput, OcrEngine};
use crate::error::OcrError;
use scene::{SceneTextAdapter, SceneTextBackend};
use serde::Serialize;
use structured::{StructuredAdapter, TokenBackend};

/// Information about a configured engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: EngineId,
    pub description: &'static str,
    pub input: EngineInput,
    pub enabled: bool,
}

/// Set of engine adapters, in extraction order
pub struct EngineRegistry {
    engines: Vec<Box<dyn OcrEngine>>,
}

impl EngineRegistry {
    /// Build adapters for the requested engines.
    ///
    /// An engine that cannot be initialized is logged and left disabled;
    /// this never fails, even if nothing ends up enabled.
    pub fn new(requested: &EngineConfig, config: &Config) -> Self {
        let structured = if requested.use_tesseract {
            tracing::info!("Initializing tesseract engine...");
            match build_tesseract(config) {
                Ok(backend) => StructuredAdapter::new(backend),
                Err(e) => {
                    tracing::warn!("{}; continuing without it", e);
                    StructuredAdapter::disabled()
                }
            }
        } else {
            StructuredAdapter::disabled()
        };

        let scene = if requested.use_ocrs {
            tracing::info!("Initializing ocrs engine...");
            match build_ocrs(config) {
                Ok(backend) => SceneTextAdapter::new(backend),
                Err(e) => {
                    tracing::warn!("{}; continuing without it", e);
                    SceneTextAdapter::disabled()
                }
            }
        } else {
            SceneTextAdapter::disabled()
        };

        let registry = Self::from_engines(vec![Box::new(structured), Box::new(scene)]);
        let active = registry.active();
        if !active.use_tesseract && !active.use_ocrs {
            tracing::warn!("No OCR engine enabled; every read will return an empty result");
        }
        registry
    }

    /// Use pre-built adapters as-is
    pub fn from_engines(engines: Vec<Box<dyn OcrEngine>>) -> Self {
        Self { engines }
    }

    pub fn engines(&self) -> &[Box<dyn OcrEngine>] {
        &self.engines
    }

    /// Engines that will actually run, after downgrades
    pub fn active(&self) -> EngineConfig {
        let enabled = |id: EngineId| self.engines.iter().any(|e| e.id() == id && e.is_enabled());
        EngineConfig {
            use_tesseract: enabled(EngineId::Tesseract),
            use_ocrs: enabled(EngineId::Ocrs),
        }
    }

    /// Get info about all configured engines
    pub fn info(&self) -> Vec<EngineInfo> {
        self.engines
            .iter()
            .map(|e| EngineInfo {
                name: e.id(),
                description: e.description(),
                input: e.input(),
                enabled: e.is_enabled(),
            })
            .collect()
    }
}

#[cfg(feature = "engine-tesseract")]
fn build_tesseract(config: &Config) -> Result<Box<dyn TokenBackend>, OcrError> {
    Ok(Box::new(tesseract::TesseractBackend::new(config)?))
}

#[cfg(not(feature = "engine-tesseract"))]
fn build_tesseract(_config: &Config) -> Result<Box<dyn TokenBackend>, OcrError> {
    Err(OcrError::EngineUnavailable {
        engine: EngineId::Tesseract,
        reason: "built without the engine-tesseract feature".to_string(),
    })
}

#[cfg(feature = "engine-ocrs")]
fn build_ocrs(config: &Config) -> Result<Box<dyn SceneTextBackend>, OcrError> {
    Ok(Box::new(ocrs::OcrsBackend::new(config)?))
}

#[cfg(not(feature = "engine-ocrs"))]
fn build_ocrs(_config: &Config) -> Result<Box<dyn SceneTextBackend>, OcrError> {
    Err(OcrError::EngineUnavailable {
        engine: EngineId::Ocrs,
        reason: "built without the engine-ocrs feature".to_string(),
    })
}
