use crate::cli::{GlobalArgs, ServeArgs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Backend configuration shared by every engine build
#[derive(Debug, Clone)]
pub struct Config {
    /// Tesseract language (e.g., "eng", "deu")
    pub language: String,
    pub tessdata_path: Option<String>,
    /// Directory holding the ocrs `.rten` models; downloaded when unset
    pub models_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            tessdata_path: None,
            models_dir: None,
        }
    }
}

impl From<&GlobalArgs> for Config {
    fn from(args: &GlobalArgs) -> Self {
        Self {
            language: args.language.clone(),
            tessdata_path: args.tessdata_path.clone(),
            models_dir: args.models_dir.clone(),
        }
    }
}

/// Which engines to run. Swapping it rebuilds the engines from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "enabled")]
    pub use_tesseract: bool,
    #[serde(default = "enabled")]
    pub use_ocrs: bool,
}

fn enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            use_tesseract: true,
            use_ocrs: true,
        }
    }
}

impl EngineConfig {
    pub fn none() -> Self {
        Self {
            use_tesseract: false,
            use_ocrs: false,
        }
    }
}

impl From<&GlobalArgs> for EngineConfig {
    fn from(args: &GlobalArgs) -> Self {
        Self {
            use_tesseract: !args.no_tesseract,
            use_ocrs: !args.no_ocrs,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
}

impl From<&ServeArgs> for ServerConfig {
    fn from(args: &ServeArgs) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            max_file_size: args.max_file_size,
        }
    }
}
