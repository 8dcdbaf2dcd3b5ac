use crate::engine::Region;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "screen-reader")]
#[command(about = "Read on-screen text with multiple OCR engines")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Do not run the Tesseract engine
    #[arg(long, global = true)]
    pub no_tesseract: bool,

    /// Do not run the ocrs engine
    #[arg(long, global = true)]
    pub no_ocrs: bool,

    /// Language for Tesseract (e.g., "eng", "deu", "fra")
    #[arg(long, global = true, env = "OCR_LANGUAGE", default_value = "eng")]
    pub language: String,

    /// Path to tessdata directory (downloaded to the cache dir if not set)
    #[arg(long, global = true, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Directory containing text-detection.rten and text-recognition.rten
    #[arg(long, global = true, env = "OCR_MODELS_DIR")]
    pub models_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Read the screen (or an image file) once and print the result as JSON
    Read(ReadArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Screen region as x,y,width,height
    #[arg(long, conflicts_with = "file")]
    pub region: Option<Region>,

    /// Read this image file instead of capturing the screen
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long)]
    pub compact: bool,
}
