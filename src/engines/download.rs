//! Model and training-data downloads
//!
//! Files are fetched once into the user cache directory and reused after.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Cache directory name under the platform cache dir
const CACHE_NAMESPACE: &str = "screen-reader";

/// Return the cached copy of `url`, downloading it first if absent
pub fn ensure_cached(url: &str, subdir: &str, filename: &str) -> Result<PathBuf, String> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_NAMESPACE)
        .join(subdir);

    std::fs::create_dir_all(&cache_dir)
        .map_err(|e| format!("Failed to create cache directory {:?}: {}", cache_dir, e))?;

    let path = cache_dir.join(filename);

    if !path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &path)?;
        tracing::info!("Downloaded {} to {:?}", filename, path);
    } else {
        tracing::info!("Using cached {} from {:?}", filename, path);
    }

    Ok(path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), String> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| format!("Failed to download {}: {}", url, e))?;

    // Body is read fully before the destination file is created
    let buffer = response
        .into_body()
        .read_to_vec()
        .map_err(|e| format!("Failed to read response body: {}", e))?;

    let mut file =
        File::create(path).map_err(|e| format!("Failed to create {:?}: {}", path, e))?;
    file.write_all(&buffer)
        .map_err(|e| format!("Failed to write {:?}: {}", path, e))?;

    Ok(())
}
