use std::path::{Path, PathBuf};

use thiserror::Error;

use super::config::ConfigError;
use crate::input::LoadError;
use crate::metrics::MetricsError;
use crate::rendering::RenderError;

/// Top-level error for the subline pipeline
#[derive(Error, Debug)]
pub enum SublineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write a rendered artifact, creating parent directories as needed
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<(), SublineError> {
    let write_err = |source| SublineError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, bytes).map_err(write_err)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
    Ok(())
}
