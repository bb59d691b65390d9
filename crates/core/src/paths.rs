//! Cross-Platform Path Utilities
//!
//! Default locations for Rigour's per-user state: the quantized model cache
//! and the managed sidecar install directory. Providers take these as
//! explicit constructor parameters so tests can inject temporary
//! directories; these helpers only supply the home-derived defaults.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Get the user's home directory
pub fn home_dir() -> CoreResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| CoreError::config("Could not determine home directory"))
}

/// Get the Rigour directory (~/.rigour/)
pub fn rigour_dir() -> CoreResult<PathBuf> {
    Ok(home_dir()?.join(".rigour"))
}

/// Get the model cache directory (~/.rigour/models/)
pub fn model_cache_dir() -> CoreResult<PathBuf> {
    Ok(rigour_dir()?.join("models"))
}

/// Get the managed sidecar install directory (~/.rigour/sidecar/)
pub fn sidecar_install_dir() -> CoreResult<PathBuf> {
    Ok(rigour_dir()?.join("sidecar"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> CoreResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
