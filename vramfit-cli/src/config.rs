use std::path::PathBuf;

use anyhow::{Context, Result};
use vramfit_core::{HardwareDatabase, ModelDatabase};

pub const MODELS_FILE_ENV: &str = "VRAMFIT_MODELS_FILE";
pub const HARDWARE_FILE_ENV: &str = "VRAMFIT_HARDWARE_FILE";

/// Where a catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Embedded,
    File(PathBuf),
}

/// Flag first, then the environment variable, then the built-in data.
pub fn resolve_source(flag: Option<PathBuf>, env_var: &str) -> CatalogSource {
    resolve_source_with(flag, env_var, std::env::var(env_var).ok())
}

fn resolve_source_with(
    flag: Option<PathBuf>,
    env_var: &str,
    env_value: Option<String>,
) -> CatalogSource {
    if let Some(path) = flag {
        return CatalogSource::File(path);
    }

    let Some(raw) = env_value else {
        return CatalogSource::Embedded;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::warn!("{} is set but empty, using the built-in catalog", env_var);
        return CatalogSource::Embedded;
    }
    CatalogSource::File(PathBuf::from(trimmed))
}

/// Both catalogs, loaded once per invocation.
pub struct Catalogs {
    pub models: ModelDatabase,
    pub hardware: HardwareDatabase,
}

impl Catalogs {
    pub fn load(models_file: Option<PathBuf>, hardware_file: Option<PathBuf>) -> Result<Self> {
        let models = match resolve_source(models_file, MODELS_FILE_ENV) {
            CatalogSource::Embedded => {
                ModelDatabase::embedded().context("built-in model catalog is invalid")?
            }
            CatalogSource::File(path) => {
                tracing::debug!(path = %path.display(), "reading model catalog");
                ModelDatabase::from_path(&path).with_context(|| {
                    format!("could not load model catalog from {}", path.display())
                })?
            }
        };

        let hardware = match resolve_source(hardware_file, HARDWARE_FILE_ENV) {
            CatalogSource::Embedded => {
                HardwareDatabase::embedded().context("built-in hardware catalog is invalid")?
            }
            CatalogSource::File(path) => {
                tracing::debug!(path = %path.display(), "reading hardware catalog");
                HardwareDatabase::from_path(&path).with_context(|| {
                    format!("could not load hardware catalog from {}", path.display())
                })?
            }
        };

        Ok(Catalogs { models, hardware })
    }
}
