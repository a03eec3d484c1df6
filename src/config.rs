use std::env;
use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::cms::{DEFAULT_API_VERSION, DEFAULT_DATASET};
use crate::catalog::CmsConfig;

pub const DATA_DIR_ENV_VAR: &str = "MEALDECK_DATA_DIR";
pub const STATE_DIR_ENV_VAR: &str = "MEALDECK_STATE_DIR";
pub const CATALOG_ENV_VAR: &str = "MEALDECK_CATALOG";
pub const PROJECT_ID_ENV_VAR: &str = "SANITY_PROJECT_ID";
pub const DATASET_ENV_VAR: &str = "SANITY_DATASET";
pub const API_VERSION_ENV_VAR: &str = "SANITY_API_VERSION";
pub const API_TOKEN_ENV_VAR: &str = "SANITY_API_TOKEN";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_STATE_DIR: &str = ".mealdeck";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Environment variable {0} is required when MEALDECK_CATALOG=cms")]
    MissingVar(&'static str),
    #[error("Unknown catalog source '{0}' (expected 'files' or 'cms')")]
    UnknownCatalog(String),
}

/// Where recipes come from.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSource {
    Files,
    Cms(CmsConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub state_dir: PathBuf,
    pub catalog: CatalogSource,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = var(DATA_DIR_ENV_VAR).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        let state_dir = var(STATE_DIR_ENV_VAR).unwrap_or_else(|| DEFAULT_STATE_DIR.to_string());

        let catalog = match var(CATALOG_ENV_VAR).map(|v| v.to_lowercase()).as_deref() {
            None | Some("files") => CatalogSource::Files,
            Some("cms") => {
                let project_id = var(PROJECT_ID_ENV_VAR).ok_or(ConfigError::MissingVar(PROJECT_ID_ENV_VAR))?;
                CatalogSource::Cms(CmsConfig {
                    project_id,
                    dataset: var(DATASET_ENV_VAR).unwrap_or_else(|| DEFAULT_DATASET.to_string()),
                    api_version: var(API_VERSION_ENV_VAR).unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
                    token: var(API_TOKEN_ENV_VAR),
                })
            }
            Some(other) => return Err(ConfigError::UnknownCatalog(other.to_string())),
        };

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            state_dir: PathBuf::from(state_dir),
            catalog,
        })
    }
}
