pub mod cms;
pub mod file_store;

pub use cms::{CmsCatalog, CmsConfig};
pub use file_store::FileCatalog;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::recipe::{Recipe, RecipePack};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read recipe data at {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse recipe data at {path}: {source}")]
    Parse {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    Api {
        status: reqwest::StatusCode,
        error_body: String,
    },
    #[error("catalog is not configured: {0}")]
    Config(String),
}

/// Read-only access to recipes and packs.
///
/// Only `all_packs` is required; the other lookups default to filtering it.
#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn all_packs(&self) -> Result<Vec<RecipePack>, CatalogError>;

    /// Every recipe of every pack, with `pack_slug` set.
    async fn all_recipes(&self) -> Result<Vec<Recipe>, CatalogError> {
        let packs = self.all_packs().await?;
        Ok(packs.iter().flat_map(RecipePack::flattened_recipes).collect())
    }

    async fn recipe_by_slug(&self, slug: &str) -> Result<Option<Recipe>, CatalogError> {
        let recipes = self.all_recipes().await?;
        Ok(recipes.into_iter().find(|recipe| recipe.slug == slug))
    }

    async fn pack_by_slug(&self, slug: &str) -> Result<Option<RecipePack>, CatalogError> {
        let packs = self.all_packs().await?;
        Ok(packs.into_iter().find(|pack| pack.slug == slug))
    }

    /// Case-insensitive search over name, summary, keywords and categories.
    async fn search(&self, query: &str) -> Result<Vec<Recipe>, CatalogError> {
        let recipes = self.all_recipes().await?;
        Ok(recipes.into_iter().filter(|recipe| recipe.matches_search(query)).collect())
    }
}

#[async_trait]
impl<C: RecipeCatalog + ?Sized> RecipeCatalog for Box<C> {
    async fn all_packs(&self) -> Result<Vec<RecipePack>, CatalogError> {
        (**self).all_packs().await
    }

    async fn all_recipes(&self) -> Result<Vec<Recipe>, CatalogError> {
        (**self).all_recipes().await
    }

    async fn recipe_by_slug(&self, slug: &str) -> Result<Option<Recipe>, CatalogError> {
        (**self).recipe_by_slug(slug).await
    }

    async fn pack_by_slug(&self, slug: &str) -> Result<Option<RecipePack>, CatalogError> {
        (**self).pack_by_slug(slug).await
    }

    async fn search(&self, query: &str) -> Result<Vec<Recipe>, CatalogError> {
        (**self).search(query).await
    }
}
