use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::{CatalogError, RecipeCatalog};
use crate::recipe::RecipePack;

/// Recipe packs stored as one JSON file per pack in a directory.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    data_dir: PathBuf,
}

impl FileCatalog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    async fn pack_files(&self) -> Result<Vec<PathBuf>, CatalogError> {
        let io_error = |source| CatalogError::Io { source, path: self.data_dir.clone() };
        let mut entries = fs::read_dir(&self.data_dir).await.map_err(io_error)?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        // read_dir order is platform dependent
        files.sort();
        Ok(files)
    }
}

async fn load_pack(path: &Path) -> Result<RecipePack, CatalogError> {
    let json = fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Io { source, path: path.to_path_buf() })?;
    serde_json::from_str(&json).map_err(|source| CatalogError::Parse { source, path: path.to_path_buf() })
}

#[async_trait]
impl RecipeCatalog for FileCatalog {
    async fn all_packs(&self) -> Result<Vec<RecipePack>, CatalogError> {
        let files = self.pack_files().await?;
        let mut packs = Vec::with_capacity(files.len());
        for path in &files {
            let pack = load_pack(path).await?;
            debug!(path = %path.display(), recipes = pack.recipes.len(), "loaded recipe pack");
            packs.push(pack);
        }
        info!(packs = packs.len(), dir = %self.data_dir.display(), "recipe packs loaded");
        Ok(packs)
    }
}
