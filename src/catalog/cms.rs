use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{CatalogError, RecipeCatalog};
use crate::recipe::{Recipe, RecipePack};

pub const DEFAULT_API_VERSION: &str = "2023-05-03";
pub const DEFAULT_DATASET: &str = "production";

const RECIPE_FIELDS: &str = r#"_id, name, slug, summary, difficulty, prepTime, cookTime, servings,
  "categories": coalesce(categories, tags, []),
  "keywords": coalesce(keywords, []),
  ingredients[]{ _key, name, quantity },
  instructions"#;

/// Connection settings for a Sanity-style content backend.
#[derive(Debug, Clone, PartialEq)]
pub struct CmsConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    /// Only needed for private datasets.
    pub token: Option<String>,
}

impl CmsConfig {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
        }
    }

    pub fn query_url(&self) -> String {
        format!(
            "https://{}.api.sanity.io/v{}/data/query/{}",
            self.project_id, self.api_version, self.dataset
        )
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// Decodes the `{ "result": ... }` envelope returned by the query endpoint.
fn decode_result<T: DeserializeOwned>(body: &str) -> Result<T, CatalogError> {
    let response: QueryResponse<T> = serde_json::from_str(body)?;
    Ok(response.result)
}

fn packs_query() -> String {
    format!(
        r#"*[_type == "recipePack"] | order(name asc) {{ _id, name, slug, description, "recipes": recipes[]->{{ {} }} }}"#,
        RECIPE_FIELDS
    )
}

fn pack_by_slug_query() -> String {
    format!(
        r#"*[_type == "recipePack" && slug.current == $slug][0] {{ _id, name, slug, description, "recipes": recipes[]->{{ {} }} }}"#,
        RECIPE_FIELDS
    )
}

fn recipe_by_slug_query() -> String {
    format!(
        r#"*[_type == "recipe" && slug.current == $slug][0] {{ {}, "packSlug": *[_type == "recipePack" && references(^._id)][0].slug.current }}"#,
        RECIPE_FIELDS
    )
}

fn search_query() -> String {
    format!(
        r#"*[_type == "recipe" && (name match $pattern || summary match $pattern || $term in coalesce(keywords, []) || $term in coalesce(categories, tags, []))] {{ {}, "packSlug": *[_type == "recipePack" && references(^._id)][0].slug.current }}"#,
        RECIPE_FIELDS
    )
}

/// Recipe catalog backed by a headless CMS over HTTP. No retries are attempted.
pub struct CmsCatalog {
    config: CmsConfig,
    client: Client,
}

impl CmsCatalog {
    pub fn new(config: CmsConfig) -> Self {
        Self { config, client: Client::new() }
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// Runs a GROQ query. `params` values are JSON-encoded as the API expects.
    async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        if self.config.project_id.trim().is_empty() || self.config.dataset.trim().is_empty() {
            return Err(CatalogError::Config(
                "project id and dataset must be set for the CMS catalog".to_string(),
            ));
        }
        let mut query_pairs: Vec<(String, String)> = vec![("query".to_string(), groq.to_string())];
        for (name, value) in params {
            query_pairs.push((format!("${}", name), serde_json::to_string(value)?));
        }

        let mut request = self.client.get(self.config.query_url()).query(&query_pairs);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        debug!(url = %self.config.query_url(), "querying content backend");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(CatalogError::Api { status, error_body });
        }

        let body = response.text().await?;
        decode_result(&body)
    }
}

#[async_trait]
impl RecipeCatalog for CmsCatalog {
    async fn all_packs(&self) -> Result<Vec<RecipePack>, CatalogError> {
        let packs: Option<Vec<RecipePack>> = self.query(&packs_query(), &[]).await?;
        Ok(packs.unwrap_or_default())
    }

    async fn recipe_by_slug(&self, slug: &str) -> Result<Option<Recipe>, CatalogError> {
        self.query(&recipe_by_slug_query(), &[("slug", slug)]).await
    }

    async fn pack_by_slug(&self, slug: &str) -> Result<Option<RecipePack>, CatalogError> {
        let pack: Option<RecipePack> = self.query(&pack_by_slug_query(), &[("slug", slug)]).await?;
        Ok(pack.map(|mut pack| {
            pack.recipes = pack.flattened_recipes();
            pack
        }))
    }

    async fn search(&self, query: &str) -> Result<Vec<Recipe>, CatalogError> {
        let term = query.trim().to_lowercase();
        if term.is_empty() {
            return self.all_recipes().await;
        }
        let pattern = format!("*{}*", term);
        let found: Option<Vec<Recipe>> = self
            .query(&search_query(), &[("pattern", pattern.as_str()), ("term", term.as_str())])
            .await?;
        Ok(found.unwrap_or_default())
    }
}
