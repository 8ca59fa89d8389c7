//! Application catalog lookup
//!
//! The mint endpoint needs exactly one fact it does not own: which workspace
//! and application slug an application id refers to. [`AppCatalog`] is that
//! seam. [`InMemoryCatalog`] backs tests and the file-based catalog of the
//! `pullgate` binary.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Backend unreachable or failing
    #[error("Catalog backend error: {0}")]
    Backend(String),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An application as seen by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    /// Slug of the owning workspace; older workspaces may not have one
    #[serde(default)]
    pub workspace_slug: Option<String>,
    pub app_slug: String,
}

impl AppRecord {
    pub fn new(workspace_slug: impl Into<String>, app_slug: impl Into<String>) -> Self {
        Self {
            workspace_slug: Some(workspace_slug.into()),
            app_slug: app_slug.into(),
        }
    }
}

/// Resolves application ids to workspace/application slugs
#[async_trait]
pub trait AppCatalog: Send + Sync {
    /// `Ok(None)` when the application does not exist
    async fn resolve(&self, app_id: &str) -> Result<Option<AppRecord>, CatalogError>;
}

/// Catalog held in memory
#[derive(Default)]
pub struct InMemoryCatalog {
    apps: RwLock<HashMap<String, AppRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: HashMap<String, AppRecord>) -> Self {
        Self {
            apps: RwLock::new(records),
        }
    }

    /// Load a JSON object mapping app ids to records:
    ///
    /// ```json
    /// { "app-123": { "workspaceSlug": "acme", "appSlug": "web" } }
    /// ```
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let records: HashMap<String, AppRecord> = serde_json::from_str(&contents)?;
        Ok(Self::from_records(records))
    }

    pub async fn insert(&self, app_id: impl Into<String>, record: AppRecord) {
        self.apps.write().await.insert(app_id.into(), record);
    }

    pub async fn len(&self) -> usize {
        self.apps.read().await.len()
    }
}

#[async_trait]
impl AppCatalog for InMemoryCatalog {
    async fn resolve(&self, app_id: &str) -> Result<Option<AppRecord>, CatalogError> {
        Ok(self.apps.read().await.get(app_id).cloned())
    }
}
