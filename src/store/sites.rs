//! Site configurations read from a YAML file.
//!
//! The file holds a sequence of site documents:
//!
//! ```yaml
//! - name: example
//!   url: https://www.example.test
//!   location: Berlin
//!   globs: ["https://www.example.test/news/*"]
//!   articles:
//!     data:
//!       teaser:   { selector: ".teaser", content: text }
//!       headline: { selector: "h1", content: text }
//!       content:  { selector: "article p", content: text, count: multiple }
//!       date:     { selector: "time", content: attribute, attribute: datetime, type: date }
//! ```

use super::ConfigStore;
use crate::errors::StoreError;
use crate::models::SiteConfig;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct YamlConfigStore {
    path: PathBuf,
}

impl YamlConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for YamlConfigStore {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn site_configs(&self) -> Result<Vec<SiteConfig>, StoreError> {
        let body = fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Unavailable {
                path: self.path.display().to_string(),
                source,
            })?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let sites: Vec<SiteConfig> = serde_yaml::from_str(&body)?;
        info!(count = sites.len(), "Loaded site configurations");
        Ok(sites)
    }
}
