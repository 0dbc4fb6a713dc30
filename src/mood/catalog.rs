/// Verse catalog: mood category → list of verses, read once from JSON
use crate::{
    error::{LuneError, LuneResult},
    mood::Verse,
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct VerseCatalog {
    categories: BTreeMap<String, Vec<Verse>>,
}

impl VerseCatalog {
    /// Load the catalog file. A missing file yields an empty catalog so the
    /// rest of the site keeps working; malformed JSON is an error.
    pub async fn load(path: &Path) -> LuneResult<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Verse catalog {:?} not found, mood verses disabled", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let catalog = Self::from_json(&raw)?;
        info!(
            "Loaded verse catalog: {} categories, {} verses",
            catalog.categories.len(),
            catalog.categories.values().map(Vec::len).sum::<usize>()
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> LuneResult<Self> {
        let categories: BTreeMap<String, Vec<Verse>> = serde_json::from_str(raw)
            .map_err(|e| LuneError::Catalog(format!("Invalid verse catalog: {}", e)))?;
        Ok(Self { categories })
    }

    pub fn from_categories(categories: BTreeMap<String, Vec<Verse>>) -> Self {
        Self { categories }
    }

    /// Verses of a category; empty for unknown categories
    pub fn verses(&self, category: &str) -> &[Verse] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Category names, in sorted order
    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }
}
