use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::error::EngineError;
use crate::prediction::model::{BoostedEnsemble, LinearModel, StandardScaler};

/// Fitted parameters for one category. Known categories carry the
/// multi-feature ensemble plus its scaler; generic categories carry the
/// pooled chronological line.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryModel {
    Ensemble {
        model: BoostedEnsemble,
        scaler: StandardScaler,
    },
    Chronological {
        model: LinearModel,
    },
}

/// One model slot per category, replaced wholesale on retrain.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ModelRegistry {
    pub models: HashMap<String, CategoryModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str) -> Option<&CategoryModel> {
        self.models.get(category)
    }

    pub fn insert(&mut self, category: &str, model: CategoryModel) {
        self.models.insert(category.to_string(), model);
    }
}

pub fn registry_path(data_dir: &Path) -> PathBuf {
    data_dir.join("models.json")
}

/// Load the persisted registry, falling back to an empty one. Models
/// retrain on the next recorded event anyway, so a missing or stale
/// file only costs one retrain.
pub async fn load_registry(path: &Path) -> ModelRegistry {
    match tokio::fs::read_to_string(path).await {
        Ok(data) => match serde_json::from_str::<ModelRegistry>(&data) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(
                    path = ?path,
                    error = %e,
                    "Failed to parse models.json, starting with an empty registry"
                );
                ModelRegistry::new()
            }
        },
        Err(e) => {
            tracing::debug!(
                path = ?path,
                error = %e,
                "Failed to read models.json, starting with an empty registry"
            );
            ModelRegistry::new()
        }
    }
}

/// Persist the registry after a retrain
pub async fn save_registry(path: &Path, registry: &ModelRegistry) -> Result<(), EngineError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| EngineError::new(
                format!("Failed to create directory: {}", e),
                "io"
            ).with_context(format!("path: {:?}", parent)))?;
    }

    let json = serde_json::to_string_pretty(registry)
        .map_err(|e| EngineError::new(
            format!("Failed to serialize model registry: {}", e),
            "json_serialize"
        ))?;

    tokio::fs::write(path, json)
        .await
        .map_err(|e| EngineError::new(
            format!("Failed to write models.json: {}", e),
            "io"
        ).with_context(format!("path: {:?}", path)))?;

    Ok(())
}
