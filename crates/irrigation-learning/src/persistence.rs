//! JSON artifacts of a trained engine.
//!
//! A model directory holds, per task:
//!
//! | File | Content |
//! |---|---|
//! | `best_{task}_model.json` | selected model, its name and label mapping |
//! | `{task}_scaler.json` | fitted [`StandardScaler`] |
//! | `{task}_pca.json` | fitted [`Pca`], only when PCA was active |
//! | `{task}_schema.json` | [`FeatureSchema`] |

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use irrigation_processing::Task;

use crate::error::{LearningError, Result};

/// The selected model as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModel<M> {
    pub name: String,
    pub model: M,
    /// Original `(negative, positive)` labels of a classifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<[f64; 2]>,
}

/// Locations of one task's artifacts inside a model directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub pca: PathBuf,
    pub schema: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl AsRef<Path>, task: Task) -> Self {
        let dir = dir.as_ref();
        let task = task.as_str();
        Self {
            model: dir.join(format!("best_{task}_model.json")),
            scaler: dir.join(format!("{task}_scaler.json")),
            pca: dir.join(format!("{task}_pca.json")),
            schema: dir.join(format!("{task}_schema.json")),
        }
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(LearningError::ArtifactNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        let paths = ArtifactPaths::new("models", Task::Classification);
        assert_eq!(paths.model, Path::new("models/best_classification_model.json"));
        assert_eq!(paths.scaler, Path::new("models/classification_scaler.json"));
        assert_eq!(paths.schema, Path::new("models/classification_schema.json"));
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<SavedModel<()>> = read_json(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(LearningError::ArtifactNotFound { .. })));
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("value.json");
        write_json(&path, &vec![1.0, 2.0]).unwrap();
        let back: Vec<f64> = read_json(&path).unwrap();
        assert_eq!(back, vec![1.0, 2.0]);
    }
}
