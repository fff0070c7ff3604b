use crate::error::Error;
use crate::external::ExternalModel;
use crate::generator::GeneratorFactory;
use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A registered model: its implementation and, optionally, shipped weights.
#[derive(Clone)]
pub struct ModelEntry {
    pub implementation: Arc<dyn GeneratorFactory>,
    pub pretrained: Option<PathBuf>,
}

impl ModelEntry {
    pub fn new(implementation: Arc<dyn GeneratorFactory>) -> Self {
        Self {
            implementation,
            pretrained: None,
        }
    }

    pub fn with_pretrained(mut self, path: impl Into<PathBuf>) -> Self {
        self.pretrained = Some(path.into());
        self
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("pretrained", &self.pretrained)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    entries: BTreeMap<String, ModelEntry>,
}

#[derive(Deserialize)]
struct Manifest {
    models: BTreeMap<String, ManifestEntry>,
}

#[derive(Deserialize)]
struct ManifestEntry {
    command: Vec<String>,
    pretrained: Option<PathBuf>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, entry: ModelEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Reads a JSON manifest of externally implemented models.
    ///
    /// Relative `pretrained` paths are taken relative to the manifest's directory.
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| {
                format!("Failed to read model manifest {:?} (set it with --models)", path)
            })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| Error::manifest(path, e.to_string()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let mut registry = Self::new();
        for (name, entry) in manifest.models {
            let model = ExternalModel::from_command(name.clone(), &entry.command)
                .ok_or_else(|| {
                    Error::manifest(path, format!("model {} has an empty command", name))
                })?;
            let mut model_entry = ModelEntry::new(Arc::new(model));
            if let Some(pretrained) = entry.pretrained {
                model_entry = model_entry.with_pretrained(base.join(pretrained));
            }
            debug!("Registered model {}: {:?}", name, model_entry);
            registry.register(name, model_entry);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_manifest_loading() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models.json");
        fs::write(
            &path,
            r#"{
                "models": {
                    "cvae": {
                        "command": ["python", "-m", "models.cvae"],
                        "pretrained": "weights/cvae"
                    },
                    "graph_ga": {"command": ["graph-ga"], "pretrained": "/opt/graph_ga"},
                    "smiles_lstm": {"command": ["smiles-lstm"]}
                }
            }"#,
        )
        .unwrap();

        let registry = ModelRegistry::from_manifest(&path).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["cvae", "graph_ga", "smiles_lstm"]);
        assert_eq!(
            registry.get("cvae").unwrap().pretrained,
            Some(dir.path().join("weights/cvae"))
        );
        assert_eq!(
            registry.get("graph_ga").unwrap().pretrained,
            Some(PathBuf::from("/opt/graph_ga"))
        );
        assert!(registry.get("smiles_lstm").unwrap().pretrained.is_none());
        assert!(!registry.contains("jtnn"));
    }

    #[test]
    fn test_manifest_rejects_empty_command() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models.json");
        fs::write(&path, r#"{"models": {"cvae": {"command": []}}}"#).unwrap();

        let err = ModelRegistry::from_manifest(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Manifest { .. })));
    }

    #[test]
    fn test_manifest_rejects_bad_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(ModelRegistry::from_manifest(&path).is_err());
        assert!(ModelRegistry::from_manifest(&dir.path().join("missing.json")).is_err());
    }
}
