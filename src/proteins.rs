use crate::error::Error;
use crate::generator::ComputeBudget;
use crate::molecule::{self, BadRows, ScoredMolecule};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Reference molecules with known docking scores for one protein target.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub protein: String,
    pub name: String,
    /// File the dataset was loaded from, if any.
    pub source: Option<PathBuf>,
    pub molecules: Vec<ScoredMolecule>,
}

impl Dataset {
    pub fn new(
        protein: impl Into<String>,
        name: impl Into<String>,
        molecules: Vec<ScoredMolecule>,
    ) -> Self {
        Self {
            protein: protein.into(),
            name: name.into(),
            source: None,
            molecules,
        }
    }

    pub fn from_csv(protein: impl Into<String>, path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Dataset file {:?} has no usable name", path))?
            .to_string();
        let molecules = molecule::read_molecules(path, BadRows::Skip)?;
        Ok(Self {
            protein: protein.into(),
            name,
            source: Some(path.to_path_buf()),
            molecules,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Protein {
    pub id: String,
    pub datasets: BTreeMap<String, Dataset>,
    /// Dataset files that failed to load, with the reason.
    pub unreadable: BTreeMap<String, String>,
}

impl Protein {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            datasets: BTreeMap::new(),
            unreadable: BTreeMap::new(),
        }
    }

    pub fn with_dataset(mut self, dataset: Dataset) -> Self {
        self.datasets.insert(dataset.name.clone(), dataset);
        self
    }
}

#[derive(Debug, Default)]
pub struct ProteinRegistry {
    proteins: BTreeMap<String, Protein>,
}

impl ProteinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, protein: Protein) {
        self.proteins.insert(protein.id.clone(), protein);
    }

    pub fn get(&self, id: &str) -> Option<&Protein> {
        self.proteins.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.proteins.keys().map(String::as_str)
    }

    /// Two-level lookup: protein id, then dataset name.
    pub fn dataset(&self, protein: &str, name: &str) -> Result<&Dataset, Error> {
        let entry = self
            .get(protein)
            .ok_or_else(|| Error::UnknownProtein(protein.to_string()))?;
        if let Some(dataset) = entry.datasets.get(name) {
            return Ok(dataset);
        }
        match entry.unreadable.get(name) {
            Some(details) => Err(Error::UnreadableDataset {
                protein: protein.to_string(),
                dataset: name.to_string(),
                details: details.clone(),
            }),
            None => Err(Error::UnknownDataset {
                protein: protein.to_string(),
                dataset: name.to_string(),
            }),
        }
    }

    /// Loads `<dir>/<protein>/<dataset>.csv` files.
    ///
    /// A file that fails to parse is recorded on its protein and only surfaces
    /// when that dataset is looked up.
    pub fn load(dir: &Path, compute: &ComputeBudget) -> Result<Self> {
        let mut files = Vec::new();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read protein directory {:?}", dir))?;
        for entry in entries {
            let protein_dir = entry?.path();
            if !protein_dir.is_dir() {
                continue;
            }
            let Some(id) = protein_dir.file_name().and_then(|s| s.to_str()) else {
                debug!("Skipping protein directory with non UTF-8 name: {:?}", protein_dir);
                continue;
            };
            for file in fs::read_dir(&protein_dir)? {
                let path = file?.path();
                if path.extension().is_none_or(|ext| ext != "csv") {
                    continue;
                }
                let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                    debug!("Skipping dataset with non UTF-8 name: {:?}", path);
                    continue;
                };
                files.push((id.to_string(), name.to_string(), path.clone()));
            }
        }

        let pool = compute.thread_pool()?;
        let loaded: Vec<(String, String, Result<Dataset>)> = pool.install(|| {
            files
                .into_par_iter()
                .map(|(id, name, path)| {
                    let dataset = Dataset::from_csv(id.clone(), &path);
                    (id, name, dataset)
                })
                .collect()
        });

        let mut registry = Self::new();
        for (id, name, result) in loaded {
            let protein = registry
                .proteins
                .entry(id.clone())
                .or_insert_with(|| Protein::new(id.clone()));
            match result {
                Ok(dataset) => {
                    debug!(
                        "Loaded dataset {}/{} with {} molecules",
                        id,
                        name,
                        dataset.molecules.len()
                    );
                    protein.datasets.insert(name, dataset);
                }
                Err(e) => {
                    warn!("Skipping dataset {}/{}: {:#}", id, name, e);
                    protein.unreadable.insert(name, format!("{:#}", e));
                }
            }
        }
        info!("Loaded {} proteins from {:?}", registry.proteins.len(), dir);
        Ok(registry)
    }
}
