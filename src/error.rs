//! Failure modes of resolving and running a generation job.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No model named {0}")]
    UnknownModel(String),

    /// The model has no pretrained weights registered and no path was given.
    #[error("No pretrained {0} model delivered. Provide the path to pretrained model.")]
    MissingPretrained(String),

    #[error("No protein named {0}")]
    UnknownProtein(String),

    #[error("Protein {protein} has no dataset named {dataset}")]
    UnknownDataset { protein: String, dataset: String },

    #[error("Dataset {dataset} of protein {protein} could not be loaded: {details}")]
    UnreadableDataset {
        protein: String,
        dataset: String,
        details: String,
    },

    #[error("Invalid model manifest {path:?}: {details}")]
    Manifest { path: PathBuf, details: String },

    #[error("Generator {model} failed: {details}")]
    Generator { model: String, details: String },
}

impl Error {
    pub fn manifest(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            details: details.into(),
        }
    }

    pub fn generator(model: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Generator {
            model: model.into(),
            details: details.into(),
        }
    }
}
