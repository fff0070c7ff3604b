use crate::error::Error;
use crate::generator::{ComputeBudget, GeneratorFactory, GeneratorRequest, MoleculeGenerator};
use crate::molecule::{self, BadRows, ScoredMolecule};
use anyhow::{Result, bail};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

/// A model implemented by an external program.
///
/// The program is invoked as
/// `<command...> --weights W --dataset D.csv --mode M --n-molecules N --n-cpu K --output O.csv`
/// and must write a `SMILES,DOCKING_SCORE` table to `O.csv`.
#[derive(Debug, Clone)]
pub struct ExternalModel {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalModel {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
        }
    }

    /// Builds from a manifest command line: program followed by its fixed arguments.
    pub fn from_command(name: impl Into<String>, command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(name, program, args.to_vec()))
    }
}

/// Where the generator reads the dataset from.
enum DatasetFile {
    Existing(PathBuf),
    // Kept alive for the generator's lifetime; removed on drop.
    Temporary(NamedTempFile),
}

impl DatasetFile {
    fn path(&self) -> &Path {
        match self {
            DatasetFile::Existing(p) => p,
            DatasetFile::Temporary(f) => f.path(),
        }
    }
}

impl GeneratorFactory for ExternalModel {
    fn build(&self, request: GeneratorRequest<'_>) -> Result<Box<dyn MoleculeGenerator>> {
        let dataset = match &request.dataset.source {
            Some(path) => DatasetFile::Existing(path.clone()),
            None => {
                let file = tempfile::Builder::new().suffix(".csv").tempfile()?;
                molecule::write_molecules(file.path(), &request.dataset.molecules)?;
                debug!(
                    "Wrote in-memory dataset {}/{} to {:?}",
                    request.dataset.protein,
                    request.dataset.name,
                    file.path()
                );
                DatasetFile::Temporary(file)
            }
        };

        Ok(Box::new(ExternalGenerator {
            model: self.clone(),
            weights: request.weights.to_path_buf(),
            dataset,
            mode: request.mode.to_string(),
            compute: request.compute,
        }))
    }
}

struct ExternalGenerator {
    model: ExternalModel,
    weights: PathBuf,
    dataset: DatasetFile,
    mode: String,
    compute: ComputeBudget,
}

impl MoleculeGenerator for ExternalGenerator {
    fn generate_optimized_molecules(&mut self, n: usize) -> Result<Vec<ScoredMolecule>> {
        let output_csv_path =
            std::env::temp_dir().join(format!("generated_{}.csv", uuid::Uuid::new_v4()));

        debug!("Running {} via {:?}", self.model.name, self.model.program);
        info!("Generating {} molecules with {} ({})", n, self.model.name, self.mode);

        let output = Command::new(&self.model.program)
            .args(&self.model.args)
            .arg("--weights")
            .arg(&self.weights)
            .arg("--dataset")
            .arg(self.dataset.path())
            .arg("--mode")
            .arg(&self.mode)
            .arg("--n-molecules")
            .arg(n.to_string())
            .arg("--n-cpu")
            .arg(self.compute.n_cpu().to_string())
            .arg("--output")
            .arg(&output_csv_path)
            .envs(self.compute.thread_env())
            .output();

        let result = match output {
            Ok(o) if o.status.success() => {
                let stdout = String::from_utf8_lossy(&o.stdout);
                if !stdout.trim().is_empty() {
                    debug!("{} output: {}", self.model.name, stdout.trim());
                }
                if !output_csv_path.exists() {
                    bail!(Error::generator(
                        &self.model.name,
                        "finished successfully but no output file found"
                    ));
                }
                molecule::read_molecules(&output_csv_path, BadRows::Fail)
                    .map_err(|e| {
                        anyhow::Error::from(Error::generator(&self.model.name, format!("{:#}", e)))
                    })
            }
            Ok(o) => {
                let stderr = String::from_utf8_lossy(&o.stderr);
                warn!("{} failed: {}", self.model.name, stderr);
                let details = format!("{}: {}", o.status, stderr.trim());
                Err(Error::generator(&self.model.name, details).into())
            }
            Err(e) => {
                warn!("Failed to execute {:?}: {}", self.model.program, e);
                let details = format!("failed to execute {:?}: {}", self.model.program, e);
                Err(Error::generator(&self.model.name, details).into())
            }
        };

        // Cleanup
        let _ = std::fs::remove_file(&output_csv_path);

        result
    }
}
