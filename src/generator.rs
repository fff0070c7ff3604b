use crate::molecule::ScoredMolecule;
use crate::proteins::Dataset;
use anyhow::Result;
use std::num::NonZeroUsize;
use std::path::Path;

/// Environment variables numeric backends read to size their thread pools.
const THREAD_ENV_VARS: [&str; 4] = [
    "OMP_NUM_THREADS",
    "MKL_NUM_THREADS",
    "TF_NUM_INTRAOP_THREADS",
    "TF_NUM_INTEROP_THREADS",
];

/// Number of CPU cores a run may use. Passed to whatever does the heavy lifting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeBudget {
    n_cpu: NonZeroUsize,
}

impl ComputeBudget {
    pub fn new(n_cpu: NonZeroUsize) -> Self {
        Self { n_cpu }
    }

    pub fn n_cpu(&self) -> usize {
        self.n_cpu.get()
    }

    pub fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.n_cpu())
            .build()?)
    }

    pub fn thread_env(&self) -> Vec<(&'static str, String)> {
        let n = self.n_cpu().to_string();
        THREAD_ENV_VARS.iter().map(|var| (*var, n.clone())).collect()
    }
}

/// Everything a model implementation needs to set up a generator.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorRequest<'a> {
    pub weights: &'a Path,
    pub dataset: &'a Dataset,
    /// Opaque objective, e.g. "minimize". Interpreted by the model only.
    pub mode: &'a str,
    pub compute: ComputeBudget,
}

pub trait MoleculeGenerator {
    /// Produces up to `n` molecules optimized for the configured objective.
    fn generate_optimized_molecules(&mut self, n: usize) -> Result<Vec<ScoredMolecule>>;
}

/// A model implementation, i.e. something that can build generators.
pub trait GeneratorFactory: Send + Sync {
    fn build(&self, request: GeneratorRequest<'_>) -> Result<Box<dyn MoleculeGenerator>>;
}
