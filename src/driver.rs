use crate::config::RunConfig;
use crate::error::Error;
use crate::generator::GeneratorRequest;
use crate::models::ModelRegistry;
use crate::molecule::{self, ScoredMolecule};
use crate::proteins::ProteinRegistry;
use anyhow::{Context, Result};
use log::{info, warn};

/// Builds the configured generator and asks it for `n_molecules` molecules.
pub fn generate(
    config: &RunConfig,
    models: &ModelRegistry,
    proteins: &ProteinRegistry,
) -> Result<Vec<ScoredMolecule>> {
    let dataset = proteins.dataset(&config.protein, &config.dataset)?;
    let entry = models
        .get(&config.model)
        .ok_or_else(|| Error::UnknownModel(config.model.clone()))?;

    info!(
        "Loading {} from {:?} for {}/{}",
        config.model, config.model_path, config.protein, config.dataset
    );
    let mut generator = entry
        .implementation
        .build(GeneratorRequest {
            weights: &config.model_path,
            dataset,
            mode: &config.mode,
            compute: config.compute,
        })
        .with_context(|| format!("Failed to load model {}", config.model))?;

    let molecules = generator.generate_optimized_molecules(config.n_molecules)?;
    if molecules.len() < config.n_molecules {
        warn!(
            "Requested {} molecules but {} returned {}",
            config.n_molecules,
            config.model,
            molecules.len()
        );
    }
    Ok(molecules)
}

/// Generates molecules and writes them to the configured output file.
/// Returns the number of rows written.
pub fn run(
    config: &RunConfig,
    models: &ModelRegistry,
    proteins: &ProteinRegistry,
) -> Result<usize> {
    let molecules = generate(config, models, proteins)?;
    molecule::write_molecules(&config.output, &molecules)?;
    info!("Wrote {} molecules to {:?}", molecules.len(), config.output);
    Ok(molecules.len())
}
