use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

pub const SMILES_COLUMN: &str = "SMILES";
pub const SCORE_COLUMN: &str = "DOCKING_SCORE";

/// A molecule in SMILES notation paired with its docking score.
///
/// The score is empty when docking failed for the molecule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMolecule {
    #[serde(rename = "SMILES")]
    pub smiles: String,
    #[serde(rename = "DOCKING_SCORE")]
    pub docking_score: Option<f64>,
}

impl ScoredMolecule {
    pub fn new(smiles: impl Into<String>, docking_score: f64) -> Self {
        Self {
            smiles: smiles.into(),
            docking_score: Some(docking_score),
        }
    }

    pub fn unscored(smiles: impl Into<String>) -> Self {
        Self {
            smiles: smiles.into(),
            docking_score: None,
        }
    }
}

/// What to do with a row that doesn't parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadRows {
    Skip,
    Fail,
}

/// Writes molecules as `SMILES,DOCKING_SCORE` rows, replacing any existing file.
///
/// The header is written explicitly so an empty result still yields a valid table.
pub fn write_molecules(path: &Path, molecules: &[ScoredMolecule]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {:?}", path))?;

    writer.write_record([SMILES_COLUMN, SCORE_COLUMN])?;
    for molecule in molecules {
        writer.serialize(molecule)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_molecules(path: &Path, bad_rows: BadRows) -> Result<Vec<ScoredMolecule>> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    read_molecules_from(file, bad_rows)
        .with_context(|| format!("Failed to read molecules from {:?}", path))
}

/// Parses a `SMILES,DOCKING_SCORE` table. Empty scores are kept as unscored molecules.
pub fn read_molecules_from<R: Read>(reader: R, bad_rows: BadRows) -> Result<Vec<ScoredMolecule>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == SMILES_COLUMN) || !headers.iter().any(|h| h == SCORE_COLUMN) {
        bail!(
            "Expected columns {} and {}, found {:?}",
            SMILES_COLUMN,
            SCORE_COLUMN,
            headers.iter().collect::<Vec<_>>()
        );
    }

    let mut molecules = Vec::new();
    for (i, result) in reader.deserialize::<ScoredMolecule>().enumerate() {
        match (result, bad_rows) {
            (Ok(m), _) => molecules.push(m),
            (Err(e), BadRows::Skip) => debug!("Skipping row {}: {}", i + 1, e),
            (Err(e), BadRows::Fail) => bail!("Invalid row {}: {}", i + 1, e),
        }
    }
    Ok(molecules)
}
