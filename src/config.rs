use crate::error::Error;
use crate::generator::ComputeBudget;
use crate::models::ModelRegistry;
use clap::Parser;
use log::{debug, error};
use std::num::NonZeroUsize;
use std::path::PathBuf;

const DATA_HELP: &str = r#"Models come from a JSON manifest (--models, default data/models.json):
  {"models": {"<name>": {"command": ["<program>", "<args>..."],
                         "pretrained": "<weights>"}}}
Datasets are read from <data-dir>/<protein>/<dataset>.csv (--data-dir, default
data/proteins), each with SMILES and DOCKING_SCORE columns."#;

/// Molecule count used when debug mode is on.
pub const DEBUG_N_MOLECULES: usize = 5;

/// Generate docking-optimized molecules with a pretrained model
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, after_help = DATA_HELP)]
pub struct Args {
    /// Name of the model in the model manifest
    pub model: String,

    /// Path to model weights; defaults to the model's pretrained weights
    #[arg(long = "model_path")]
    pub model_path: Option<PathBuf>,

    /// CSV file to write the generated molecules to
    #[arg(short, long, required = true)]
    pub output: PathBuf,

    /// Protein target id
    #[arg(short, long, default_value = "5ht1b")]
    pub protein: String,

    /// Verbose logging and a reduced molecule count
    #[arg(short, long)]
    pub debug: bool,

    /// Number of molecules to generate
    #[arg(short = 'n', long = "n-molecules", default_value_t = 250)]
    pub n_molecules: usize,

    /// Optimization mode passed to the model
    #[arg(short, long, default_value = "minimize")]
    pub mode: String,

    /// Dataset of the protein to condition the model on
    #[arg(long, default_value = "default")]
    pub dataset: String,

    /// Number of CPU cores the model may use
    #[arg(long = "n-cpu", default_value = "4")]
    pub n_cpu: NonZeroUsize,

    /// JSON manifest describing the available models (see below)
    #[arg(long, default_value = "data/models.json")]
    pub models: PathBuf,

    /// Directory holding <protein>/<dataset>.csv files
    #[arg(long = "data-dir", default_value = "data/proteins")]
    pub data_dir: PathBuf,
}

/// Fully resolved run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub model: String,
    pub model_path: PathBuf,
    pub output: PathBuf,
    pub protein: String,
    pub dataset: String,
    pub mode: String,
    pub n_molecules: usize,
    pub debug: bool,
    pub compute: ComputeBudget,
    pub data_dir: PathBuf,
}

/// Validates the model choice and fills in defaults that depend on it.
pub fn resolve(args: Args, models: &ModelRegistry) -> Result<RunConfig, Error> {
    let Some(entry) = models.get(&args.model) else {
        error!("No model named {}", args.model);
        return Err(Error::UnknownModel(args.model));
    };

    let model_path = match args.model_path {
        Some(path) => path,
        None => entry
            .pretrained
            .clone()
            .ok_or_else(|| Error::MissingPretrained(args.model.clone()))?,
    };

    let n_molecules = if args.debug {
        debug!(
            "{} molecules will be generated due to debug mode on.",
            DEBUG_N_MOLECULES
        );
        DEBUG_N_MOLECULES
    } else {
        args.n_molecules
    };

    Ok(RunConfig {
        model: args.model,
        model_path,
        output: args.output,
        protein: args.protein,
        dataset: args.dataset,
        mode: args.mode,
        n_molecules,
        debug: args.debug,
        compute: ComputeBudget::new(args.n_cpu),
        data_dir: args.data_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{GeneratorFactory, GeneratorRequest, MoleculeGenerator};
    use crate::models::ModelEntry;
    use std::sync::Arc;

    struct NoopModel;

    impl GeneratorFactory for NoopModel {
        fn build(
            &self,
            _request: GeneratorRequest<'_>,
        ) -> anyhow::Result<Box<dyn MoleculeGenerator>> {
            anyhow::bail!("not used")
        }
    }

    fn registry() -> ModelRegistry {
        let mut models = ModelRegistry::new();
        models.register(
            "cvae",
            ModelEntry::new(Arc::new(NoopModel)).with_pretrained("models/cvae"),
        );
        models.register("untrained", ModelEntry::new(Arc::new(NoopModel)));
        models
    }

    fn parse(args: &[&str]) -> Args {
        let argv = std::iter::once("docking-benchmark").chain(args.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["cvae", "--output", "out.csv"]);
        assert_eq!(args.protein, "5ht1b");
        assert_eq!(args.dataset, "default");
        assert_eq!(args.mode, "minimize");
        assert_eq!(args.n_molecules, 250);
        assert_eq!(args.n_cpu.get(), 4);
        assert!(!args.debug);
        assert!(args.model_path.is_none());
    }

    #[test]
    fn test_short_and_long_flags() {
        let args = parse(&[
            "cvae", "-o", "out.csv", "-p", "d2", "-d", "-n", "12", "-m", "maximize",
            "--dataset", "full", "--n-cpu", "8", "--model_path", "w.pt",
        ]);
        assert_eq!(args.output, PathBuf::from("out.csv"));
        assert_eq!(args.protein, "d2");
        assert!(args.debug);
        assert_eq!(args.n_molecules, 12);
        assert_eq!(args.mode, "maximize");
        assert_eq!(args.dataset, "full");
        assert_eq!(args.n_cpu.get(), 8);
        assert_eq!(args.model_path, Some(PathBuf::from("w.pt")));
    }

    #[test]
    fn test_output_is_required() {
        assert!(Args::try_parse_from(["docking-benchmark", "cvae"]).is_err());
    }

    #[test]
    fn test_zero_cpus_rejected() {
        let argv = ["docking-benchmark", "cvae", "-o", "x.csv", "--n-cpu", "0"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_unknown_model() {
        for name in ["jtnn", "CVAE"] {
            let err = resolve(parse(&[name, "-o", "out.csv"]), &registry()).unwrap_err();
            assert!(matches!(err, Error::UnknownModel(ref n) if n == name));
        }
    }

    #[test]
    fn test_pretrained_default_fill() {
        let config = resolve(parse(&["cvae", "-o", "out.csv"]), &registry()).unwrap();
        assert_eq!(config.model_path, PathBuf::from("models/cvae"));

        let args = parse(&["cvae", "-o", "out.csv", "--model_path", "mine.pt"]);
        let config = resolve(args, &registry()).unwrap();
        assert_eq!(config.model_path, PathBuf::from("mine.pt"));
    }

    #[test]
    fn test_missing_pretrained() {
        let err = resolve(parse(&["untrained", "-o", "out.csv"]), &registry()).unwrap_err();
        assert!(matches!(err, Error::MissingPretrained(ref n) if n == "untrained"));
        assert!(err.to_string().contains("Provide the path to pretrained model"));

        let args = parse(&["untrained", "-o", "out.csv", "--model_path", "w"]);
        let config = resolve(args, &registry()).unwrap();
        assert_eq!(config.model_path, PathBuf::from("w"));
    }

    #[test]
    fn test_debug_overrides_count() {
        for n in ["0", "1", "10", "1000"] {
            let args = parse(&["cvae", "-o", "out.csv", "-d", "-n", n]);
            let config = resolve(args, &registry()).unwrap();
            assert_eq!(config.n_molecules, DEBUG_N_MOLECULES);
        }
    }

    #[test]
    fn test_count_kept_without_debug() {
        let config = resolve(parse(&["cvae", "-o", "out.csv", "-n", "10"]), &registry()).unwrap();
        assert_eq!(config.n_molecules, 10);
        assert_eq!(config.compute.n_cpu(), 4);
    }
}
