use anyhow::Result;
use clap::Parser;
use docking_benchmark_rs::config::{self, Args};
use docking_benchmark_rs::models::ModelRegistry;
use docking_benchmark_rs::proteins::ProteinRegistry;
use docking_benchmark_rs::{driver, logging};
use log::debug;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.debug);

    let models = ModelRegistry::from_manifest(&args.models)?;
    debug!("Available models: {}", models.names().collect::<Vec<_>>().join(", "));

    let config = config::resolve(args, &models)?;
    let proteins = ProteinRegistry::load(&config.data_dir, &config.compute)?;

    driver::run(&config, &models, &proteins)?;

    Ok(())
}
