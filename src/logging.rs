use log::LevelFilter;

/// Sets up the process logger. `RUST_LOG` takes precedence over the flag.
pub fn init(debug: bool) {
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
