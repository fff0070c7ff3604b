pub mod config;
pub mod driver;
pub mod error;
pub mod external;
pub mod generator;
pub mod logging;
pub mod models;
pub mod molecule;
pub mod proteins;

pub use error::Error;
