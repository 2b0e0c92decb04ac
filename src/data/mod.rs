//! Configuration data
//!
//! The spawner is configured from external RON (or JSON) files so label
//! tables and weights can change without a rebuild.

pub mod config;
pub mod loader;

pub use config::{SpawnerConfig, WeightsConfig};
pub use loader::{ConfigFormat, load_config, parse_config, export_default_config};
