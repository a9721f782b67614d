//! Configuration
//!
//! Serde structs with defaults for every field, persisted as TOML.

mod schema;
mod store;

pub use schema::{AppConfig, ScanConfig, StreamConfig, VideoConfig};
pub use store::{ConfigChange, ConfigStore};
