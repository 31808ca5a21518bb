// src/config/mod.rs

//! Configuration loading and validation for ganttline.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: turning a `RawConfigFile` into a checked `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, StoreSection};
pub use validate::validate_raw_config;

use crate::engine::RuntimeOptions;

impl ConfigFile {
    /// Runtime options described by `[config]`.
    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            persist_mode: self.config.persist_mode,
            edit_queue_length: self.config.edit_queue_length,
            echo_window: self.config.echo_window,
        }
    }
}
