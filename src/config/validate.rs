// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{GanttError, Result};
use crate::types::StoreMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = GanttError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.store))
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_store(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // persist_mode is strongly typed and checked during deserialization.

    if cfg.config.edit_queue_length == 0 {
        return Err(GanttError::ConfigError(
            "[config].edit_queue_length must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.echo_window == 0 {
        return Err(GanttError::ConfigError(
            "[config].echo_window must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_store(cfg: &RawConfigFile) -> Result<()> {
    if cfg.store.mode == StoreMode::File && cfg.store.dir.as_os_str().is_empty() {
        return Err(GanttError::ConfigError(
            "[store].dir must not be empty when mode = \"file\"".to_string(),
        ));
    }
    Ok(())
}
