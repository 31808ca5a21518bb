// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{PersistMode, StoreMode};

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// edit_queue_length = 64
/// echo_window = 16
/// persist_mode = "strict"
///
/// [store]
/// mode = "file"
/// dir = ".ganttline"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub store: StoreSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub store: StoreSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, store: StoreSection) -> Self {
        Self { config, store }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(ConfigSection::default(), StoreSection::default())
    }
}

/// `[config]` section: edit handling.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Capacity of each group's edit queue. Senders wait when it is full.
    #[serde(default = "default_edit_queue_length")]
    pub edit_queue_length: usize,

    /// Number of recent renders per group whose chart echoes are ignored.
    #[serde(default = "default_echo_window")]
    pub echo_window: usize,

    /// `"strict"` (await each save) or `"optimistic"` (save in the background).
    #[serde(default)]
    pub persist_mode: PersistMode,
}

fn default_edit_queue_length() -> usize {
    64
}

fn default_echo_window() -> usize {
    16
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            edit_queue_length: default_edit_queue_length(),
            echo_window: default_echo_window(),
            persist_mode: PersistMode::default(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub mode: StoreMode,

    /// Directory holding one `<group>.json` per group (file mode only).
    #[serde(default = "default_store_dir")]
    pub dir: PathBuf,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(".ganttline")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            mode: StoreMode::default(),
            dir: default_store_dir(),
        }
    }
}
