use std::str::FromStr;
use serde::Deserialize;

/// How the runtime treats the store write that follows each applied edit.
///
/// - `Strict`: await the write before taking the next edit for that group.
/// - `Optimistic`: hand the write to a per-group writer and move on. Writes
///   still land in edit order, but a slow store no longer holds up edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    Strict,
    Optimistic,
}

impl Default for PersistMode {
    fn default() -> Self {
        PersistMode::Strict
    }
}

impl FromStr for PersistMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(PersistMode::Strict),
            "optimistic" => Ok(PersistMode::Optimistic),
            other => Err(format!(
                "invalid persist_mode: {other} (expected \"strict\" or \"optimistic\")"
            )),
        }
    }
}

/// Where group schedules are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// One JSON document per group under `[store].dir`.
    File,
    /// In memory only (lost on exit).
    Memory,
}

impl Default for StoreMode {
    fn default() -> Self {
        StoreMode::File
    }
}
