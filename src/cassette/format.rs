//! Cassette data structures.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File suffix shared by every cassette file.
pub const CASSETTE_SUFFIX: &str = ".cassette.yaml";

/// A single recorded interaction with an external port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// Port name (`llm`, `scm`, `tracker`, `clock`, `id_gen`).
    pub port: String,
    /// Method name invoked on the port.
    pub method: String,
    /// Input data sent to the port.
    pub input: serde_json::Value,
    /// Output data returned from the port.
    pub output: serde_json::Value,
}

/// A cassette containing a sequence of recorded interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Crate version that wrote the cassette.
    #[serde(default)]
    pub version: String,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Loads a cassette file, or merges every `*.cassette.yaml` file of a
    /// directory (as written by a recording session) into one cassette.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.is_dir() {
            return Self::load_file(path);
        }

        let mut files: Vec<_> = std::fs::read_dir(path)
            .map_err(|e| format!("Failed to read cassette directory {}: {e}", path.display()))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.to_string_lossy().ends_with(CASSETTE_SUFFIX))
            .collect();
        files.sort();

        let mut merged = Self {
            name: path.display().to_string(),
            recorded_at: Utc::now(),
            version: String::new(),
            interactions: Vec::new(),
        };
        for file in files {
            let cassette = Self::load_file(&file)?;
            merged.recorded_at = cassette.recorded_at;
            merged.version = cassette.version;
            merged.interactions.extend(cassette.interactions);
        }
        merged.interactions.sort_by_key(|i| i.seq);
        Ok(merged)
    }

    fn load_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))
    }
}
