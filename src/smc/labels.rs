//! Sensor Label Table
//!
//! Human-readable names for SMC keys, loaded once at startup from a JSON
//! document of the form `{"labels": {"TC0P": ["CPU Proximity"], ...}}`.
//! Keys absent from the table resolve to [`UNKNOWN_LABEL`]; the classifier
//! drops those readings.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Label returned for keys the table does not know.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Static lookup table from SMC key to human-readable label.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorLabels {
    labels: HashMap<String, Vec<String>>,
}

impl SensorLabels {
    /// Build a table from an already-parsed map. Mostly useful in tests.
    pub fn new(labels: HashMap<String, Vec<String>>) -> Self {
        Self { labels }
    }

    /// Load the table from a JSON file. A missing or malformed file is a
    /// startup-fatal configuration error, never a per-scrape concern.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::Configuration(format!(
                "cannot open sensor labels file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            Error::Configuration(format!(
                "malformed sensor labels file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Resolve a key to its first label, or [`UNKNOWN_LABEL`] if absent.
    pub fn resolve(&self, key: &str) -> &str {
        self.labels
            .get(key)
            .and_then(|labels| labels.first())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn table_from_json(json: &str) -> Result<SensorLabels> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        SensorLabels::load(file.path())
    }

    #[test]
    fn test_load_and_resolve() {
        let labels = table_from_json(
            r#"{"labels": {"TC0P": ["CPU Proximity", "alt"], "PPBR": ["Battery Rail"]}}"#,
        )
        .unwrap();

        assert_eq!(labels.len(), 2);
        assert_eq!(labels.resolve("TC0P"), "CPU Proximity");
        assert_eq!(labels.resolve("PPBR"), "Battery Rail");
    }

    #[test]
    fn test_resolve_unknown_key() {
        let labels = table_from_json(r#"{"labels": {"TC0P": ["CPU Proximity"]}}"#).unwrap();
        assert_eq!(labels.resolve("XXXX"), UNKNOWN_LABEL);
    }

    #[test]
    fn test_resolve_empty_label_list() {
        let labels = table_from_json(r#"{"labels": {"TC0P": []}}"#).unwrap();
        assert_eq!(labels.resolve("TC0P"), UNKNOWN_LABEL);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SensorLabels::load(Path::new("/nonexistent/sensors.json")).unwrap_err();
        assert_matches!(err, Error::Configuration(_));
        assert!(err.is_fatal_at_startup());
    }

    #[test]
    fn test_load_malformed_file() {
        let err = table_from_json(r#"{"labels": "not a map"}"#).unwrap_err();
        assert_matches!(err, Error::Configuration(_));
    }
}
