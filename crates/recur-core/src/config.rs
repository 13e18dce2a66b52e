//! Engine configuration.

use crate::ranges::RangeTable;
use serde::{Deserialize, Serialize};

/// Tunables for the transformation engine.
///
/// Deserialises from partial JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Default bounds offered to the UI for each property.
    pub ranges: RangeTable,

    /// Selections larger than this get an extra "this may be slow" notice.
    /// Default: **5**.
    pub warn_selection_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ranges: RangeTable::default(),
            warn_selection_len: 5,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration object, e.g. `{"warnSelectionLen": 10}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"warnSelectionLen": 12}"#).unwrap();
        assert_eq!(config.warn_selection_len, 12);
        assert_eq!(config.ranges, RangeTable::default());

        let empty = EngineConfig::from_json("{}").unwrap();
        assert_eq!(empty, EngineConfig::default());
    }
}
