use promptlog_core::{SortKey, SortOrder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub records: RecordsConfig,
    pub sort: SortConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordsConfig {
    /// JSON file holding an array of query records. `~` is expanded.
    pub path: String,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            path: "~/.promptlog/records.json".into(),
        }
    }
}

/// Default ordering used by `promptlog list` when no flags are given.
/// Unknown keys or orders are rejected when the file is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortConfig {
    /// Record field in camelCase, e.g. "timestamp", "cost", "responseTime".
    pub key: SortKey,
    pub order: SortOrder,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::Timestamp,
            order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayConfig {
    /// Maximum characters shown for the input preview column.
    pub max_text_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { max_text_width: 40 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg: Config = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(cfg.records.path, "~/.promptlog/records.json");
        assert_eq!(cfg.sort.key, SortKey::Timestamp);
        assert_eq!(cfg.sort.order, SortOrder::Desc);
        assert_eq!(cfg.display.max_text_width, 40);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg: Config = serde_json::from_value(serde_json::json!({
            "sort": { "key": "cost" },
            "display": { "maxTextWidth": 80 }
        }))
        .unwrap();
        assert_eq!(cfg.sort.key, SortKey::Cost);
        assert_eq!(cfg.sort.order, SortOrder::Desc);
        assert_eq!(cfg.display.max_text_width, 80);
        assert_eq!(cfg.records.path, "~/.promptlog/records.json");
    }

    #[test]
    fn sort_key_uses_record_field_names() {
        let cfg: Config = serde_json::from_value(serde_json::json!({
            "sort": { "key": "responseTime", "order": "asc" }
        }))
        .unwrap();
        assert_eq!(cfg.sort.key, SortKey::ResponseTime);
        assert_eq!(cfg.sort.order, SortOrder::Asc);
    }

    #[test]
    fn unknown_sort_settings_rejected() {
        let bad_key = serde_json::json!({ "sort": { "key": "latency" } });
        assert!(serde_json::from_value::<Config>(bad_key).is_err());

        let bad_order = serde_json::json!({ "sort": { "order": "sideways" } });
        assert!(serde_json::from_value::<Config>(bad_order).is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(value["display"]["maxTextWidth"], 40);
        assert_eq!(value["records"]["path"], "~/.promptlog/records.json");
        assert_eq!(value["sort"]["key"], "timestamp");
        assert_eq!(value["sort"]["order"], "desc");
    }
}
