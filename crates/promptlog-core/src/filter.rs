use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Provider, QueryRecord};

/// Inclusive numeric bounds. Either side may be left open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

impl<T: PartialOrd> ValueRange<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: &T) -> bool {
        if let Some(min) = &self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = &self.max {
            if value > max {
                return false;
            }
        }
        true
    }

    fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Inclusive timestamp window. Either side may be left open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        if let Some(start) = &self.start {
            if ts < start {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if ts > end {
                return false;
            }
        }
        true
    }
}

/// Constraints for narrowing a record set.
///
/// Every field is optional. An empty `models`/`providers` list or an empty
/// `search` string places no constraint on that dimension; all present
/// constraints must hold for a record to be kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<Provider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_range: Option<ValueRange<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_range: Option<ValueRange<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers = providers.into_iter().collect();
        self
    }

    pub fn with_date_range(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn with_cost_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.cost_range = Some(ValueRange::new(min, max));
        self
    }

    pub fn with_token_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.token_range = Some(ValueRange::new(min, max));
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// True when no dimension constrains anything.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
            && self.providers.is_empty()
            && self
                .date_range
                .is_none_or(|r| r.start.is_none() && r.end.is_none())
            && self.cost_range.is_none_or(|r| r.is_open())
            && self.token_range.is_none_or(|r| r.is_open())
            && self.search_needle().is_none()
    }

    /// Whether a single record satisfies every present constraint.
    pub fn matches(&self, record: &QueryRecord) -> bool {
        self.matches_with(record, self.search_needle().as_deref())
    }

    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    fn matches_with(&self, record: &QueryRecord, needle: Option<&str>) -> bool {
        if !self.models.is_empty() && !self.models.iter().any(|m| *m == record.model) {
            return false;
        }
        if !self.providers.is_empty() && !self.providers.contains(&record.provider) {
            return false;
        }
        if let Some(range) = &self.date_range {
            if !range.contains(&record.timestamp) {
                return false;
            }
        }
        if let Some(range) = &self.cost_range {
            if !range.contains(&record.cost) {
                return false;
            }
        }
        if let Some(range) = &self.token_range {
            if !range.contains(&record.total_tokens()) {
                return false;
            }
        }
        if let Some(needle) = needle {
            if !record.input.to_lowercase().contains(needle)
                && !record.output.to_lowercase().contains(needle)
            {
                return false;
            }
        }
        true
    }
}

/// Keep the records matching `criteria`, preserving input order.
pub fn apply_filters(records: &[QueryRecord], criteria: &FilterCriteria) -> Vec<QueryRecord> {
    let needle = criteria.search_needle();
    let kept: Vec<QueryRecord> = records
        .iter()
        .filter(|r| criteria.matches_with(r, needle.as_deref()))
        .cloned()
        .collect();
    tracing::debug!("Filtered records: kept {} of {}", kept.len(), records.len());
    kept
}

/// Distinct model names in `records`, sorted (for populating filter choices).
pub fn distinct_models(records: &[QueryRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.model.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Distinct providers in `records`, sorted.
pub fn distinct_providers(records: &[QueryRecord]) -> Vec<Provider> {
    records
        .iter()
        .map(|r| r.provider)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_record;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn dataset() -> Vec<QueryRecord> {
        let mut a = sample_record("a", "gpt-4");
        a.input = "Hello world".into();
        a.output = "Greetings".into();
        a.cost = 0.03;
        a.timestamp = ts("2024-03-01T10:00:00Z");

        let mut b = sample_record("b", "gpt-4");
        b.input = "Summarize this".into();
        b.output = "A short SUMMARY".into();
        b.input_tokens = 200;
        b.output_tokens = 80;
        b.cost = 0.05;
        b.timestamp = ts("2024-03-02T10:00:00Z");

        let mut c = sample_record("c", "gemini-pro");
        c.provider = Provider::Gemini;
        c.input = "Translate".into();
        c.output = "Traduire".into();
        c.input_tokens = 10;
        c.output_tokens = 5;
        c.cost = 0.001;
        c.timestamp = ts("2024-03-03T10:00:00Z");

        vec![a, b, c]
    }

    fn ids(records: &[QueryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_empty_criteria_returns_input() {
        let data = dataset();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_empty());
        assert_eq!(apply_filters(&data, &criteria), data);
    }

    #[test]
    fn test_empty_lists_are_no_constraint() {
        let data = dataset();
        let criteria = FilterCriteria::new()
            .with_models(Vec::<String>::new())
            .with_providers(Vec::new())
            .with_search("");
        assert!(criteria.is_empty());
        assert_eq!(apply_filters(&data, &criteria).len(), 3);
    }

    #[test]
    fn test_filter_by_model() {
        let data = dataset();
        let result = apply_filters(&data, &FilterCriteria::new().with_models(["gpt-4"]));
        assert_eq!(ids(&result), vec!["a", "b"]);
    }

    #[test]
    fn test_filter_by_provider() {
        let data = dataset();
        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_providers([Provider::Gemini]),
        );
        assert_eq!(ids(&result), vec!["c"]);
    }

    #[test]
    fn test_min_cost_only() {
        let data = dataset();
        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_cost_range(Some(0.04), None),
        );
        assert_eq!(ids(&result), vec!["b"]);
    }

    #[test]
    fn test_cost_bounds_inclusive() {
        let data = dataset();
        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_cost_range(Some(0.03), Some(0.05)),
        );
        assert_eq!(ids(&result), vec!["a", "b"]);
    }

    #[test]
    fn test_token_range_uses_total() {
        let data = dataset();
        // a = 150, b = 280, c = 15
        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_token_range(Some(150), Some(280)),
        );
        assert_eq!(ids(&result), vec!["a", "b"]);

        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_token_range(None, Some(15)),
        );
        assert_eq!(ids(&result), vec!["c"]);
    }

    #[test]
    fn test_date_range_inclusive_and_open() {
        let data = dataset();
        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_date_range(
                Some(ts("2024-03-02T10:00:00Z")),
                Some(ts("2024-03-03T10:00:00Z")),
            ),
        );
        assert_eq!(ids(&result), vec!["b", "c"]);

        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_date_range(None, Some(ts("2024-03-01T10:00:00Z"))),
        );
        assert_eq!(ids(&result), vec!["a"]);
    }

    #[test]
    fn test_token_range_with_max_counts() {
        let mut huge = sample_record("huge", "gpt-4");
        huge.input_tokens = u64::MAX;
        huge.output_tokens = 1;
        let data = vec![huge, sample_record("small", "gpt-4")];

        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_token_range(Some(0), None),
        );
        assert_eq!(ids(&result), vec!["huge", "small"]);

        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_token_range(Some(u64::MAX), None),
        );
        assert_eq!(ids(&result), vec!["huge"]);
    }

    #[test]
    fn test_search_case_insensitive_input_or_output() {
        let data = dataset();
        let result = apply_filters(&data, &FilterCriteria::new().with_search("hello"));
        assert_eq!(ids(&result), vec!["a"]);

        // Matches output only.
        let result = apply_filters(&data, &FilterCriteria::new().with_search("summary"));
        assert_eq!(ids(&result), vec!["b"]);
    }

    #[test]
    fn test_inverted_range_yields_empty() {
        let data = dataset();
        let result = apply_filters(
            &data,
            &FilterCriteria::new().with_cost_range(Some(1.0), Some(0.0)),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn test_criteria_combine_with_and() {
        let data = dataset();
        let criteria = FilterCriteria::new()
            .with_models(["gpt-4", "gemini-pro"])
            .with_cost_range(None, Some(0.04))
            .with_search("t");
        // a: "Greetings" contains t; c: "Translate"; b excluded by cost.
        let result = apply_filters(&data, &criteria);
        assert_eq!(ids(&result), vec!["a", "c"]);

        for r in &data {
            assert_eq!(criteria.matches(r), result.iter().any(|k| k.id == r.id));
        }
    }

    #[test]
    fn test_filter_is_idempotent() {
        let data = dataset();
        let criteria = FilterCriteria::new()
            .with_providers([Provider::OpenAi])
            .with_token_range(Some(100), None);
        let once = apply_filters(&data, &criteria);
        let twice = apply_filters(&once, &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_criteria_deserialize_partial() {
        let criteria: FilterCriteria = serde_json::from_value(serde_json::json!({
            "providers": ["gemini"],
            "costRange": { "min": 0.001 },
            "dateRange": { "end": "2024-03-03T10:00:00Z" }
        }))
        .unwrap();
        assert_eq!(criteria.providers, vec![Provider::Gemini]);
        assert_eq!(criteria.cost_range, Some(ValueRange::new(Some(0.001), None)));
        assert!(criteria.date_range.unwrap().start.is_none());
        assert!(!criteria.is_empty());

        let result = apply_filters(&dataset(), &criteria);
        assert_eq!(ids(&result), vec!["c"]);
    }

    #[test]
    fn test_distinct_values() {
        let data = dataset();
        assert_eq!(distinct_models(&data), vec!["gemini-pro", "gpt-4"]);
        assert_eq!(
            distinct_providers(&data),
            vec![Provider::OpenAi, Provider::Gemini]
        );
        assert!(distinct_models(&[]).is_empty());
    }
}
