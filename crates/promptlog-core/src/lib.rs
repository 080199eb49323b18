//! Filtering, ordering and aggregation over logged model queries.
//!
//! Each stage is a pure function over a slice of [`QueryRecord`]s and can be
//! called on its own: [`apply_filters`], [`apply_sorting`] and
//! [`compute_analytics`].

pub mod analytics;
pub mod error;
pub mod filter;
pub mod record;
pub mod sort;

// Re-export key types
pub use analytics::{compute_analytics, AnalyticsSummary, ModelStats};
pub use error::ParseError;
pub use filter::{
    apply_filters, distinct_models, distinct_providers, DateRange, FilterCriteria, ValueRange,
};
pub use record::{Provider, QueryRecord};
pub use sort::{apply_sorting, SortKey, SortOrder, SortValue};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sample_record;

    fn records() -> Vec<QueryRecord> {
        let mut a = sample_record("a", "gpt-4");
        a.input = "Hello world".into();
        a.cost = 0.03;
        a.response_time = 500.0;
        a.input_tokens = 100;
        a.output_tokens = 50;

        let mut b = sample_record("b", "gpt-4");
        b.input = "Write a haiku".into();
        b.cost = 0.05;
        b.response_time = 700.0;
        b.input_tokens = 200;
        b.output_tokens = 80;

        let mut c = sample_record("c", "gemini-pro");
        c.provider = Provider::Gemini;
        c.input = "hello again".into();
        c.cost = 0.002;
        c.response_time = 250.0;

        vec![a, b, c]
    }

    #[test]
    fn test_filter_sort_aggregate_pipeline() {
        let data = records();
        let criteria = FilterCriteria::new().with_search("HELLO");
        let filtered = apply_filters(&data, &criteria);
        let sorted = apply_sorting(&filtered, SortKey::Cost, SortOrder::Desc);
        let ids: Vec<&str> = sorted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let summary = compute_analytics(&sorted);
        assert!((summary.total_cost - 0.032).abs() < 1e-9);
        assert_eq!(summary.model_stats.len(), 2);
    }

    #[test]
    fn test_aggregate_does_not_depend_on_sorting() {
        let data = records();
        let sorted = apply_sorting(&data, SortKey::ResponseTime, SortOrder::Asc);
        let unsorted = compute_analytics(&data);
        let resorted = compute_analytics(&sorted);
        assert_eq!(
            unsorted.model_stats.keys().collect::<Vec<_>>(),
            resorted.model_stats.keys().collect::<Vec<_>>()
        );
        assert!((unsorted.avg_response_time - resorted.avg_response_time).abs() < 1e-9);
    }
}
