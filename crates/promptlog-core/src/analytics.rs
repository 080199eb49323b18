use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::QueryRecord;

/// Per-model averages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    pub avg_cost: f64,
    /// Mean of input + output tokens.
    pub avg_tokens: f64,
    pub avg_response_time: f64,
}

/// Aggregate statistics over a record set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_cost: f64,
    pub avg_cost: f64,
    pub avg_response_time: f64,
    /// Mean of output / max(input, 1) tokens per record.
    pub token_efficiency: f64,
    /// Keyed by model name; only models present in the input appear.
    pub model_stats: BTreeMap<String, ModelStats>,
}

#[derive(Default)]
struct ModelTotals {
    count: u64,
    cost: f64,
    tokens: f64,
    response_time: f64,
}

impl ModelTotals {
    fn averages(&self) -> ModelStats {
        let n = self.count as f64;
        ModelStats {
            avg_cost: self.cost / n,
            avg_tokens: self.tokens / n,
            avg_response_time: self.response_time / n,
        }
    }
}

/// Reduce `records` to an [`AnalyticsSummary`]. An empty slice yields zeros.
pub fn compute_analytics(records: &[QueryRecord]) -> AnalyticsSummary {
    if records.is_empty() {
        return AnalyticsSummary::default();
    }

    let mut total_cost = 0.0;
    let mut total_response_time = 0.0;
    let mut total_ratio = 0.0;
    let mut per_model: BTreeMap<&str, ModelTotals> = BTreeMap::new();

    for rec in records {
        total_cost += rec.cost;
        total_response_time += rec.response_time;
        total_ratio += rec.token_ratio();

        let entry = per_model.entry(rec.model.as_str()).or_default();
        entry.count += 1;
        entry.cost += rec.cost;
        entry.tokens += rec.input_tokens as f64 + rec.output_tokens as f64;
        entry.response_time += rec.response_time;
    }

    let n = records.len() as f64;
    let model_stats: BTreeMap<String, ModelStats> = per_model
        .into_iter()
        .map(|(model, totals)| (model.to_string(), totals.averages()))
        .collect();

    tracing::debug!(
        "Computed analytics over {} records across {} models",
        records.len(),
        model_stats.len()
    );

    AnalyticsSummary {
        total_cost,
        avg_cost: total_cost / n,
        avg_response_time: total_response_time / n,
        token_efficiency: total_ratio / n,
        model_stats,
    }
}
