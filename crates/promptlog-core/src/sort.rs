use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use feruca::{Collator, Locale, Tailoring};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::record::QueryRecord;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn reverse(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

impl FromStr for SortOrder {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(ParseError::SortOrder(s.to_string())),
        }
    }
}

/// Every field of [`QueryRecord`] a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Id,
    Model,
    Provider,
    Input,
    Output,
    InputTokens,
    OutputTokens,
    Cost,
    Timestamp,
    ResponseTime,
    ModelVersion,
}

impl SortKey {
    pub const ALL: [SortKey; 11] = [
        SortKey::Id,
        SortKey::Model,
        SortKey::Provider,
        SortKey::Input,
        SortKey::Output,
        SortKey::InputTokens,
        SortKey::OutputTokens,
        SortKey::Cost,
        SortKey::Timestamp,
        SortKey::ResponseTime,
        SortKey::ModelVersion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Id => "id",
            SortKey::Model => "model",
            SortKey::Provider => "provider",
            SortKey::Input => "input",
            SortKey::Output => "output",
            SortKey::InputTokens => "inputTokens",
            SortKey::OutputTokens => "outputTokens",
            SortKey::Cost => "cost",
            SortKey::Timestamp => "timestamp",
            SortKey::ResponseTime => "responseTime",
            SortKey::ModelVersion => "modelVersion",
        }
    }

    /// The record's value for this field, or `None` when the field is unset.
    pub fn value<'a>(&self, record: &'a QueryRecord) -> Option<SortValue<'a>> {
        match self {
            SortKey::Id => Some(SortValue::Text(&record.id)),
            SortKey::Model => Some(SortValue::Text(&record.model)),
            // Not a string field; ordered by its textual form.
            SortKey::Provider => Some(SortValue::Unknown(Cow::Borrowed(
                record.provider.as_str(),
            ))),
            SortKey::Input => Some(SortValue::Text(&record.input)),
            SortKey::Output => Some(SortValue::Text(&record.output)),
            SortKey::InputTokens => Some(SortValue::Number(record.input_tokens as f64)),
            SortKey::OutputTokens => Some(SortValue::Number(record.output_tokens as f64)),
            SortKey::Cost => Some(SortValue::Number(record.cost)),
            SortKey::Timestamp => Some(SortValue::Instant(record.timestamp)),
            SortKey::ResponseTime => Some(SortValue::Number(record.response_time)),
            SortKey::ModelVersion => record.model_version.as_deref().map(SortValue::Text),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseError;

    /// Accepts the camelCase field name or its snake_case spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| ParseError::SortKey(s.to_string()))
    }
}

/// A field value lifted into one of the comparable shapes.
///
/// `Unknown` carries the textual form of anything that is not a number,
/// string or instant, and is compared as text.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
    Instant(DateTime<Utc>),
    Unknown(Cow<'a, str>),
}

impl fmt::Display for SortValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortValue::Number(n) => write!(f, "{n}"),
            SortValue::Text(s) => f.write_str(s),
            SortValue::Instant(ts) => f.write_str(&ts.to_rfc3339()),
            SortValue::Unknown(s) => f.write_str(s),
        }
    }
}

/// Collator for the root locale. Punctuation and whitespace are
/// non-ignorable, so "item 2" sorts before "item10".
fn root_collator() -> Collator {
    Collator::new(Tailoring::Cldr(Locale::Root), false, true)
}

/// Compare two present values in ascending order.
pub fn compare_values(a: &SortValue<'_>, b: &SortValue<'_>) -> Ordering {
    compare_values_with(&mut root_collator(), a, b)
}

fn compare_values_with(
    collator: &mut Collator,
    a: &SortValue<'_>,
    b: &SortValue<'_>,
) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    match (a, b) {
        (SortValue::Number(x), SortValue::Number(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (SortValue::Text(x), SortValue::Text(y)) => collator.collate(*x, *y),
        (SortValue::Instant(x), SortValue::Instant(y)) => x.cmp(y),
        _ => collator.collate(a.to_string().as_str(), b.to_string().as_str()),
    }
}

/// Locale-aware string ordering (Unicode Collation Algorithm, CLDR root).
///
/// Accents and case only break ties between otherwise equal letters, so
/// "résumé" < "rose" and "apple" < "Banana".
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    root_collator().collate(a, b)
}

/// Order two records by `key`.
///
/// Quirk: a record whose field is unset sorts first in ascending order and
/// last in descending order. Only the comparison of present values is
/// reversed for descending; the unset anchor moves with the direction
/// instead of being negated alongside it. Two unset values compare equal.
pub fn compare_records(
    a: &QueryRecord,
    b: &QueryRecord,
    key: SortKey,
    order: SortOrder,
) -> Ordering {
    compare_records_with(&mut root_collator(), a, b, key, order)
}

fn compare_records_with(
    collator: &mut Collator,
    a: &QueryRecord,
    b: &QueryRecord,
    key: SortKey,
    order: SortOrder,
) -> Ordering {
    match (key.value(a), key.value(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => match order {
            SortOrder::Asc => Ordering::Less,
            SortOrder::Desc => Ordering::Greater,
        },
        (Some(_), None) => match order {
            SortOrder::Asc => Ordering::Greater,
            SortOrder::Desc => Ordering::Less,
        },
        (Some(x), Some(y)) => {
            let ordering = compare_values_with(collator, &x, &y);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }
    }
}

/// Return a copy of `records` stably ordered by `key`.
pub fn apply_sorting(
    records: &[QueryRecord],
    key: SortKey,
    order: SortOrder,
) -> Vec<QueryRecord> {
    let mut collator = root_collator();
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| compare_records_with(&mut collator, a, b, key, order));
    tracing::debug!("Sorted {} records by {key} {order}", sorted.len());
    sorted
}
