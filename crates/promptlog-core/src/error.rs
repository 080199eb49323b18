use thiserror::Error;

/// Failure to parse one of the closed vocabularies from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown sort key '{0}'")]
    SortKey(String),
    #[error("unknown sort order '{0}' (expected 'asc' or 'desc')")]
    SortOrder(String),
    #[error("unknown provider '{0}' (expected 'openai' or 'gemini')")]
    Provider(String),
}
