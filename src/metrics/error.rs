/// Errors raised by [`MetricStore`](super::MetricStore) operations.
///
/// All of them indicate a programming error on the caller's side: the set of metrics is
/// fixed at construction and never depends on sampled data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("metric `{family}.{metric}` is not declared")]
    Undeclared { family: String, metric: String },

    #[error("metric `{family}.{metric}` is already declared with different parameters")]
    ConflictingDeclaration { family: String, metric: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
