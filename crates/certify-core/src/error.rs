/// Core validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}
