use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchoolError {
    /// Input rejected before anything was written.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SchoolError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable error code reported over ipc.
    pub fn code(&self) -> &'static str {
        match self {
            SchoolError::Validation(_) => "bad_params",
            SchoolError::Db(_) => "db_query_failed",
            SchoolError::Other(_) => "internal",
        }
    }
}

pub type SchoolResult<T> = Result<T, SchoolError>;

/// Rejects blank text and returns it trimmed.
pub fn require_text(field: &str, value: &str) -> SchoolResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(SchoolError::validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(v.to_string())
}
