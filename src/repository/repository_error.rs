use mongodb::error::{ErrorKind, WriteFailure};

/// Server code for a unique-index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Not found: {0}")]
    NotFound(String),
    /// A unique index rejected the write.
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Database error: {0}")]
    Database(String),
    /// A stored document does not have the shape this crate expects.
    #[error("Malformed document: {0}")]
    Serialization(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        RepositoryError::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        RepositoryError::AlreadyExists(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        RepositoryError::Database(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        RepositoryError::Serialization(msg.into())
    }
}

pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}

impl From<mongodb::error::Error> for RepositoryError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            RepositoryError::AlreadyExists(err.to_string())
        } else {
            RepositoryError::Database(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_message() {
        assert_eq!(
            RepositoryError::not_found("Invoice 42").to_string(),
            "Not found: Invoice 42"
        );
        assert_eq!(
            RepositoryError::serialization("no _id").to_string(),
            "Malformed document: no _id"
        );
    }
}
