use std::fmt::Display;

use redb::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage read failed: {0}")]
    Read(String),

    #[error("storage write failed: {0}")]
    Write(String),
}

impl StoreError {
    pub(crate) fn unavailable(err: impl Display) -> Self {
        StoreError::Unavailable(err.to_string())
    }

    pub(crate) fn read(err: impl Display) -> Self {
        StoreError::Read(err.to_string())
    }

    pub(crate) fn write(err: impl Display) -> Self {
        StoreError::Write(err.to_string())
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
