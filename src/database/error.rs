use crate::bookings::error::BookingError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseErrorKind {
    NotFound,
    UniqueViolation,
    Connection,
    Decode,
    Query,
}

#[derive(Debug, Clone, Error)]
#[error("Database error ({kind:?}): {message}")]
pub struct DatabaseError {
    pub kind: DatabaseErrorKind,
    pub message: String,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_sqlx(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::RowNotFound => DatabaseErrorKind::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                DatabaseErrorKind::UniqueViolation
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => DatabaseErrorKind::Connection,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => DatabaseErrorKind::Decode,
            _ => DatabaseErrorKind::Query,
        };
        Self::new(kind, err.to_string())
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == DatabaseErrorKind::Connection
    }
}

impl From<DatabaseError> for BookingError {
    fn from(err: DatabaseError) -> Self {
        BookingError::Storage {
            is_retryable: err.is_retryable(),
            message: err.message,
        }
    }
}
