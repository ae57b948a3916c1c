use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis unreachable or the pool could not hand out a connection
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache serialization error: {0}")]
    SerializationError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
            CacheError::ConnectionError(err.to_string())
        } else {
            CacheError::OperationError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::SerializationError(err.to_string())
    }
}

impl From<bb8::RunError<redis::RedisError>> for CacheError {
    fn from(err: bb8::RunError<redis::RedisError>) -> Self {
        CacheError::ConnectionError(format!("pool: {}", err))
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
