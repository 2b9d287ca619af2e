/// Infrastructure errors shared by the EcoOyster service crates.
///
/// Server crates define their own error enum and wrap this via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("redis unavailable, degrading gracefully")]
    RedisUnavailable,
}
