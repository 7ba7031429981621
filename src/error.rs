//! Provider error types.

use thiserror::Error;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors raised by the Hetzner Object Storage provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No credentials were supplied and no client was injected.
    #[error("missing credentials: access_key_id and secret_access_key are required when no client is injected")]
    MissingCredentials,

    /// The params bag resolved no bucket name.
    #[error("missing bucket: params must carry a bucket name under `Bucket` or `bucket`")]
    MissingBucket,

    /// A region code outside the fixed Hetzner set.
    #[error("unsupported region: {0} (expected fsn1, nbg1 or hel1)")]
    UnsupportedRegion(String),

    /// Upload was called on a file whose body was already consumed.
    #[error("file has no buffer or stream body to upload")]
    NoBody,

    /// Failure surfaced by the S3 client during a transfer.
    #[error("transfer error: {0}")]
    Transfer(String),
}

impl ProviderError {
    /// Check if this is a configuration error raised at construction time.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials | Self::MissingBucket | Self::UnsupportedRegion(_)
        )
    }

    /// Check if this error came from the underlying transfer client.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer(_))
    }
}
