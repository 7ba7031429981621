//! Object-client capability trait and transfer request types.
//!
//! The provider talks to storage through [`ObjectClient`], a deliberately
//! narrow seam: one multipart-capable put and one delete. The aws-sdk-s3
//! implementation lives in [`crate::s3`]; tests substitute a recording
//! double.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::{FileSource, Result};

/// A put request handed to the object client.
///
/// The body is moved into the request; the client is expected to chunk
/// streamed bodies internally (multipart upload) and to treat the transfer as
/// one logical operation either way.
#[derive(Debug)]
pub struct PutRequest {
    /// Target bucket.
    pub bucket: String,
    /// Full object key.
    pub key: String,
    /// Upload body.
    pub body: FileSource,
    /// Content type of the object.
    pub content_type: Option<String>,
    /// Canned ACL applied to the object.
    pub acl: Option<String>,
    /// Cache-Control header stored with the object.
    pub cache_control: Option<String>,
    /// Content-Disposition header stored with the object.
    pub content_disposition: Option<String>,
    /// User metadata stored with the object.
    pub metadata: HashMap<String, String>,
}

/// A delete request handed to the object client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    /// Target bucket.
    pub bucket: String,
    /// Full object key.
    pub key: String,
}

/// Per-call overrides for a transfer.
///
/// Applied after everything the provider computes, so a set field here wins
/// over the configured ACL, the file's MIME type and even the computed
/// bucket/key. Delete requests honor only the bucket and key overrides.
#[derive(Debug, Clone, Default)]
pub struct TransferParams {
    /// Override the target bucket.
    pub bucket: Option<String>,
    /// Override the object key.
    pub key: Option<String>,
    /// Override the canned ACL.
    pub acl: Option<String>,
    /// Override the content type.
    pub content_type: Option<String>,
    /// Set the stored Cache-Control header.
    pub cache_control: Option<String>,
    /// Set the stored Content-Disposition header.
    pub content_disposition: Option<String>,
    /// User metadata stored with the object.
    pub metadata: HashMap<String, String>,
}

impl TransferParams {
    /// Create empty transfer params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the canned ACL for this call.
    pub fn acl(mut self, acl: impl Into<String>) -> Self {
        self.acl = Some(acl.into());
        self
    }

    /// Override the content type for this call.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the stored Cache-Control header.
    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Set the stored Content-Disposition header.
    pub fn content_disposition(mut self, value: impl Into<String>) -> Self {
        self.content_disposition = Some(value.into());
        self
    }

    /// Add one user-metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The storage operations the provider needs from an S3-compatible client.
///
/// Implemented by [`crate::S3ObjectClient`] for real transfers and by test
/// doubles in unit tests. Implementations own retries, signing and the wire
/// protocol; the provider issues each request exactly once.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Store a body under a key, chunking streamed bodies as needed.
    async fn put_object_multipart(&self, request: PutRequest) -> Result<()>;

    /// Delete the object under a key.
    async fn delete_object(&self, request: DeleteRequest) -> Result<()>;
}
