//! File records handed to the provider by the host application.

use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::fmt;
use std::path::Path;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use crate::path::normalize_ext;

/// Chunk stream used for streamed upload bodies.
pub type FileStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Body of a file: either fully buffered or a chunk stream.
pub enum FileSource {
    /// In-memory body.
    Buffer(Bytes),
    /// Streamed body, consumed once by the upload.
    Stream(FileStream),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(data) => f.debug_tuple("Buffer").field(&data.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// A file to upload or delete.
///
/// `hash` is the full base filename (everything except the extension); the
/// host application typically derives it from the file content. After a
/// successful upload the provider sets `url` to the object's public URL.
#[derive(Debug, Default)]
pub struct UploadFile {
    /// Base filename, without extension.
    pub hash: String,
    /// File extension, with or without a leading dot.
    pub ext: String,
    /// MIME type sent as the object's content type.
    pub mime: Option<String>,
    /// Optional path segment between the configured prefix and the filename.
    pub path: Option<String>,
    /// Upload body. `None` once a streamed body has been consumed.
    pub source: Option<FileSource>,
    /// Public URL, set by a successful upload.
    pub url: Option<String>,
}

impl UploadFile {
    /// Create a file record with a buffered body.
    pub fn from_buffer(
        hash: impl Into<String>,
        ext: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            hash: hash.into(),
            ext: ext.into(),
            source: Some(FileSource::Buffer(data.into())),
            ..Default::default()
        }
    }

    /// Create a file record with a streamed body.
    pub fn from_stream<S>(hash: impl Into<String>, ext: impl Into<String>, stream: S) -> Self
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    {
        Self {
            hash: hash.into(),
            ext: ext.into(),
            source: Some(FileSource::Stream(stream.boxed())),
            ..Default::default()
        }
    }

    /// Create a file record streaming from an async reader.
    pub fn from_reader<R>(hash: impl Into<String>, ext: impl Into<String>, reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self::from_stream(hash, ext, ReaderStream::new(Box::pin(reader)))
    }

    /// Create a file record from raw bytes and a file name, deriving the
    /// extension, a guessed MIME type and a SHA-256 content hash.
    pub fn from_bytes(data: impl Into<Bytes>, name: impl AsRef<str>) -> Self {
        let data = data.into();
        let name = name.as_ref();
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime = mime_guess::from_path(name).first().map(|m| m.to_string());

        Self {
            hash: content_hash(&data),
            ext,
            mime,
            source: Some(FileSource::Buffer(data)),
            ..Default::default()
        }
    }

    /// Set the MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Set the path segment placed between the prefix and the filename.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// The object filename: `hash` plus the dot-normalized extension.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.hash, normalize_ext(&self.ext))
    }
}

/// SHA-256 hash of file content, hex encoded.
pub fn content_hash(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_normalizes_the_extension() {
        let file = UploadFile::from_buffer("12345", ".txt", "data");
        assert_eq!(file.file_name(), "12345.txt");

        let file = UploadFile::from_buffer("12345", "txt", "data");
        assert_eq!(file.file_name(), "12345.txt");
    }

    #[test]
    fn from_bytes_derives_ext_mime_and_hash() {
        let file = UploadFile::from_bytes(&b"hello"[..], "photo.jpg");
        assert_eq!(file.ext, "jpg");
        assert_eq!(file.mime.as_deref(), Some("image/jpeg"));
        assert_eq!(file.hash, content_hash(b"hello"));
        assert!(matches!(file.source, Some(FileSource::Buffer(_))));
    }

    #[test]
    fn content_hash_is_stable() {
        assert_eq!(
            content_hash(b"Hello, World!"),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }
}
