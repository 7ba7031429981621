//! The Hetzner Object Storage provider.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::path::{join_segments, normalize_prefix};
use crate::{
    DeleteRequest, FileSource, HetznerRegion, ObjectClient, ProviderConfig, ProviderError,
    PutRequest, Result, S3ObjectClient, TransferParams, UploadFile,
};

/// Upload provider bound to one bucket in one Hetzner region.
///
/// Constructed once from a [`ProviderConfig`]; all state is immutable after
/// construction, so a single instance can serve concurrent uploads and
/// deletes. Each operation issues exactly one logical request through the
/// underlying [`ObjectClient`] and propagates its failures unchanged.
pub struct HetznerStorage {
    client: Arc<dyn ObjectClient>,
    bucket: String,
    prefix: String,
    acl: Option<String>,
    base_url: Option<String>,
    region: HetznerRegion,
}

impl std::fmt::Debug for HetznerStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HetznerStorage")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("acl", &self.acl)
            .field("base_url", &self.base_url)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl HetznerStorage {
    /// Build a provider from configuration.
    ///
    /// Synchronous and I/O free. Fails with
    /// [`ProviderError::MissingCredentials`] when no client is injected and
    /// either credential field is empty, and with
    /// [`ProviderError::MissingBucket`] when the params bag resolves no
    /// bucket name — the latter check applies even with an injected client.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client: Arc<dyn ObjectClient> = match config.client {
            Some(client) => client,
            None => {
                if config.access_key_id.is_empty() || config.secret_access_key.is_empty() {
                    return Err(ProviderError::MissingCredentials);
                }
                Arc::new(S3ObjectClient::new(
                    config.region,
                    config.access_key_id,
                    config.secret_access_key,
                    &config.client_options,
                ))
            }
        };

        let bucket = config
            .params
            .resolve_bucket()
            .ok_or(ProviderError::MissingBucket)?
            .to_string();
        let acl = config.params.resolve_acl().map(String::from);
        let prefix = config
            .prefix
            .as_deref()
            .map(normalize_prefix)
            .unwrap_or_default();

        info!(bucket = %bucket, region = %config.region, "initialized Hetzner Object Storage provider");

        Ok(Self {
            client,
            bucket,
            prefix,
            acl,
            base_url: config.base_url,
            region: config.region,
        })
    }

    /// The configured bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The normalized key prefix (empty, or slash-terminated).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The configured region.
    pub fn region(&self) -> HetznerRegion {
        self.region
    }

    /// The object key a file is stored under: prefix, path, `hash + ext`.
    pub fn object_key(&self, file: &UploadFile) -> String {
        let path = file.path.as_deref().unwrap_or("");
        join_segments(&[&self.prefix, path, &file.file_name()])
    }

    /// The public URL for an object key.
    ///
    /// With no configured base URL this is the virtual-hosted endpoint URL,
    /// `https://{bucket}.{region-host}/{key}`; otherwise the base URL joined
    /// with the key.
    pub fn public_url(&self, object_key: &str) -> String {
        match &self.base_url {
            None => format!(
                "https://{}.{}/{}",
                self.bucket,
                self.region.endpoint_host(),
                object_key
            ),
            Some(base_url) => join_segments(&[base_url, object_key]),
        }
    }

    /// Upload a file and set its `url` field on success.
    pub async fn upload(&self, file: &mut UploadFile) -> Result<()> {
        self.upload_with(file, TransferParams::default()).await
    }

    /// Upload a file with per-call parameter overrides.
    ///
    /// Overrides are applied last, over the configured ACL and the file's
    /// MIME type. The URL attached on success always uses the configured
    /// bucket and the computed key, regardless of overrides.
    pub async fn upload_with(&self, file: &mut UploadFile, params: TransferParams) -> Result<()> {
        let object_key = self.object_key(file);

        // A buffered body is put back so the record can be uploaded again; a
        // streamed body is single-use.
        let body = match file.source.take() {
            Some(FileSource::Buffer(data)) => {
                file.source = Some(FileSource::Buffer(data.clone()));
                FileSource::Buffer(data)
            }
            Some(FileSource::Stream(stream)) => FileSource::Stream(stream),
            None => return Err(ProviderError::NoBody),
        };

        let mut request = PutRequest {
            bucket: self.bucket.clone(),
            key: object_key.clone(),
            body,
            content_type: file.mime.clone(),
            acl: self.acl.clone(),
            cache_control: None,
            content_disposition: None,
            metadata: HashMap::new(),
        };

        if let Some(bucket) = params.bucket {
            request.bucket = bucket;
        }
        if let Some(key) = params.key {
            request.key = key;
        }
        if let Some(acl) = params.acl {
            request.acl = Some(acl);
        }
        if let Some(content_type) = params.content_type {
            request.content_type = Some(content_type);
        }
        request.cache_control = params.cache_control;
        request.content_disposition = params.content_disposition;
        request.metadata = params.metadata;

        if let Err(err) = self.client.put_object_multipart(request).await {
            error!(key = %object_key, bucket = %self.bucket, error = %err, "failed to upload object");
            return Err(err);
        }

        file.url = Some(self.public_url(&object_key));
        debug!(key = %object_key, bucket = %self.bucket, "uploaded object");
        Ok(())
    }

    /// Upload a file using a stream body.
    ///
    /// Identical to [`upload`](Self::upload); kept as a separate entry point
    /// for callers that branch on upload mode.
    pub async fn upload_stream(&self, file: &mut UploadFile) -> Result<()> {
        self.upload(file).await
    }

    /// Stream-mode upload with per-call parameter overrides.
    pub async fn upload_stream_with(
        &self,
        file: &mut UploadFile,
        params: TransferParams,
    ) -> Result<()> {
        self.upload_with(file, params).await
    }

    /// Delete the object a file is stored under.
    pub async fn delete(&self, file: &UploadFile) -> Result<()> {
        self.delete_with(file, TransferParams::default()).await
    }

    /// Delete with per-call bucket/key overrides.
    pub async fn delete_with(&self, file: &UploadFile, params: TransferParams) -> Result<()> {
        let object_key = self.object_key(file);

        let mut request = DeleteRequest {
            bucket: self.bucket.clone(),
            key: object_key.clone(),
        };
        if let Some(bucket) = params.bucket {
            request.bucket = bucket;
        }
        if let Some(key) = params.key {
            request.key = key;
        }

        if let Err(err) = self.client.delete_object(request).await {
            error!(key = %object_key, bucket = %self.bucket, error = %err, "failed to delete object");
            return Err(err);
        }

        debug!(key = %object_key, bucket = %self.bucket, "deleted object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::{stream, StreamExt};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct RecordedPut {
        bucket: String,
        key: String,
        content_type: Option<String>,
        acl: Option<String>,
        body_len: usize,
        streamed: bool,
    }

    #[derive(Default)]
    struct RecordingClient {
        puts: Mutex<Vec<RecordedPut>>,
        deletes: Mutex<Vec<DeleteRequest>>,
        fail: bool,
    }

    impl RecordingClient {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ObjectClient for RecordingClient {
        async fn put_object_multipart(&self, request: PutRequest) -> Result<()> {
            if self.fail {
                return Err(ProviderError::Transfer("simulated transfer failure".into()));
            }
            let (body_len, streamed) = match request.body {
                FileSource::Buffer(data) => (data.len(), false),
                FileSource::Stream(mut body) => {
                    let mut len = 0;
                    while let Some(chunk) = body.next().await {
                        let chunk =
                            chunk.map_err(|e| ProviderError::Transfer(e.to_string()))?;
                        len += chunk.len();
                    }
                    (len, true)
                }
            };
            self.puts.lock().unwrap().push(RecordedPut {
                bucket: request.bucket,
                key: request.key,
                content_type: request.content_type,
                acl: request.acl,
                body_len,
                streamed,
            });
            Ok(())
        }

        async fn delete_object(&self, request: DeleteRequest) -> Result<()> {
            if self.fail {
                return Err(ProviderError::Transfer("simulated transfer failure".into()));
            }
            self.deletes.lock().unwrap().push(request);
            Ok(())
        }
    }

    fn provider_with(
        client: Arc<RecordingClient>,
        configure: impl FnOnce(ProviderConfig) -> ProviderConfig,
    ) -> HetznerStorage {
        let config = configure(
            ProviderConfig::new(HetznerRegion::Fsn1)
                .bucket("test-bucket")
                .client(client),
        );
        HetznerStorage::new(config).unwrap()
    }

    #[tokio::test]
    async fn upload_buffer_sets_regional_url() {
        let client = Arc::new(RecordingClient::default());
        let provider = provider_with(client.clone(), |c| c);

        let mut file = UploadFile::from_buffer("12345", ".txt", "Test Text from Buffer")
            .with_mime("text/plain");
        provider.upload(&mut file).await.unwrap();

        assert_eq!(
            file.url.as_deref(),
            Some("https://test-bucket.fsn1.your-objectstorage.com/12345.txt")
        );

        let puts = client.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].bucket, "test-bucket");
        assert_eq!(puts[0].key, "12345.txt");
        assert_eq!(puts[0].content_type.as_deref(), Some("text/plain"));
        assert_eq!(puts[0].body_len, "Test Text from Buffer".len());
        assert!(!puts[0].streamed);

        // Buffered bodies survive the upload.
        assert!(matches!(file.source, Some(FileSource::Buffer(_))));
    }

    #[tokio::test]
    async fn upload_stream_goes_through_the_same_path() {
        let client = Arc::new(RecordingClient::default());
        let provider = provider_with(client.clone(), |c| c);

        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"Test Text ")),
            Ok(Bytes::from_static(b"for Stream usage")),
        ]);
        let mut file = UploadFile::from_stream("demo-text-from-stream_12345", ".txt", chunks)
            .with_mime("text/plain");
        provider.upload_stream(&mut file).await.unwrap();

        let url = file.url.as_deref().unwrap();
        assert!(url.contains("fsn1.your-objectstorage.com"));
        assert!(url.ends_with("/demo-text-from-stream_12345.txt"));

        let puts = client.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert!(puts[0].streamed);
        assert_eq!(puts[0].body_len, "Test Text for Stream usage".len());
    }

    #[tokio::test]
    async fn prefix_is_normalized_into_the_key_and_url() {
        let client = Arc::new(RecordingClient::default());
        let config = ProviderConfig::new(HetznerRegion::Nbg1)
            .bucket("test-bucket")
            .prefix("uploads/strapi")
            .client(client.clone());
        let provider = HetznerStorage::new(config).unwrap();

        let mut file =
            UploadFile::from_buffer("prefix-test", ".txt", "Test with prefix").with_mime("text/plain");
        provider.upload(&mut file).await.unwrap();

        assert!(file
            .url
            .as_deref()
            .unwrap()
            .contains("uploads/strapi/prefix-test.txt"));
        assert_eq!(client.puts.lock().unwrap()[0].key, "uploads/strapi/prefix-test.txt");
    }

    #[tokio::test]
    async fn base_url_replaces_the_endpoint_url() {
        let client = Arc::new(RecordingClient::default());
        let config = ProviderConfig::new(HetznerRegion::Hel1)
            .bucket("test-bucket")
            .base_url("https://cdn.example.com")
            .client(client);
        let provider = HetznerStorage::new(config).unwrap();

        let mut file =
            UploadFile::from_buffer("cdn-test", ".jpg", "Test with CDN").with_mime("image/jpeg");
        provider.upload(&mut file).await.unwrap();

        assert_eq!(file.url.as_deref(), Some("https://cdn.example.com/cdn-test.jpg"));
    }

    #[tokio::test]
    async fn delete_uses_the_upload_key_formula() {
        let client = Arc::new(RecordingClient::default());
        let provider = provider_with(client.clone(), |c| c);

        // Extension without a leading dot normalizes the same way as upload.
        let file = UploadFile {
            hash: "12345".into(),
            ext: "txt".into(),
            path: Some("demo-text-from-stream".into()),
            ..Default::default()
        };
        provider.delete(&file).await.unwrap();

        let deletes = client.deletes.lock().unwrap();
        assert_eq!(deletes.len(), 1);
        assert_eq!(
            deletes[0],
            DeleteRequest {
                bucket: "test-bucket".into(),
                key: "demo-text-from-stream/12345.txt".into(),
            }
        );
    }

    #[tokio::test]
    async fn transfer_failure_propagates_and_leaves_url_unset() {
        let client = Arc::new(RecordingClient::failing());
        let provider = provider_with(client, |c| c);

        let mut file = UploadFile::from_buffer("12345", ".txt", "data");
        let err = provider.upload(&mut file).await.unwrap_err();

        assert!(err.is_transfer());
        assert!(err.to_string().contains("simulated transfer failure"));
        assert!(file.url.is_none());
    }

    #[tokio::test]
    async fn stream_body_failure_propagates_and_leaves_url_unset() {
        let client = Arc::new(RecordingClient::default());
        let provider = provider_with(client.clone(), |c| c);

        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial ")),
            Err(std::io::Error::other("stream torn")),
        ]);
        let mut file = UploadFile::from_stream("torn", ".bin", chunks);
        let err = provider.upload_stream(&mut file).await.unwrap_err();

        assert!(err.is_transfer());
        assert!(err.to_string().contains("stream torn"));
        assert!(file.url.is_none());
        assert!(client.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_failure_propagates_unchanged() {
        let client = Arc::new(RecordingClient::failing());
        let provider = provider_with(client, |c| c);

        let file = UploadFile::from_buffer("12345", ".txt", "data");
        let err = provider.delete(&file).await.unwrap_err();
        assert!(err.is_transfer());
    }

    #[tokio::test]
    async fn configured_acl_applies_and_per_call_params_win() {
        let client = Arc::new(RecordingClient::default());
        let provider = provider_with(client.clone(), |c| c.public_read());

        let mut file = UploadFile::from_buffer("a", ".txt", "x").with_mime("text/plain");
        provider.upload(&mut file).await.unwrap();

        let mut file = UploadFile::from_buffer("b", ".txt", "x").with_mime("text/plain");
        provider
            .upload_with(
                &mut file,
                TransferParams::new().acl("private").content_type("application/json"),
            )
            .await
            .unwrap();

        let puts = client.puts.lock().unwrap();
        assert_eq!(puts[0].acl.as_deref(), Some("public-read"));
        assert_eq!(puts[1].acl.as_deref(), Some("private"));
        assert_eq!(puts[1].content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn upload_without_a_body_fails_before_any_request() {
        let client = Arc::new(RecordingClient::default());
        let provider = provider_with(client.clone(), |c| c);

        let mut file = UploadFile {
            hash: "12345".into(),
            ext: ".txt".into(),
            ..Default::default()
        };
        let err = provider.upload(&mut file).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoBody));
        assert!(client.puts.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_credentials_fail_construction() {
        let config = ProviderConfig::new(HetznerRegion::Fsn1).bucket("test-bucket");
        let err = HetznerStorage::new(config).unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials));
        assert!(err.to_string().contains("missing credentials"));
    }

    #[test]
    fn missing_bucket_fails_construction_even_with_injected_client() {
        let config = ProviderConfig::new(HetznerRegion::Fsn1)
            .credentials("test-key", "test-secret");
        let err = HetznerStorage::new(config).unwrap_err();
        assert!(matches!(err, ProviderError::MissingBucket));
        assert!(err.to_string().contains("missing bucket"));

        let config = ProviderConfig::new(HetznerRegion::Fsn1)
            .client(Arc::new(RecordingClient::default()));
        let err = HetznerStorage::new(config).unwrap_err();
        assert!(matches!(err, ProviderError::MissingBucket));
    }

    #[test]
    fn injected_client_bypasses_the_credential_check() {
        let config = ProviderConfig::new(HetznerRegion::Fsn1)
            .bucket("test-bucket")
            .client(Arc::new(RecordingClient::default()));
        let provider = HetznerStorage::new(config).unwrap();
        assert_eq!(provider.bucket(), "test-bucket");
        assert_eq!(provider.prefix(), "");
    }

    #[test]
    fn bucket_lowercase_spelling_is_accepted() {
        let mut config = ProviderConfig::new(HetznerRegion::Fsn1)
            .client(Arc::new(RecordingClient::default()));
        config.params.bucket_lowercase = Some("lower-bucket".into());
        let provider = HetznerStorage::new(config).unwrap();
        assert_eq!(provider.bucket(), "lower-bucket");
    }
}
