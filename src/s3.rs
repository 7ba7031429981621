//! aws-sdk-s3 implementation of the object-client capability.

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl},
    Client,
};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tracing::debug;

use crate::{
    DeleteRequest, FileSource, FileStream, HetznerRegion, ObjectClient, ProviderError,
    PutRequest, Result, S3ClientOptions,
};

/// Part size for multipart uploads of streamed bodies (8 MiB).
const PART_SIZE: usize = 8 * 1024 * 1024;

/// Object client backed by `aws-sdk-s3`, pointed at a Hetzner regional
/// endpoint.
///
/// Construction is synchronous and performs no I/O: Hetzner issues static
/// keys, so no ambient credential resolution is involved. Buffered bodies go
/// through a single `PutObject`; streamed bodies use a multipart upload with
/// fixed-size parts, aborted best-effort on failure.
pub struct S3ObjectClient {
    client: Client,
}

impl S3ObjectClient {
    /// Build a client for a region with static credentials.
    pub fn new(
        region: HetznerRegion,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        options: &S3ClientOptions,
    ) -> Self {
        let endpoint = options
            .endpoint_url
            .clone()
            .unwrap_or_else(|| region.endpoint().to_string());

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "hetzner-object-storage",
        );

        // Hetzner region codes are not AWS regions, but the SDK only uses the
        // value for signing, which Hetzner accepts.
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.as_str()))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .force_path_style(options.force_path_style.unwrap_or(false))
            .build();

        Self {
            client: Client::from_conf(config),
        }
    }

    /// Wrap an existing `aws-sdk-s3` client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn put_buffer(&self, request: PutRequest, data: Bytes) -> Result<()> {
        let size = data.len();

        self.client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(ByteStream::from(data))
            .set_content_type(request.content_type)
            .set_acl(parse_acl(request.acl.as_deref()))
            .set_cache_control(request.cache_control)
            .set_content_disposition(request.content_disposition)
            .set_metadata(non_empty(request.metadata))
            .send()
            .await
            .map_err(|e| ProviderError::Transfer(e.to_string()))?;

        debug!(key = %request.key, bucket = %request.bucket, size, "put object");
        Ok(())
    }

    async fn put_stream(&self, request: PutRequest, stream: FileStream) -> Result<()> {
        let create = self
            .client
            .create_multipart_upload()
            .bucket(&request.bucket)
            .key(&request.key)
            .set_content_type(request.content_type)
            .set_acl(parse_acl(request.acl.as_deref()))
            .set_cache_control(request.cache_control)
            .set_content_disposition(request.content_disposition)
            .set_metadata(non_empty(request.metadata))
            .send()
            .await
            .map_err(|e| ProviderError::Transfer(e.to_string()))?;

        let upload_id = create
            .upload_id()
            .ok_or_else(|| {
                ProviderError::Transfer("multipart upload id missing from response".into())
            })?
            .to_string();

        match self
            .upload_parts(&request.bucket, &request.key, &upload_id, stream)
            .await
        {
            Ok(parts) => {
                self.client
                    .complete_multipart_upload()
                    .bucket(&request.bucket)
                    .key(&request.key)
                    .upload_id(&upload_id)
                    .multipart_upload(
                        CompletedMultipartUpload::builder()
                            .set_parts(Some(parts))
                            .build(),
                    )
                    .send()
                    .await
                    .map_err(|e| ProviderError::Transfer(e.to_string()))?;

                debug!(key = %request.key, bucket = %request.bucket, "completed multipart upload");
                Ok(())
            }
            Err(err) => {
                // Best-effort cleanup; callers see the first failure.
                let _ = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&request.bucket)
                    .key(&request.key)
                    .upload_id(&upload_id)
                    .send()
                    .await;
                Err(err)
            }
        }
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        stream: FileStream,
    ) -> Result<Vec<CompletedPart>> {
        let mut parts = Vec::new();
        let mut part_stream = split_into_parts(stream, PART_SIZE);
        let mut part_number: i32 = 1;

        while let Some(part) = part_stream.next().await {
            let part = part.map_err(|e| ProviderError::Transfer(e.to_string()))?;
            parts.push(
                self.upload_part(bucket, key, upload_id, part_number, part)
                    .await?,
            );
            part_number += 1;
        }

        Ok(parts)
    }

    async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> Result<CompletedPart> {
        let response = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| ProviderError::Transfer(e.to_string()))?;

        Ok(CompletedPart::builder()
            .set_e_tag(response.e_tag)
            .part_number(part_number)
            .build())
    }
}

#[async_trait]
impl ObjectClient for S3ObjectClient {
    async fn put_object_multipart(&self, mut request: PutRequest) -> Result<()> {
        match std::mem::replace(&mut request.body, FileSource::Buffer(Bytes::new())) {
            FileSource::Buffer(data) => self.put_buffer(request, data).await,
            FileSource::Stream(stream) => self.put_stream(request, stream).await,
        }
    }

    async fn delete_object(&self, request: DeleteRequest) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .send()
            .await
            .map_err(|e| ProviderError::Transfer(e.to_string()))?;

        debug!(key = %request.key, bucket = %request.bucket, "deleted object");
        Ok(())
    }
}

/// Re-chunk a byte stream into parts of `part_size`.
///
/// Every part but the last is exactly `part_size` bytes; the last carries the
/// remainder. An empty stream still yields one empty part, since a multipart
/// upload cannot complete with zero parts. A chunk error is yielded in place
/// of a part and ends the stream; buffered bytes are dropped.
fn split_into_parts(stream: FileStream, part_size: usize) -> FileStream {
    struct SplitState {
        stream: FileStream,
        buffer: BytesMut,
        source_done: bool,
        emitted_any: bool,
        failed: bool,
    }

    let state = SplitState {
        stream,
        buffer: BytesMut::new(),
        source_done: false,
        emitted_any: false,
        failed: false,
    };

    futures::stream::unfold(state, move |mut state| async move {
        if state.failed {
            return None;
        }
        loop {
            if state.buffer.len() >= part_size {
                state.emitted_any = true;
                let part = state.buffer.split_to(part_size).freeze();
                return Some((Ok(part), state));
            }
            if state.source_done {
                if !state.buffer.is_empty() || !state.emitted_any {
                    state.emitted_any = true;
                    let part = state.buffer.split_off(0).freeze();
                    return Some((Ok(part), state));
                }
                return None;
            }
            match state.stream.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => {
                    state.failed = true;
                    return Some((Err(err), state));
                }
                None => state.source_done = true,
            }
        }
    })
    .boxed()
}

fn parse_acl(acl: Option<&str>) -> Option<ObjectCannedAcl> {
    acl.and_then(|s| s.parse::<ObjectCannedAcl>().ok())
}

fn non_empty(
    metadata: std::collections::HashMap<String, String>,
) -> Option<std::collections::HashMap<String, String>> {
    if metadata.is_empty() {
        None
    } else {
        Some(metadata)
    }
}
