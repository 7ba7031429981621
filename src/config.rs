//! Provider configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{HetznerRegion, ObjectClient};

/// Bucket/ACL parameters bag.
///
/// Callers have historically supplied these under either a capitalized or a
/// lowercase key, so both spellings are accepted; resolution checks the
/// capitalized spelling first and treats empty strings as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderParams {
    /// Bucket name, capitalized spelling.
    #[serde(rename = "Bucket", default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Bucket name, lowercase spelling.
    #[serde(rename = "bucket", default, skip_serializing_if = "Option::is_none")]
    pub bucket_lowercase: Option<String>,
    /// Canned ACL applied to every upload, capitalized spelling.
    #[serde(rename = "ACL", default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,
    /// Canned ACL, lowercase spelling.
    #[serde(rename = "acl", default, skip_serializing_if = "Option::is_none")]
    pub acl_lowercase: Option<String>,
}

impl ProviderParams {
    /// Resolve the bucket name: `Bucket` first, then `bucket`.
    pub fn resolve_bucket(&self) -> Option<&str> {
        [self.bucket.as_deref(), self.bucket_lowercase.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }

    /// Resolve the canned ACL: `ACL` first, then `acl`.
    pub fn resolve_acl(&self) -> Option<&str> {
        [self.acl.as_deref(), self.acl_lowercase.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

/// Extra options forwarded to S3 client construction.
///
/// Bounded replacement for open-ended passthrough config: only the knobs this
/// provider actually forwards are representable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3ClientOptions {
    /// Override the resolved regional endpoint (e.g. for a proxy).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    /// Override virtual-hosted-style addressing. Defaults to `false`
    /// (virtual-hosted), which Hetzner supports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_path_style: Option<bool>,
}

/// Configuration for [`crate::HetznerStorage`].
///
/// Credentials are required unless a pre-built [`ObjectClient`] is injected;
/// a bucket name in `params` is required either way.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Access key id issued by Hetzner.
    #[serde(default)]
    pub access_key_id: String,
    /// Secret access key issued by Hetzner.
    #[serde(default)]
    pub secret_access_key: String,
    /// Hetzner Object Storage location.
    pub region: HetznerRegion,
    /// Optional key prefix inside the bucket.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Optional base URL (e.g. a CDN) replacing the computed endpoint URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Bucket and ACL parameters.
    #[serde(default)]
    pub params: ProviderParams,
    /// Extra S3 client construction options.
    #[serde(default)]
    pub client_options: S3ClientOptions,
    /// Pre-built client, bypassing client construction and the credential
    /// check. Useful for substituting a test double.
    #[serde(skip)]
    pub client: Option<Arc<dyn ObjectClient>>,
}

impl ProviderConfig {
    /// Create a configuration for a region.
    pub fn new(region: HetznerRegion) -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region,
            prefix: None,
            base_url: None,
            params: ProviderParams::default(),
            client_options: S3ClientOptions::default(),
            client: None,
        }
    }

    /// Set the access credentials.
    pub fn credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = access_key_id.into();
        self.secret_access_key = secret_access_key.into();
        self
    }

    /// Set the bucket name (capitalized spelling).
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.params.bucket = Some(bucket.into());
        self
    }

    /// Set the canned ACL applied to every upload.
    pub fn acl(mut self, acl: impl Into<String>) -> Self {
        self.params.acl = Some(acl.into());
        self
    }

    /// Shorthand for a `public-read` ACL.
    pub fn public_read(self) -> Self {
        self.acl("public-read")
    }

    /// Set the key prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set a base URL replacing the computed endpoint URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the resolved regional endpoint.
    pub fn endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.client_options.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Override the addressing style.
    pub fn force_path_style(mut self, force: bool) -> Self {
        self.client_options.force_path_style = Some(force);
        self
    }

    /// Inject a pre-built client.
    pub fn client(mut self, client: Arc<dyn ObjectClient>) -> Self {
        self.client = Some(client);
        self
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("prefix", &self.prefix)
            .field("base_url", &self.base_url)
            .field("params", &self.params)
            .field("client_options", &self.client_options)
            .field("client", &self.client.as_ref().map(|_| "<injected>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_lookup_prefers_capitalized_spelling() {
        let params = ProviderParams {
            bucket: Some("primary".into()),
            bucket_lowercase: Some("fallback".into()),
            ..Default::default()
        };
        assert_eq!(params.resolve_bucket(), Some("primary"));
    }

    #[test]
    fn bucket_lookup_falls_back_past_empty_strings() {
        let params = ProviderParams {
            bucket: Some(String::new()),
            bucket_lowercase: Some("fallback".into()),
            ..Default::default()
        };
        assert_eq!(params.resolve_bucket(), Some("fallback"));

        let params = ProviderParams::default();
        assert_eq!(params.resolve_bucket(), None);
    }

    #[test]
    fn acl_lookup_mirrors_bucket_lookup() {
        let params = ProviderParams {
            acl_lowercase: Some("public-read".into()),
            ..Default::default()
        };
        assert_eq!(params.resolve_acl(), Some("public-read"));
    }

    #[test]
    fn params_deserialize_both_spellings() {
        let params: ProviderParams =
            serde_json::from_str(r#"{"Bucket":"cap","acl":"private"}"#).unwrap();
        assert_eq!(params.resolve_bucket(), Some("cap"));
        assert_eq!(params.resolve_acl(), Some("private"));
    }

    #[test]
    fn config_deserializes_camel_case_keys() {
        let config: ProviderConfig = serde_json::from_str(
            r#"{
                "accessKeyId": "key",
                "secretAccessKey": "secret",
                "region": "fsn1",
                "prefix": "uploads",
                "baseUrl": "https://cdn.example.com",
                "params": {"bucket": "media"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.access_key_id, "key");
        assert_eq!(config.region, HetznerRegion::Fsn1);
        assert_eq!(config.params.resolve_bucket(), Some("media"));
        assert!(config.client.is_none());
    }
}
