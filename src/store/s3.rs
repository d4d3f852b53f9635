//! S3-backed image store.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::ImageStore;
use crate::error::StoreError;

/// S3-backed implementation of `ImageStore`.
///
/// The cache key becomes the object key, optionally under a prefix:
///
/// ```text
/// prefix = "og"   key = "Hello-World-.png"   →   s3://bucket/og/Hello-World-.png
/// ```
#[derive(Clone)]
pub struct S3ImageStore {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3ImageStore {
    /// Create a store writing to the root of `bucket`.
    pub fn new(client: Client, bucket: String) -> Self {
        Self {
            client,
            bucket,
            prefix: None,
        }
    }

    /// Place all objects under `prefix`. An empty prefix is ignored.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_matches('/');
        self.prefix = if prefix.is_empty() {
            None
        } else {
            Some(prefix.to_string())
        };
        self
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Map a cache key to its object key.
    pub fn object_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let object_key = self.object_key(key);

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let is_not_found = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);

                // Some S3-compatible services answer 404 without a NoSuchKey code
                let status_is_404 = e
                    .raw_response()
                    .map(|r| r.status().as_u16() == 404)
                    .unwrap_or(false);

                if is_not_found || status_is_404 {
                    return Ok(None);
                }

                return Err(StoreError::S3(format!(
                    "get s3://{}/{}: {}",
                    self.bucket,
                    object_key,
                    DisplayErrorContext(&e)
                )));
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .into_bytes();

        Ok(Some(data))
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let object_key = self.object_key(key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type("image/png")
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                StoreError::S3(format!(
                    "put s3://{}/{}: {}",
                    self.bucket,
                    object_key,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services generally need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
