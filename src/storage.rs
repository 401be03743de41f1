use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("not_found")]
    NotFound,
    #[error("other: {0}")]
    Other(String),
}

/// Key-based blob storage. Keys are opaque paths like
/// `{listing_id}/{uuid}.jpg`; public URL derivation is pure (no round trip).
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), ImageStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ImageStoreError>;
    fn public_url(&self, key: &str) -> String;
}

// ---------------- S3 implementation (MinIO compatible) ----------------

pub struct S3ImageStore {
    bucket: String,
    client: aws_sdk_s3::Client,
    public_base: String,
}

impl S3ImageStore {
    pub async fn new() -> anyhow::Result<Self> {
        use aws_credential_types::provider::SharedCredentialsProvider;
        use aws_credential_types::Credentials;

        let bucket = std::env::var("S3_BUCKET").unwrap_or_else(|_| "property-images".into());
        let endpoint = std::env::var("S3_ENDPOINT")
            .map_err(|_| anyhow::anyhow!("S3_ENDPOINT must be set (MinIO / S3 endpoint)"))?;
        let region = std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into());
        let access = std::env::var("S3_ACCESS_KEY").unwrap_or_default();
        let secret = std::env::var("S3_SECRET_KEY").unwrap_or_default();
        // Base used for public URLs; defaults to path-style on the endpoint.
        let public_base = std::env::var("S3_PUBLIC_BASE")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region));
        loader = loader.endpoint_url(endpoint);
        if !access.is_empty() && !secret.is_empty() {
            let creds = Credentials::new(access, secret, None, None, "static");
            loader = loader.credentials_provider(SharedCredentialsProvider::new(creds));
        }
        let conf = loader.load().await;
        // Path-style addressing (required for most MinIO/local endpoints)
        let s3_conf = aws_sdk_s3::config::Builder::from(&conf)
            .force_path_style(true)
            .build();
        let client = aws_sdk_s3::Client::from_conf(s3_conf);
        info!("Initialized S3/MinIO client (path-style addressing enabled)");

        // Ensure bucket exists (create if missing)
        if let Err(e) = client.head_bucket().bucket(&bucket).send().await {
            warn!("head_bucket failed for '{bucket}' (will attempt create): {e:?}");
            let mut attempt = 0u32;
            let max_attempts = 8;
            loop {
                attempt += 1;
                match client.create_bucket().bucket(&bucket).send().await {
                    Ok(_) => {
                        info!("created bucket '{bucket}' (attempt {attempt})");
                        break;
                    }
                    Err(e2) => {
                        if attempt >= max_attempts {
                            error!("create_bucket failed for '{bucket}' after {attempt} attempts: {e2:?}");
                            return Err(anyhow::anyhow!("failed to ensure bucket '{bucket}': {e2}"));
                        }
                        let backoff_ms = 200 * attempt.pow(2);
                        warn!("create_bucket attempt {attempt} failed for '{bucket}': {e2:?} (retrying in {backoff_ms}ms)");
                        tokio::time::sleep(std::time::Duration::from_millis(backoff_ms as u64))
                            .await;
                    }
                }
            }
        }

        Ok(Self { bucket, client, public_base })
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), ImageStoreError> {
        use aws_sdk_s3::primitives::ByteStream;
        let put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes.to_vec()))
            // content type helps when serving directly from S3/MinIO
            .content_type(
                infer::get(bytes)
                    .map(|t| t.mime_type().to_string())
                    .unwrap_or_else(|| "application/octet-stream".into()),
            );
        if let Err(e) = put.send().await {
            error!("put_object failed key={key} bucket={} err={:?}", self.bucket, e);
            let hint = if e.to_string().contains("NoSuchBucket") {
                " (bucket missing or not yet propagated)"
            } else if e.to_string().contains("AccessDenied") {
                " (check S3_ACCESS_KEY/S3_SECRET_KEY permissions)"
            } else {
                ""
            };
            return Err(ImageStoreError::Other(format!("{e}{hint}")));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ImageStoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ImageStoreError::Other(e.to_string()))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

// ---------------- In-memory implementation (tests / local dev) ----------------

#[derive(Default)]
pub struct MemImageStore {
    objects: std::sync::RwLock<std::collections::HashMap<String, Vec<u8>>>,
}

impl MemImageStore {
    pub fn new() -> Self { Self::default() }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for MemImageStore {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), ImageStoreError> {
        self.objects
            .write()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ImageStoreError> {
        match self.objects.write().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(ImageStoreError::NotFound),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("mem://property-images/{key}")
    }
}

/// Factory used by main: S3 unless PROPFOLIO_IMAGE_STORE=mem.
pub async fn build_image_store() -> anyhow::Result<Arc<dyn ImageStore>> {
    if std::env::var("PROPFOLIO_IMAGE_STORE").as_deref() == Ok("mem") {
        info!("Using in-memory image store");
        return Ok(Arc::new(MemImageStore::new()));
    }
    Ok(Arc::new(S3ImageStore::new().await?))
}
