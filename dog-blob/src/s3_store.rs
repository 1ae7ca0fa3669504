use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::store::{BlobInfo, BlobStore, ObjectHead};
use crate::{BlobError, BlobResult, ByteStream};

/// Connection settings for an S3-compatible backend
///
/// Works against AWS S3, MinIO/RustFS and the GCS XML interoperability
/// endpoint (`https://storage.googleapis.com` with HMAC keys).
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
}

impl S3Config {
    pub fn new<S: Into<String>>(bucket: S) -> Self {
        Self {
            bucket: bucket.into(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }

    /// Read `S3_*` variables; `BUCKET_NAME` is accepted when `S3_BUCKET` is unset.
    pub fn from_env() -> BlobResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> BlobResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bucket = lookup("S3_BUCKET")
            .or_else(|| lookup("BUCKET_NAME"))
            .ok_or_else(|| {
                BlobError::invalid("S3_BUCKET or BUCKET_NAME environment variable required")
            })?;

        let mut config = Self::new(bucket);
        if let Some(region) = lookup("S3_REGION") {
            config.region = region;
        }
        config.endpoint_url = lookup("S3_ENDPOINT_URL");
        config.access_key_id = lookup("S3_ACCESS_KEY_ID");
        config.secret_access_key = lookup("S3_SECRET_ACCESS_KEY");
        config.force_path_style = lookup("S3_FORCE_PATH_STYLE")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(config)
    }
}

/// S3-compatible store implementation using the AWS SDK
#[derive(Clone)]
pub struct S3CompatibleStore {
    client: Client,
    bucket: String,
}

impl S3CompatibleStore {
    pub async fn new(config: S3Config) -> Self {
        let client = Self::create_client(&config).await;
        Self {
            client,
            bucket: config.bucket,
        }
    }

    pub async fn from_env() -> BlobResult<Self> {
        Ok(Self::new(S3Config::from_env()?).await)
    }

    async fn create_client(config: &S3Config) -> Client {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        // Without explicit keys the SDK default credential chain applies.
        if let (Some(key), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key.clone(),
                secret.clone(),
                None,
                None,
                "dog-blob",
            ));
        }

        let sdk_config = loader.load().await;
        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(config.force_path_style)
                .build(),
        )
    }

    fn map_aws_error(err: impl std::error::Error + Send + Sync + 'static) -> BlobError {
        BlobError::backend(err)
    }

    fn timestamp(dt: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
    }
}

#[async_trait]
impl BlobStore for S3CompatibleStore {
    async fn exists(&self, key: &str) -> BlobResult<bool> {
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(Self::map_aws_error(err)),
        }
    }

    async fn head(&self, key: &str) -> BlobResult<ObjectHead> {
        let result = match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(result) => result,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => {
                return Err(BlobError::not_found(key));
            }
            Err(err) => return Err(Self::map_aws_error(err)),
        };

        Ok(ObjectHead {
            size_bytes: result.content_length.unwrap_or(0).max(0) as u64,
            content_type: result.content_type,
            etag: result.e_tag,
            last_modified: result.last_modified.as_ref().and_then(Self::timestamp),
        })
    }

    async fn read_range(&self, key: &str, start: u64, end: u64) -> BlobResult<ByteStream> {
        debug!(bucket = %self.bucket, key, start, end, "s3 ranged get");

        let result = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(format!("bytes={start}-{end}"))
            .send()
            .await
        {
            Ok(result) => result,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Err(BlobError::not_found(key));
            }
            Err(err) => return Err(Self::map_aws_error(err)),
        };

        let mut body = result.body;
        let stream = async_stream::stream! {
            while let Some(piece) = body.next().await {
                match piece {
                    Ok(bytes) => yield Ok(bytes),
                    Err(err) => {
                        yield Err(std::io::Error::other(err));
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn list(&self, prefix: &str, limit: usize) -> BlobResult<Vec<BlobInfo>> {
        let result = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(limit.min(i32::MAX as usize) as i32)
            .send()
            .await
            .map_err(Self::map_aws_error)?;

        Ok(result
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| {
                let key = object.key?;
                Some(BlobInfo {
                    key,
                    size_bytes: object.size.unwrap_or(0).max(0) as u64,
                    etag: object.e_tag,
                    last_modified: object.last_modified.as_ref().and_then(Self::timestamp),
                })
            })
            .collect())
    }
}
