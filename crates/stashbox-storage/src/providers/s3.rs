//! S3-compatible object store backed by `aws-sdk-s3`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use bytes::Bytes;
use tracing::{debug, info};

use stashbox_core::config::S3StorageConfig;
use stashbox_core::error::AppError;
use stashbox_core::result::AppResult;
use stashbox_core::traits::{ObjectStore, ObjectStoreFailure, ObjectSummary};

/// Error codes S3 uses for missing or rejected credentials.
const CREDENTIAL_ERROR_CODES: &[&str] = &[
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "AccessDenied",
    "ExpiredToken",
    "InvalidToken",
];

/// Object store client for one bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
    timeout: Duration,
}

impl S3ObjectStore {
    /// Build a client from configuration.
    ///
    /// Explicit keys take precedence; otherwise the default AWS credential
    /// chain is used.
    pub async fn from_config(config: &S3StorageConfig) -> AppResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(AppError::configuration(
                "storage.s3.bucket must be set when S3 is enabled",
            ));
        }

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if !config.access_key.is_empty() {
            builder = builder.credentials_provider(Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "stashbox-config",
            ));
        }

        let endpoint = Some(config.endpoint.trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty());
        if let Some(ref endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        builder = builder.force_path_style(config.force_path_style);

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = endpoint.as_deref().unwrap_or("aws"),
            "Initialized S3 object store"
        );

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    /// Run one SDK call under the configured timeout, mapping every failure
    /// to `StorageTransient`.
    async fn call<T, E>(
        &self,
        operation: &'static str,
        key: &str,
        request: impl Future<Output = Result<T, SdkError<E>>>,
    ) -> AppResult<T>
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => {
                let failure = classify(&err);
                debug!(operation, key, %failure, "S3 call failed");
                Err(AppError::storage_transient(format!(
                    "S3 {operation} failed for '{key}' ({failure}): {}",
                    DisplayErrorContext(&err)
                )))
            }
            Err(_) => Err(AppError::storage_transient(format!(
                "S3 {operation} timed out after {}s for '{key}' ({})",
                self.timeout.as_secs(),
                ObjectStoreFailure::Transport
            ))),
        }
    }
}

/// Sort an SDK error into credentials / request / transport.
fn classify<E: ProvideErrorMetadata>(err: &SdkError<E>) -> ObjectStoreFailure {
    match err {
        SdkError::ServiceError(service) => match service.err().code() {
            Some(code) if CREDENTIAL_ERROR_CODES.contains(&code) => ObjectStoreFailure::Credentials,
            _ => ObjectStoreFailure::Request,
        },
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ObjectStoreFailure::Transport
        }
        _ => ObjectStoreFailure::Request,
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn backend_name(&self) -> &str {
        "s3"
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()> {
        let size = data.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        self.call("put_object", key, request.send()).await?;
        debug!(bucket = %self.bucket, key, size_bytes = size, "Uploaded object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        // DeleteObject succeeds for keys that do not exist.
        let request = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send();
        self.call("delete_object", key, request).await?;
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| {
            AppError::storage_transient(format!("Invalid presign duration {ttl:?}: {e}"))
        })?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning);
        let presigned = self.call("presign_get_object", key, request).await?;
        Ok(presigned.uri().to_string())
    }

    fn object_url(&self, key: &str) -> String {
        match self.endpoint {
            Some(ref endpoint) => format!("{endpoint}/{}/{key}", self.bucket),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{key}",
                self.bucket, self.region
            ),
        }
    }

    async fn bucket_exists(&self) -> AppResult<bool> {
        let request = self.client.head_bucket().bucket(&self.bucket).send();
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(err))
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found()) =>
            {
                Ok(false)
            }
            Ok(Err(err)) => Err(AppError::storage_transient(format!(
                "S3 head_bucket failed for '{}' ({}): {}",
                self.bucket,
                classify(&err),
                DisplayErrorContext(&err)
            ))),
            Err(_) => Err(AppError::storage_transient(format!(
                "S3 head_bucket timed out for '{}'",
                self.bucket
            ))),
        }
    }

    async fn create_bucket(&self) -> AppResult<()> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if self.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        self.call("create_bucket", &self.bucket, request.send()).await?;
        info!(bucket = %self.bucket, region = %self.region, "Created S3 bucket");
        Ok(())
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send();
            let page = self.call("list_objects_v2", prefix, request).await?;

            objects.extend(page.contents().iter().filter_map(|object| {
                let key = object.key()?.to_string();
                let last_modified = object.last_modified().and_then(|t| {
                    chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())
                });
                Some(ObjectSummary {
                    key,
                    size_bytes: object.size().unwrap_or(0).max(0) as u64,
                    last_modified,
                })
            }));

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        Ok(objects)
    }
}
