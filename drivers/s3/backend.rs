//! rust-s3 transport / 基于 rust-s3 的对象存储传输层
//!
//! Every supported cloud exposes an S3-compatible API, so all cloud drivers
//! share this backend and differ only in endpoint, region and addressing
//! style. The bucket is built without fail-on-err, so each response status is
//! checked here.

use async_trait::async_trait;
use bytes::Bytes;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::serde_types::Part;
use s3::Region;

use crate::error::BackendError;
use crate::storage::{CompletedPart, ObjectBackend};

/// Connection settings for one bucket / 存储桶连接参数
#[derive(Debug, Clone)]
pub struct BucketOptions {
    pub bucket_name: String,
    /// Full endpoint URL including scheme
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// `https://endpoint/bucket/key` instead of `https://bucket.endpoint/key`
    pub path_style: bool,
}

pub struct S3Backend {
    bucket: Box<Bucket>,
}

impl S3Backend {
    /// Build the bucket client; no request is sent / 创建S3 Bucket客户端
    pub fn new(options: &BucketOptions) -> Result<Self, BackendError> {
        let credentials = Credentials::new(
            Some(&options.access_key_id),
            Some(&options.secret_access_key),
            None,
            None,
            None,
        )?;

        let region = Region::Custom {
            region: options.region.clone(),
            endpoint: options.endpoint.clone(),
        };

        let bucket = Bucket::new(&options.bucket_name, region, credentials)?;
        let bucket = if options.path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(Self { bucket })
    }
}

fn check_status(operation: &str, key: &str, status: u16) -> Result<(), BackendError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(format!("{} {} failed: HTTP {}", operation, key, status).into())
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let resp = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await?;
        check_status("PutObject", key, resp.status_code())
    }

    async fn initiate_multipart(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let resp = self.bucket.initiate_multipart_upload(key, content_type).await?;
        if resp.upload_id.is_empty() {
            return Err(format!("InitiateMultipartUpload {} returned no upload id", key).into());
        }
        Ok(resp.upload_id)
    }

    async fn upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, BackendError> {
        let part = self
            .bucket
            .put_multipart_chunk(data.to_vec(), key, part_number, upload_id, content_type)
            .await?;
        if part.etag.is_empty() {
            return Err(format!("UploadPart {} part {} returned no etag", key, part_number).into());
        }
        Ok(part.etag)
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<CompletedPart>,
    ) -> Result<(), BackendError> {
        let parts = parts
            .into_iter()
            .map(|p| Part {
                part_number: p.part_number,
                etag: p.etag,
            })
            .collect();

        let resp = self.bucket.complete_multipart_upload(key, upload_id, parts).await?;
        check_status("CompleteMultipartUpload", key, resp.status_code())
    }

    async fn abort_multipart(&self, key: &str, upload_id: &str) -> Result<(), BackendError> {
        self.bucket.abort_upload(key, upload_id).await?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), BackendError> {
        let resp = self.bucket.delete_object(key).await?;
        check_status("DeleteObject", key, resp.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_check() {
        assert!(check_status("PutObject", "a", 200).is_ok());
        assert!(check_status("DeleteObject", "a", 204).is_ok());

        let err = check_status("PutObject", "a/b.png", 403).unwrap_err();
        assert_eq!(err.to_string(), "PutObject a/b.png failed: HTTP 403");
    }

    #[test]
    fn test_backend_builds_without_network() {
        let backend = S3Backend::new(&BucketOptions {
            bucket_name: "e-code".to_string(),
            endpoint: "http://127.0.0.1:9000".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: "ak".to_string(),
            secret_access_key: "sk".to_string(),
            path_style: true,
        });
        assert!(backend.is_ok());
    }
}
