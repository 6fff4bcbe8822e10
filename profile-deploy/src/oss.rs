#![doc = "OSS integration: implements the core `ObjectStore` contract on top of the S3-compatible API of Alibaba Cloud OSS."]
//
//! # OSS client
//!
//! [`OssClient`] is built once per process from a [`StorageConfig`] and handed
//! to the core publisher. Requests go to `https://<region>.<endpoint>` with
//! virtual-hosted bucket addressing, so objects end up at
//! `https://<bucket>.<region>.<endpoint>/<key>`.
//!
//! OSS specific headers without an S3 equivalent (`x-oss-forbid-overwrite`) are
//! added to the outgoing request directly.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{
    Credentials, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ObjectCannedAcl, StorageClass as S3StorageClass};
use aws_sdk_s3::Client;
use profile_deploy_core::config::StorageConfig;
use profile_deploy_core::contract::{
    ObjectAcl, ObjectStore, PutObjectOutput, PutObjectRequest, StorageClass,
};
use profile_deploy_core::error::BoxError;

pub const FORBID_OVERWRITE_HEADER: &str = "x-oss-forbid-overwrite";

pub struct OssClient {
    client: Client,
    bucket: String,
}

impl OssClient {
    pub async fn from_config(config: &StorageConfig) -> Self {
        Self::connect(config, config.target.service_url(), false).await
    }

    /// Builds the client against `endpoint_url`.
    ///
    /// Trailer checksums (`aws-chunked` bodies) are only sent when an operation
    /// requires them, since OSS rejects them on plain puts. Retries are off: a
    /// failed put fails its file and the batch reports it.
    async fn connect(
        config: &StorageConfig,
        endpoint_url: String,
        force_path_style: bool,
    ) -> Self {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.access_key_secret.clone(),
            None,
            None,
            "profile-deploy",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(&endpoint_url)
            .region(Region::new(config.target.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(force_path_style)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .retry_config(RetryConfig::disabled())
            .build();

        tracing::info!(
            endpoint = %endpoint_url,
            bucket = %config.target.bucket,
            "Initialized OSS client"
        );

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.target.bucket.clone(),
        }
    }
}

fn storage_class(class: StorageClass) -> S3StorageClass {
    match class {
        StorageClass::Standard => S3StorageClass::Standard,
    }
}

fn canned_acl(acl: ObjectAcl) -> ObjectCannedAcl {
    match acl {
        ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
    }
}

fn forbid_overwrite_value(forbid: bool) -> &'static str {
    if forbid {
        "true"
    } else {
        "false"
    }
}

#[async_trait]
impl ObjectStore for OssClient {
    async fn put_object(&self, req: PutObjectRequest) -> Result<PutObjectOutput, BoxError> {
        tracing::debug!(
            key = %req.key,
            storage_class = req.headers.storage_class.as_str(),
            acl = req.headers.acl.as_str(),
            forbid_overwrite = req.headers.forbid_overwrite,
            "Putting object"
        );

        let body = ByteStream::from_path(&req.body).await?;
        let forbid = forbid_overwrite_value(req.headers.forbid_overwrite);

        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&req.key)
            .body(body)
            .storage_class(storage_class(req.headers.storage_class))
            .acl(canned_acl(req.headers.acl))
            .content_disposition(&req.headers.content_disposition)
            .customize()
            .mutate_request(move |http_req| {
                http_req
                    .headers_mut()
                    .insert(FORBID_OVERWRITE_HEADER, forbid);
            })
            .send()
            .await
            .map_err(|e| format!("{}", DisplayErrorContext(e)))?;

        Ok(PutObjectOutput {
            etag: output.e_tag().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_deploy_core::config::StorageTarget;
    use profile_deploy_core::contract::ObjectHeaders;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn storage_config() -> StorageConfig {
        StorageConfig {
            target: StorageTarget::new("my-bucket", "oss-cn-hangzhou"),
            access_key_id: "id".into(),
            access_key_secret: "secret".into(),
        }
    }

    /// Accepts one connection, answers 200 and returns the raw request.
    async fn capture_one_request(listener: TcpListener) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers were complete");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let content_length: usize = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        socket
            .write_all(b"HTTP/1.1 200 OK\r\nETag: \"abc\"\r\nContent-Length: 0\r\n\r\n")
            .await
            .unwrap();
        socket.flush().await.unwrap();

        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn profile_headers_map_to_s3_values() {
        assert_eq!(storage_class(StorageClass::Standard), S3StorageClass::Standard);
        assert_eq!(canned_acl(ObjectAcl::PublicRead), ObjectCannedAcl::PublicRead);
        assert_eq!(forbid_overwrite_value(false), "false");
        assert_eq!(forbid_overwrite_value(true), "true");
    }

    #[tokio::test]
    async fn client_builds_without_network() {
        let client = OssClient::from_config(&storage_config()).await;
        assert_eq!(client.bucket, "my-bucket");
    }

    #[tokio::test]
    async fn put_sends_oss_headers_as_a_single_plain_attempt() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(capture_one_request(listener));

        let mut body = tempfile::NamedTempFile::new().unwrap();
        write!(body, "#!MANAGED-CONFIG x interval=86400\nproxies: []\n").unwrap();

        let client = OssClient::connect(&storage_config(), endpoint, true).await;
        let output = client
            .put_object(PutObjectRequest {
                key: "profiles/a.txt".into(),
                body: body.path().to_path_buf(),
                headers: ObjectHeaders::for_profile("a.txt"),
            })
            .await
            .unwrap();
        assert_eq!(output.etag.as_deref(), Some("\"abc\""));

        let raw = server.await.unwrap();
        let request = raw.to_ascii_lowercase();
        assert!(request.starts_with("put /my-bucket/profiles/a.txt"), "{raw}");
        assert!(request.contains("x-oss-forbid-overwrite: false"), "{raw}");
        assert!(request.contains("x-amz-acl: public-read"), "{raw}");
        assert!(request.contains("x-amz-storage-class: standard"), "{raw}");
        assert!(
            request.contains("content-disposition: attachment; filename=\"a.txt\""),
            "{raw}"
        );
        assert!(!request.contains("aws-chunked"), "{raw}");
        assert!(!request.contains("x-amz-trailer"), "{raw}");
        assert!(request.contains("max=1"), "{raw}");
        assert!(raw.ends_with("#!MANAGED-CONFIG x interval=86400\nproxies: []\n"), "{raw}");
    }
}
