//! # contract: interface to the object-storage collaborator
//!
//! The publishing pipeline only needs one capability from a storage service:
//! put an object under a key, with a payload and a fixed set of headers.
//! [`ObjectStore`] captures exactly that, so the pipeline can run against the
//! real OSS client in the CLI crate or against a `mockall` mock in tests.
//!
//! ## Mocking & Testing
//! - With the `test-export-mocks` feature (on by default) the generated
//!   `MockObjectStore` is exported for integration tests of dependents.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::BoxError;

/// OSS storage class of a published object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StorageClass {
    Standard,
}

impl StorageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "Standard",
        }
    }
}

/// Canned access-control setting for a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ObjectAcl {
    PublicRead,
}

impl ObjectAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectAcl::PublicRead => "public-read",
        }
    }
}

/// Headers sent with every put.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectHeaders {
    pub storage_class: StorageClass,
    pub acl: ObjectAcl,
    pub content_disposition: String,
    /// When `false` an existing object under the same key is replaced.
    pub forbid_overwrite: bool,
}

impl ObjectHeaders {
    /// Header set for a published profile: standard class, world readable,
    /// downloaded as an attachment under its original filename, overwrite allowed.
    pub fn for_profile(filename: &str) -> Self {
        Self {
            storage_class: StorageClass::Standard,
            acl: ObjectAcl::PublicRead,
            content_disposition: format!("attachment; filename=\"{filename}\""),
            forbid_overwrite: false,
        }
    }
}

/// A single put-object call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectRequest {
    /// Destination key inside the bucket.
    pub key: String,
    /// Local file holding the payload. Only guaranteed to exist for the duration of the call.
    pub body: PathBuf,
    pub headers: ObjectHeaders,
}

/// What the store reports back. Not used beyond logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    pub etag: Option<String>,
}

/// Trait for putting objects into a bucket.
/// Implemented by the OSS client and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store the payload at `req.body` under `req.key` with the given headers.
    async fn put_object(&self, req: PutObjectRequest) -> Result<PutObjectOutput, BoxError>;
}
