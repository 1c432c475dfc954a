//! Object-store access.
//!
//! Key layout inside the bucket:
//! - `env_<name>`: the `.env` payload of environment `<name>`
//! - `<name>_uploads/<file>`: files attached to environment `<name>`
//!
//! Keys are the only source of truth; nothing else is stored remotely.

pub mod remote;
#[cfg(test)]
#[path = "../../tests/support/s3_stub.rs"]
pub mod stub;

use std::io::Write;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Profile;

pub use self::remote::{build_client, Endpoint, S3Client, S3Store};

/// Prefix marking an object as an environment.
pub const ENV_PREFIX: &str = "env_";

const UPLOADS_SUFFIX: &str = "_uploads/";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to initialise object store client: {0}")]
    Init(String),

    #[error(transparent)]
    S3(#[from] s3::error::S3Error),

    #[error("Unexpected HTTP status {status} for '{key}'")]
    Status { key: String, status: u16 },

    #[error("Object '{0}' does not exist")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Metadata returned by [`ObjectStore::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
}

/// Lazy, single-pass listing. Dropping it tears down any pending page request.
pub type Listing<'a> = Box<dyn Iterator<Item = Result<String, StoreError>> + 'a>;

/// A bucket-bound S3-compatible object store.
pub trait ObjectStore {
    fn bucket_name(&self) -> &str;

    fn bucket_exists(&self) -> Result<bool, StoreError>;

    /// Non-recursive listing: yields full keys directly under `prefix`, and
    /// deeper "directories" once each as their common prefix.
    fn list<'a>(&'a self, prefix: &str) -> Listing<'a>;

    /// Streams the body of `key` into `out` and returns the byte count.
    fn get_to(&self, key: &str, out: &mut (dyn Write + Send)) -> Result<u64, StoreError>;

    fn stat(&self, key: &str) -> Result<ObjectInfo, StoreError>;

    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StoreError>;
}

/// Builds a store from a profile.
pub trait Connector {
    fn connect(&self, profile: &Profile) -> Result<Box<dyn ObjectStore>, StoreError>;
}

/// Connects to the real thing.
pub struct S3Connector;

impl Connector for S3Connector {
    fn connect(&self, profile: &Profile) -> Result<Box<dyn ObjectStore>, StoreError> {
        let client = build_client(&profile.host, &profile.key, profile.secret.expose_secret())?;
        Ok(Box::new(client.bucket(&profile.bucket)?))
    }
}

/// Checks that the store's bucket can be queried.
///
/// A missing bucket is not an error here and is never created; the first real
/// operation surfaces it.
pub fn require_bucket(store: &dyn ObjectStore) -> Result<(), StoreError> {
    match store.bucket_exists()? {
        true => debug!(bucket = store.bucket_name(), "bucket exists"),
        false => warn!(bucket = store.bucket_name(), "bucket not found"),
    }
    Ok(())
}

pub fn env_key(name: &str) -> String {
    format!("{ENV_PREFIX}{name}")
}

pub fn uploads_prefix(env: &str) -> String {
    format!("{env}{UPLOADS_SUFFIX}")
}

pub fn upload_key(env: &str, name: &str) -> String {
    format!("{}{}", uploads_prefix(env), name)
}

/// Strips the first occurrence of `prefix`, mirroring how keys are displayed.
pub fn strip_key<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

/// Environment names must stay distinguishable from upload keys.
pub fn is_valid_environment(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.starts_with(ENV_PREFIX)
}
