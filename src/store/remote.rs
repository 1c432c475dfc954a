//! S3-compatible client built on `rust-s3`'s blocking API.

use std::collections::VecDeque;
use std::io::{self, Write};

use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use tracing::{debug, instrument, trace};

use super::{Listing, ObjectInfo, ObjectStore, StoreError};

/// Region sent when signing; custom endpoints ignore it.
const DEFAULT_REGION: &str = "us-east-1";

/// Host and transport derived from a profile's HOSTNAME.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub tls: bool,
}

impl Endpoint {
    /// `http://` disables TLS; anything else uses it, with `https://` stripped.
    pub fn parse(host: &str) -> Self {
        match host.strip_prefix("http://") {
            Some(rest) => Endpoint {
                host: rest.to_string(),
                tls: false,
            },
            None => Endpoint {
                host: host.strip_prefix("https://").unwrap_or(host).to_string(),
                tls: true,
            },
        }
    }

    pub fn url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}", scheme, self.host)
    }
}

/// Authenticated client, not yet bound to a bucket.
pub struct S3Client {
    endpoint: Endpoint,
    region: Region,
    credentials: Credentials,
}

/// Builds a V4-signing client for `host` using static credentials.
pub fn build_client(host: &str, key: &str, secret: &str) -> Result<S3Client, StoreError> {
    let endpoint = Endpoint::parse(host);
    if endpoint.host.is_empty() {
        return Err(StoreError::Init(format!("invalid hostname '{}'", host)));
    }

    let credentials = Credentials::new(Some(key), Some(secret), None, None, None)
        .map_err(|e| StoreError::Init(e.to_string()))?;
    let region = Region::Custom {
        region: DEFAULT_REGION.to_string(),
        endpoint: endpoint.url(),
    };

    debug!(endpoint = %endpoint.host, tls = endpoint.tls, "built object store client");
    Ok(S3Client {
        endpoint,
        region,
        credentials,
    })
}

impl S3Client {
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn bucket(&self, name: &str) -> Result<S3Store, StoreError> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(|e| StoreError::Init(e.to_string()))?
            .with_path_style();
        Ok(S3Store {
            name: name.to_string(),
            bucket,
        })
    }
}

pub struct S3Store {
    name: String,
    bucket: Box<Bucket>,
}

impl ObjectStore for S3Store {
    fn bucket_name(&self) -> &str {
        &self.name
    }

    /// One-key ListObjectsV2 on the bucket itself, so bucket-scoped
    /// credentials are enough. `NoSuchBucket` reads as `false`.
    #[instrument(level = "debug", skip(self), fields(bucket = %self.name))]
    fn bucket_exists(&self) -> Result<bool, StoreError> {
        match self
            .bucket
            .list_page(String::new(), None, None, None, Some(1))
        {
            Ok((_, status)) if status == 404 => Ok(false),
            Ok((_, status)) => check_status(&self.name, status).map(|_| true),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list<'a>(&'a self, prefix: &str) -> Listing<'a> {
        Box::new(PagedListing {
            bucket: &self.bucket,
            prefix: prefix.to_string(),
            pending: VecDeque::new(),
            token: None,
            done: false,
        })
    }

    #[instrument(level = "debug", skip(self, out), fields(bucket = %self.name))]
    fn get_to(&self, key: &str, out: &mut (dyn Write + Send)) -> Result<u64, StoreError> {
        let mut sink = Counted::new(out);
        let status = self
            .bucket
            .get_object_to_writer(key, &mut sink)
            .map_err(|e| classify(key, e))?;
        check_status(key, status)?;
        Ok(sink.written)
    }

    #[instrument(level = "debug", skip(self), fields(bucket = %self.name))]
    fn stat(&self, key: &str) -> Result<ObjectInfo, StoreError> {
        let (head, status) = self.bucket.head_object(key).map_err(|e| classify(key, e))?;
        if status == 404 {
            return Err(StoreError::NotFound(key.to_string()));
        }
        check_status(key, status)?;
        Ok(ObjectInfo {
            key: key.to_string(),
            size: head.content_length.and_then(|len| u64::try_from(len).ok()),
            content_type: head.content_type,
        })
    }

    #[instrument(level = "debug", skip(self, body), fields(bucket = %self.name, len = body.len()))]
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StoreError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, body, content_type)
            .map_err(|e| classify(key, e))?;
        check_status(key, response.status_code())
    }
}

/// With `fail-on-err`, non-2xx answers arrive as errors; a 404 still means
/// the object is missing.
fn classify(key: &str, err: S3Error) -> StoreError {
    match err {
        S3Error::HttpFailWithBody(404, _) => StoreError::NotFound(key.to_string()),
        other => other.into(),
    }
}

/// Forwards writes and counts the bytes.
struct Counted<'a> {
    inner: &'a mut (dyn Write + Send),
    written: u64,
}

impl<'a> Counted<'a> {
    fn new(inner: &'a mut (dyn Write + Send)) -> Self {
        Self { inner, written: 0 }
    }
}

impl Write for Counted<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn check_status(key: &str, status: u16) -> Result<(), StoreError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StoreError::NotFound(key.to_string())),
        _ => Err(StoreError::Status {
            key: key.to_string(),
            status,
        }),
    }
}

/// Walks ListObjectsV2 pages with a `/` delimiter, one page at a time.
struct PagedListing<'a> {
    bucket: &'a Bucket,
    prefix: String,
    pending: VecDeque<String>,
    token: Option<String>,
    done: bool,
}

impl PagedListing<'_> {
    fn fetch_page(&mut self) -> Result<(), StoreError> {
        let (page, status) = self.bucket.list_page(
            self.prefix.clone(),
            Some("/".to_string()),
            self.token.take(),
            None,
            None,
        )?;
        check_status(&self.prefix, status)?;
        trace!(
            prefix = %self.prefix,
            objects = page.contents.len(),
            truncated = page.is_truncated,
            "fetched listing page"
        );

        self.pending
            .extend(page.contents.into_iter().map(|object| object.key));
        self.pending.extend(
            page.common_prefixes
                .unwrap_or_default()
                .into_iter()
                .map(|common| common.prefix),
        );

        self.token = page.next_continuation_token;
        self.done = !page.is_truncated || self.token.is_none();
        Ok(())
    }
}

impl Iterator for PagedListing<'_> {
    type Item = Result<String, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.pending.pop_front() {
                return Some(Ok(key));
            }
            if self.done {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}
