//! Self-update: version check and in-place binary replacement.
//!
//! `VERSION_LOG` points at a small text file holding the latest tag (e.g.
//! `v1.6.0`); `VERSION_HOST` is the prefix under which release binaries are
//! published as `copycat-<os>-<arch>`. Both may be baked in at build time and
//! overridden from the environment.

use std::fs::{self, Permissions};
use std::io::{self, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

/// Version of the running binary.
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

const BINARY_MODE: u32 = 0o755;

/// Where to look for releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub log_url: String,
    pub host: String,
}

impl Release {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_url: setting("VERSION_LOG", option_env!("VERSION_LOG"))?,
            host: setting("VERSION_HOST", option_env!("VERSION_HOST"))?,
        })
    }

    /// `<host>copycat-<os>-<arch>` for the current platform.
    pub fn asset_url(&self) -> String {
        let (os, arch) = platform();
        format!("{}copycat-{}-{}", self.host, os, arch)
    }
}

fn setting(name: &str, baked: Option<&str>) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| baked.map(String::from))
        .with_context(|| format!("{} is not set", name))
}

/// OS and architecture names as used in release asset names.
pub fn platform() -> (&'static str, &'static str) {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    };
    (os, arch)
}

/// Source of HTTP bodies.
pub trait Fetch {
    fn get(&self, url: &str) -> Result<Box<dyn Read>>;
}

/// Plain blocking GET.
pub struct HttpFetcher;

impl Fetch for HttpFetcher {
    fn get(&self, url: &str) -> Result<Box<dyn Read>> {
        debug!(url, "GET");
        let response = reqwest::blocking::get(url)
            .with_context(|| format!("Failed to fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("Failed to fetch {}", url))?;
        Ok(Box::new(response))
    }
}

/// Extracts the tag from a version file: must start with `v`, trailing
/// whitespace is dropped.
pub fn parse_version(body: &[u8]) -> Result<String> {
    if body.first() != Some(&b'v') {
        bail!("version file not fetched properly");
    }
    let text = std::str::from_utf8(body).context("version file is not UTF-8")?;
    Ok(text.trim_end().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    UpToDate(String),
    Available(String),
}

pub fn check(fetcher: &dyn Fetch, release: &Release, current: &str) -> Result<Check> {
    let mut body = Vec::new();
    fetcher
        .get(&release.log_url)?
        .read_to_end(&mut body)
        .context("Failed to read version file")?;

    let latest = parse_version(&body)?;
    debug!(current, latest = %latest, "version check");
    if latest == current {
        Ok(Check::UpToDate(latest))
    } else {
        Ok(Check::Available(latest))
    }
}

/// Streams `url` into a temporary file beside `target`, marks it executable
/// and renames it over `target`. The target is untouched unless the whole
/// download succeeds.
pub fn install(fetcher: &dyn Fetch, url: &str, target: &Path) -> Result<u64> {
    let dir = target
        .parent()
        .with_context(|| format!("{} has no parent directory", target.display()))?;

    let mut staged = tempfile::Builder::new()
        .prefix(".copycat-update-")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let mut body = fetcher.get(url)?;
    let written = io::copy(&mut body, staged.as_file_mut()).context("Failed to download binary")?;
    if written == 0 {
        bail!("downloaded binary from {} is empty", url);
    }
    staged
        .as_file()
        .sync_all()
        .context("Failed to flush downloaded binary")?;
    fs::set_permissions(staged.path(), Permissions::from_mode(BINARY_MODE))
        .context("Failed to mark binary executable")?;

    staged
        .persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", target.display()))?;

    info!(target = %target.display(), bytes = written, "installed update");
    Ok(written)
}
