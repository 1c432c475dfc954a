//! Profile storage for CopyCat
//!
//! Each profile lives in `~/.config/copycat/<name>` as four `KEY=value` lines
//! (HOSTNAME, KEY, SECRET, BUCKET).

use std::fs::{self, DirBuilder, OpenOptions, Permissions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

pub const DEFAULT_PROFILE: &str = "default";

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// Connection details for one object store.
#[derive(Debug, Clone)]
pub struct Profile {
    /// Absolute URL including `http://` or `https://`
    pub host: String,
    pub key: String,
    pub secret: SecretString,
    pub bucket: String,
}

impl Profile {
    pub fn new(host: &str, key: &str, secret: &str, bucket: &str) -> Self {
        Self {
            host: host.to_string(),
            key: key.to_string(),
            secret: SecretString::new(secret.to_string()),
            bucket: bucket.to_string(),
        }
    }

    /// Parses `KEY=VALUE` lines, splitting on the first `=`.
    /// Unknown keys are ignored; missing ones stay empty.
    pub fn parse(contents: &str) -> Self {
        let mut profile = Profile::new("", "", "", "");
        for line in contents.lines().filter(|l| !l.is_empty()) {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "HOSTNAME" => profile.host = value.to_string(),
                "KEY" => profile.key = value.to_string(),
                "SECRET" => profile.secret = SecretString::new(value.to_string()),
                "BUCKET" => profile.bucket = value.to_string(),
                _ => {}
            }
        }
        profile
    }

    pub fn render(&self) -> String {
        format!(
            "HOSTNAME={}\nKEY={}\nSECRET={}\nBUCKET={}\n",
            self.host,
            self.key,
            self.secret.expose_secret(),
            self.bucket
        )
    }
}

/// The per-user profile directory, `<home>/.config/copycat`.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    home: PathBuf,
}

impl ProfileStore {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Uses the current user's home directory.
    pub fn for_user() -> Result<Self> {
        let home = dirs::home_dir().ok_or(Error::NoHome)?;
        Ok(Self::new(home))
    }

    pub fn config_root(&self) -> PathBuf {
        self.home.join(".config")
    }

    pub fn dir(&self) -> PathBuf {
        self.config_root().join("copycat")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir().join(name)
    }

    /// Returns the profile path and whether a file exists there.
    pub fn exists(&self, name: &str) -> Result<(PathBuf, bool)> {
        let path = self.path(name);
        let found = path
            .try_exists()
            .map_err(|e| Error::config("Failed to check configuration", &path, e))?;
        Ok((path, found))
    }

    /// Creates `~/.config` and `~/.config/copycat` as needed, both `0755`.
    /// Reports whether each was created.
    pub fn ensure_dirs(&self) -> Result<(bool, bool)> {
        let root = ensure_dir(&self.config_root())?;
        let dir = ensure_dir(&self.dir())?;
        Ok((root, dir))
    }

    #[instrument(level = "debug", skip(self, profile), fields(path = %path.display()))]
    pub fn write(&self, profile: &Profile, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(FILE_MODE)
            .open(path)
            .map_err(|e| Error::config("Failed to create profile", path, e))?;
        file.write_all(profile.render().as_bytes())
            .map_err(|e| Error::config("Failed to write profile", path, e))?;
        fs::set_permissions(path, Permissions::from_mode(FILE_MODE))
            .map_err(|e| Error::config("Failed to set profile permissions", path, e))?;
        Ok(())
    }

    pub fn load(&self, path: &Path) -> Result<Profile> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::config("Failed to read profile", path, e))?;
        debug!(path = %path.display(), "loaded profile");
        Ok(Profile::parse(&contents))
    }

    /// Loads the named profile, failing with a user error when it is absent.
    pub fn load_named(&self, name: &str) -> Result<Profile> {
        match self.exists(name)? {
            (path, true) => self.load(&path),
            (_, false) => Err(Error::NoConfiguration(name.to_string())),
        }
    }

    pub fn remove(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| Error::config("Failed to delete profile", path, e))
    }
}

/// Umask can strip bits at creation, so the mode is applied again afterwards.
fn ensure_dir(path: &Path) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    DirBuilder::new()
        .mode(DIR_MODE)
        .create(path)
        .map_err(|e| Error::config("Failed to create directory", path, e))?;
    fs::set_permissions(path, Permissions::from_mode(DIR_MODE))
        .map_err(|e| Error::config("Failed to set directory permissions", path, e))?;
    debug!(path = %path.display(), "created directory");
    Ok(true)
}
