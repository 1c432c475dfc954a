//! Per-invocation state threaded through every command.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{Profile, ProfileStore};
use crate::error::{Error, Result};
use crate::store::{Connector, ObjectStore, S3Connector};

pub struct Context {
    /// Active profile name, from `--profile` or `default`
    pub profile: String,
    pub profiles: ProfileStore,
    /// Where `.env` is read from and downloads are written to
    pub workdir: PathBuf,
    input: Box<dyn BufRead>,
    connector: Box<dyn Connector>,
}

impl Context {
    pub fn new(
        profile: &str,
        profiles: ProfileStore,
        workdir: impl Into<PathBuf>,
        input: Box<dyn BufRead>,
        connector: Box<dyn Connector>,
    ) -> Self {
        Self {
            profile: profile.to_string(),
            profiles,
            workdir: workdir.into(),
            input,
            connector,
        }
    }

    /// Real home directory, current directory, stdin and S3.
    pub fn for_user(profile: &str) -> Result<Self> {
        let profiles = ProfileStore::for_user()?;
        Ok(Self::new(
            profile,
            profiles,
            ".",
            Box::new(io::BufReader::new(io::stdin())),
            Box::new(S3Connector),
        ))
    }

    pub fn profile_path(&self) -> PathBuf {
        self.profiles.path(&self.profile)
    }

    pub fn local_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.workdir.join(name)
    }

    /// Loads the active profile and connects to its bucket.
    pub fn store(&self) -> Result<Box<dyn ObjectStore>> {
        let profile = self.profiles.load_named(&self.profile)?;
        debug!(profile = %self.profile, bucket = %profile.bucket, "connecting");
        self.connect(&profile)
    }

    pub fn connect(&self, profile: &Profile) -> Result<Box<dyn ObjectStore>> {
        Ok(self.connector.connect(profile)?)
    }

    pub fn prompt(&mut self, message: &str) -> Result<String> {
        prompt_line(self.input.as_mut(), message)
    }

    /// True only for an explicit `Y` or `y`.
    pub fn confirm(&mut self, message: &str) -> Result<bool> {
        let answer = self.prompt(message)?;
        Ok(is_yes(&answer))
    }
}

/// Prints `message` and reads one line, without its line ending.
pub fn prompt_line(input: &mut dyn BufRead, message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush().map_err(Error::Prompt)?;

    let mut line = String::new();
    input.read_line(&mut line).map_err(Error::Prompt)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "Y" | "y")
}

pub fn is_no(answer: &str) -> bool {
    matches!(answer.trim(), "N" | "n")
}
