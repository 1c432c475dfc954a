//! Error types surfaced to the dispatcher.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// Which usage banner accompanies an argument error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Main,
    Files,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("At least one argument is needed")]
    NoArguments(Banner),

    #[error("Expected {expected} argument(s), got {got}")]
    ArgumentCount {
        expected: usize,
        got: usize,
        banner: Banner,
    },

    #[error("Aborting!")]
    Aborted,

    #[error("Configuration does not exist. Run `copycat --profile={0} configure` to create configuration file.")]
    NoConfiguration(String),

    #[error("Environment not found. Use `copycat files list` to view a list of valid environments.")]
    EnvironmentNotFound(String),

    #[error("Invalid environment name '{0}': names must be non-empty, contain no '/' and not start with 'env_'")]
    InvalidEnvironment(String),

    #[error("Could not determine the home directory")]
    NoHome,

    #[error("{context} ({}): {source}", .path.display())]
    Config {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{action} {}: {source}", .path.display())]
    File {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read input: {0}")]
    Prompt(#[source] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Update failed: {0:#}")]
    Update(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Config {
            context,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn file(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::File {
            action,
            path: path.into(),
            source,
        }
    }

    /// Usage banner to print after the message, if any.
    pub fn banner(&self) -> Option<Banner> {
        match self {
            Error::NoArguments(banner) | Error::ArgumentCount { banner, .. } => Some(*banner),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        // Every failure path exits 1; unknown commands and "already latest" are not errors.
        1
    }
}
