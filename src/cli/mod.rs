pub mod configure;
pub mod download;
pub mod files;
pub mod help;
pub mod list;
pub mod reset;
pub mod update;
pub mod upload;

use std::fmt::Display;
use std::io::Write;

use clap::{ArgAction, Parser};

use crate::config::DEFAULT_PROFILE;
use crate::error::{Banner, Error, Result};
use crate::style;

#[derive(Parser, Debug)]
#[command(name = "copycat")]
#[command(
    author,
    about = "🐱 CopyCat - .env environments in any S3-compatible bucket",
    disable_version_flag = true
)]
#[command(long_about = r#"
CopyCat uploads a project's .env file under a name, creating an "environment",
and lets you attach further files to that environment. Everything lives in an
S3-compatible bucket (Amazon S3, MinIO, Cloudflare R2, ...).

QUICK START:
  copycat configure                          # Set up the default profile
  copycat upload staging                     # Upload ./.env as "staging"
  copycat download staging                   # Fetch it back into ./.env
  copycat files staging upload key.pem       # Attach a file

Run `copycat help` for every command.
"#)]
pub struct Cli {
    /// Profile to use
    #[arg(long, env = "COPYCAT_PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Command followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// A routed top-level command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Configure,
    List,
    Download(String),
    Upload(String),
    Files(Vec<String>),
    Help,
    Version,
    VersionClean,
    Update,
    Reset,
    Unknown(String),
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some(first) = args.first() else {
            return Err(Error::NoArguments(Banner::Main));
        };

        let command = match first.as_str() {
            "configure" => Command::Configure,
            "list" => Command::List,
            "download" => {
                require_args(args, 2, true, Banner::Main)?;
                Command::Download(args[1].clone())
            }
            "upload" => {
                require_args(args, 2, true, Banner::Main)?;
                Command::Upload(args[1].clone())
            }
            "files" => Command::Files(args[1..].to_vec()),
            "help" => Command::Help,
            "version" | "-v" | "--version" => Command::Version,
            "version-clean" => Command::VersionClean,
            "update" => Command::Update,
            "reset" => Command::Reset,
            other => Command::Unknown(other.to_string()),
        };
        Ok(command)
    }
}

/// Fails unless `args` has exactly (`strict`) or at least `count` entries.
pub fn require_args(args: &[String], count: usize, strict: bool, banner: Banner) -> Result<()> {
    let got = args.len();
    if (strict && got != count) || (!strict && got < count) {
        return Err(Error::ArgumentCount {
            expected: count,
            got,
            banner,
        });
    }
    Ok(())
}

/// Prints a progress step, leaving the line open for its outcome.
pub(crate) fn step(message: impl Display) {
    print!("{}", message);
    std::io::stdout().flush().ok();
}

/// Marks the open step as failed and hands the error back.
pub(crate) fn failed<E>(err: E) -> E {
    println!("{}", style::fata("FAILED!"));
    err
}
