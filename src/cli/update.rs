use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::{failed, step};
use crate::context::{is_yes, prompt_line};
use crate::error::{Error, Result};
use crate::style;
use crate::update::{self, Check, Fetch, HttpFetcher, Release, VERSION};

const BINARY_NAME: &str = "copycat";

pub fn run(input: &mut dyn BufRead) -> Result<()> {
    let release = Release::from_env()?;
    execute(input, &HttpFetcher, VERSION, &release, || {
        std::env::current_exe()
    })
}

/// The update flow with its collaborators passed in. `locate` is only
/// consulted once a newer version is known to exist.
pub fn execute<F>(
    input: &mut dyn BufRead,
    fetcher: &dyn Fetch,
    current: &str,
    release: &Release,
    locate: F,
) -> Result<()>
where
    F: FnOnce() -> io::Result<PathBuf>,
{
    step("Checking if update exists... ");
    let latest = match update::check(fetcher, release, current).map_err(failed)? {
        Check::UpToDate(latest) => {
            println!("{}", style::ok("NONE!"));
            println!("You are running the latest version ({}).", style::info(&latest));
            return Ok(());
        }
        Check::Available(latest) => latest,
    };
    println!(
        "{} {} -> {}",
        style::ok("FOUND!"),
        style::warn(current),
        style::ok(&latest)
    );

    let exe = locate().context("Failed to locate the running executable")?;
    let dir = install_dir(&exe)?;

    let question = format!(
        "Confirm installation directory ({}) [Y/n]: ",
        dir.display()
    );
    if !is_yes(&prompt_line(input, &style::info(&question))?) {
        return Err(Error::Aborted);
    }

    let url = release.asset_url();
    step(format!("Downloading {}... ", url));
    let written = update::install(fetcher, &url, &dir.join(BINARY_NAME)).map_err(failed)?;
    println!("{}", style::ok("DONE!"));

    println!("Wrote {} bytes", written);
    println!("{}", style::ok(&format!("Updated CopyCat to {}", latest)));
    Ok(())
}

fn install_dir(exe: &Path) -> Result<PathBuf> {
    let exe = exe.canonicalize().unwrap_or_else(|_| exe.to_path_buf());
    let dir = exe
        .parent()
        .with_context(|| format!("{} has no parent directory", exe.display()))?;
    Ok(dir.to_path_buf())
}
