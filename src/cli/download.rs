use std::fs::{self, Permissions};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::cli::step;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::store::{env_key, require_bucket, ObjectStore};
use crate::style;

pub const ENV_FILE: &str = ".env";

const LOCAL_FILE_MODE: u32 = 0o644;

/// Fetches `env_<name>` into `./.env`.
///
/// Transfer failures are reported and swallowed; an existing `.env` is only
/// replaced by a complete download.
pub fn run(ctx: &Context, name: &str) -> Result<()> {
    let store = ctx.store()?;
    require_bucket(store.as_ref())?;

    step(style::teal(&format!(
        "Downloading {} environment as {}... ",
        name, ENV_FILE
    )));

    match fetch(store.as_ref(), &env_key(name), &ctx.local_path(ENV_FILE)) {
        Ok(_) => println!("{}", style::ok("DONE!")),
        Err(e) => {
            println!("{}", style::fata("FAILED!"));
            println!("{}", e);
        }
    }
    Ok(())
}

/// Streams object `key` into `dest`.
pub(crate) fn fetch(store: &dyn ObjectStore, key: &str, dest: &Path) -> Result<u64> {
    let staged = Staged::stream(store, key, dest)?;
    let bytes = staged.bytes;
    staged.commit(dest)?;
    Ok(bytes)
}

/// An object body streamed into a temporary file beside its destination.
/// Dropping it without [`Staged::commit`] leaves the destination untouched.
pub(crate) struct Staged {
    file: NamedTempFile,
    pub bytes: u64,
}

impl Staged {
    pub(crate) fn stream(store: &dyn ObjectStore, key: &str, dest: &Path) -> Result<Self> {
        let dir = match dest.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut file = tempfile::Builder::new()
            .prefix(".copycat-")
            .tempfile_in(dir)
            .map_err(|e| Error::file("Failed to create", dir, e))?;

        let bytes = store.get_to(key, file.as_file_mut())?;
        debug!(key, bytes, staged = %file.path().display(), "streamed object");
        Ok(Self { file, bytes })
    }

    pub(crate) fn commit(self, dest: &Path) -> Result<()> {
        fs::set_permissions(self.file.path(), Permissions::from_mode(LOCAL_FILE_MODE))
            .map_err(|e| Error::file("Failed to write", dest, e))?;
        self.file
            .persist(dest)
            .map_err(|e| Error::file("Failed to write", dest, e.error))?;
        Ok(())
    }
}
