use std::fs;
use std::path::Path;

use tracing::info;

use crate::cli::download::ENV_FILE;
use crate::cli::{failed, step};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::store::{env_key, is_valid_environment, require_bucket, ObjectStore};
use crate::style;

pub const CONTENT_TYPE: &str = "text/plain";

/// Uploads `./.env` as environment `name`. Any failure is fatal.
pub fn run(ctx: &Context, name: &str) -> Result<()> {
    if !is_valid_environment(name) {
        return Err(Error::InvalidEnvironment(name.to_string()));
    }

    let store = ctx.store()?;
    require_bucket(store.as_ref())?;

    step(style::teal(&format!("Uploading {} with key {}... ", ENV_FILE, name)));
    put_file(store.as_ref(), &ctx.local_path(ENV_FILE), &env_key(name)).map_err(failed)?;
    println!("{}", style::ok("DONE!"));
    Ok(())
}

/// Reads `path` and stores it under `key`.
pub(crate) fn put_file(store: &dyn ObjectStore, path: &Path, key: &str) -> Result<usize> {
    let body = fs::read(path).map_err(|e| Error::file("Failed to read", path, e))?;
    store.put(key, &body, CONTENT_TYPE)?;
    info!(key, bytes = body.len(), "uploaded");
    Ok(body.len())
}
