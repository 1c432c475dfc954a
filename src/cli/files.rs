//! `copycat files ...`: files attached to an environment.

use crate::cli::download::Staged;
use crate::cli::upload::put_file;
use crate::cli::{failed, help, list, require_args, step};
use crate::context::Context;
use crate::error::{Banner, Error, Result};
use crate::store::{require_bucket, strip_key, upload_key, uploads_prefix, ObjectStore};
use crate::style;

pub fn run(ctx: &Context, args: &[String]) -> Result<()> {
    let Some(first) = args.first() else {
        return Err(Error::NoArguments(Banner::Files));
    };

    match first.as_str() {
        "list" => {
            list::run(ctx, true)?;
        }
        "help" => help::print(Banner::Files),
        env => {
            let store = ctx.store()?;
            if !list::environments(store.as_ref(), false).iter().any(|e| e == env) {
                return Err(Error::EnvironmentNotFound(env.to_string()));
            }
            handle_env(ctx, store.as_ref(), env, &args[1..])?;
        }
    }
    Ok(())
}

fn handle_env(ctx: &Context, store: &dyn ObjectStore, env: &str, options: &[String]) -> Result<()> {
    let Some(action) = options.first() else {
        return Err(Error::NoArguments(Banner::Files));
    };
    let rest = &options[1..];

    match action.as_str() {
        "list" => {
            list_files(store, env);
        }
        "upload" => {
            require_args(rest, 1, false, Banner::Files)?;
            upload(ctx, store, env, rest)?;
        }
        "download" => {
            require_args(rest, 1, false, Banner::Files)?;
            download(ctx, store, env, rest)?;
        }
        _ => {
            println!("{}", style::warn("Not a valid option."));
            help::print(Banner::Files);
        }
    }
    Ok(())
}

/// File names in `env`, prefix stripped, in store order.
pub fn list_files(store: &dyn ObjectStore, env: &str) -> Vec<String> {
    let prefix = uploads_prefix(env);
    println!("{}", style::white(&format!("{} files:", env)));

    let mut names = Vec::new();
    for result in store.list(&prefix) {
        match result {
            Ok(key) => {
                let name = strip_key(&key, &prefix).to_string();
                println!("{}", style::teal(&name));
                names.push(name);
            }
            Err(e) => {
                println!("{}", style::fata(&e.to_string()));
                return names;
            }
        }
    }

    if names.is_empty() {
        println!("... {}", style::warn("Empty!"));
    }
    names
}

/// `args[0]` is the local file, `args[1]` an optional remote name.
fn upload(ctx: &Context, store: &dyn ObjectStore, env: &str, args: &[String]) -> Result<()> {
    require_bucket(store)?;

    let local = &args[0];
    let remote = args.get(1).unwrap_or(local);

    step(style::teal(&format!(
        "Uploading {} as {} under environment {}... ",
        local, remote, env
    )));
    put_file(store, &ctx.local_path(local), &upload_key(env, remote)).map_err(failed)?;
    println!("{}", style::ok("DONE!"));
    Ok(())
}

/// `args[0]` is the remote file, `args[1]` an optional local name.
///
/// Nothing is written locally unless the object could be fetched and stat'ed.
fn download(ctx: &Context, store: &dyn ObjectStore, env: &str, args: &[String]) -> Result<()> {
    require_bucket(store)?;

    let remote = &args[0];
    let local = args.get(1).unwrap_or(remote);
    let key = upload_key(env, remote);
    let dest = ctx.local_path(local);

    step(style::teal(&format!(
        "Downloading {} from environment {} as {}... ",
        remote, env, local
    )));

    let fetched = Staged::stream(store, &key, &dest)
        .and_then(|staged| {
            store.stat(&key)?;
            Ok(staged)
        })
        .and_then(|staged| staged.commit(&dest));
    match fetched {
        Ok(()) => println!("{}", style::ok("DONE!")),
        Err(e) => {
            println!("{}", style::fata("FAILED!"));
            println!("{}", e);
        }
    }
    Ok(())
}
