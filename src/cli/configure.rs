use crate::cli::{failed, step};
use crate::config::Profile;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::store::require_bucket;
use crate::style;

/// Interactive profile setup.
pub fn run(ctx: &mut Context) -> Result<()> {
    println!(
        "Setting up CopyCat profile {}",
        style::info(&ctx.profile)
    );

    step("Checking for configuration directory... ");
    let (created_root, created_dir) = ctx.profiles.ensure_dirs().map_err(failed)?;
    if created_root || created_dir {
        println!("{}", style::ok("CREATED!"));
    } else {
        println!("{}", style::ok("FOUND!"));
    }

    step("Checking for existing configuration... ");
    let (path, exists) = ctx.profiles.exists(&ctx.profile)?;
    if exists {
        println!("{}", style::warn("EXISTS!"));
        if !ctx.confirm(&style::info("Delete existing configuration [Y/n]? "))? {
            return Err(Error::Aborted);
        }
        step(style::warn("Deleting existing configuration... "));
        ctx.profiles.remove(&path).map_err(failed)?;
        println!("{}", style::ok("SUCCESS!"));
    } else {
        println!("{}", style::ok("DOES NOT EXIST!"));
    }

    println!("\nConnection Details:");
    let host = ctx.prompt(&style::info("Hostname (e.g., https://s3.example.com): "))?;
    let key = ctx.prompt(&style::info("KEY: "))?;
    let secret = ctx.prompt(&style::info("SECRET: "))?;
    let bucket = ctx.prompt(&style::info("BUCKET: "))?;
    let profile = Profile::new(&host, &key, &secret, &bucket);

    step("Connecting to host... ");
    let store = ctx.connect(&profile).map_err(failed)?;
    println!("{}", style::ok("DONE!"));

    step(format!("Checking bucket {}... ", bucket));
    require_bucket(store.as_ref()).map_err(failed)?;
    println!("{}", style::ok("DONE!"));

    step("Saving configuration... ");
    ctx.profiles.write(&profile, &path).map_err(failed)?;
    println!("{}", style::ok("DONE!"));

    println!("{}", style::info("Configuration created & saved successfully!"));
    println!(
        "\nRun {} to see a list of available commands!",
        style::ok("copycat help")
    );
    Ok(())
}
