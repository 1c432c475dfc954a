use crate::context::{is_no, Context};
use crate::error::{Error, Result};
use crate::style;

/// Deletes the active profile after confirmation. Only `N`/`n` aborts.
pub fn run(ctx: &mut Context) -> Result<()> {
    let (path, exists) = ctx.profiles.exists(&ctx.profile)?;
    if !exists {
        return Err(Error::NoConfiguration(ctx.profile.clone()));
    }

    let question = format!("Delete configuration for profile {} [Y/n]? ", ctx.profile);
    let answer = ctx.prompt(&style::warn(&question))?;
    if is_no(&answer) {
        return Err(Error::Aborted);
    }

    ctx.profiles.remove(&path)?;
    println!(
        "{} {}",
        style::ok("Deleted configuration"),
        path.display()
    );
    Ok(())
}
