use crate::context::Context;
use crate::error::Result;
use crate::store::{strip_key, ObjectStore, ENV_PREFIX};
use crate::style;

pub fn run(ctx: &Context, print: bool) -> Result<Vec<String>> {
    let store = ctx.store()?;
    Ok(environments(store.as_ref(), print))
}

/// Environment names in the order the store returns them.
///
/// A listing error is printed and ends the walk; whatever was collected so far
/// is returned.
pub fn environments(store: &dyn ObjectStore, print: bool) -> Vec<String> {
    if print {
        println!("{}", style::white("Environments:"));
    }

    let mut envs = Vec::new();
    for result in store.list(ENV_PREFIX) {
        match result {
            Ok(key) => {
                let name = strip_key(&key, ENV_PREFIX).to_string();
                if print {
                    println!("{}", style::teal(&name));
                }
                envs.push(name);
            }
            Err(e) => {
                println!("{}", style::fata(&e.to_string()));
                return envs;
            }
        }
    }

    if print && envs.is_empty() {
        println!("... {}", style::warn("Empty!"));
    }
    envs
}
