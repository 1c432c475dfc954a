use crate::error::Banner;
use crate::style;

pub fn print(banner: Banner) {
    match banner {
        Banner::Main => main(),
        Banner::Files => files(),
    }
}

fn main() {
    println!("{}", style::white("CopyCat Client\n"));
    println!("Usage:");
    println!("\tcopycat [--profile=<name>] <command>");
    println!();
    println!("Commands:");
    println!("\tcopycat help");
    println!("\tcopycat configure");
    println!("\tcopycat list");
    println!("\tcopycat download <environment>");
    println!("\tcopycat upload <environment>");
    println!("\tcopycat files help");
    println!("\tcopycat version | version-clean");
    println!("\tcopycat update");
    println!("\tcopycat reset");
    println!();
    println!(
        "{}",
        style::warn("Note: the [Y/n] prompts of configure and update need an explicit Y or y; an empty answer aborts.")
    );
}

fn files() {
    println!("{}", style::teal("CopyCat File System"));
    println!("\tcopycat files help");
    println!("\tcopycat files list");
    println!("\tcopycat files <environment> list");
    println!("\tcopycat files <environment> upload <file name> [upload name]");
    println!("\tcopycat files <environment> download <file name> [download name]");
}
