mod cli;
mod config;
mod context;
mod error;
mod store;
mod style;
mod update;

use std::io;
use std::process;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::{help, Cli, Command};
use context::Context;
use error::{Banner, Result};

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.debug);

    if let Err(e) = run(&cli) {
        match e.banner() {
            Some(banner) => {
                println!("{}", style::warn(&e.to_string()));
                help::print(banner);
            }
            None => eprintln!("{}", style::fata(&e.to_string())),
        }
        process::exit(e.exit_code());
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let command = Command::parse(&cli.args)?;
    tracing::debug!(?command, profile = %cli.profile, "dispatch");

    match command {
        Command::Help => help::print(Banner::Main),
        Command::Version => println!("{}", style::ok(update::VERSION)),
        Command::VersionClean => println!("{}", update::VERSION),
        Command::Unknown(_) => {
            println!("{}", style::warn("Not a valid option."));
            help::print(Banner::Main);
        }
        Command::Update => cli::update::run(&mut io::stdin().lock())?,
        Command::Configure => cli::configure::run(&mut Context::for_user(&cli.profile)?)?,
        Command::Reset => cli::reset::run(&mut Context::for_user(&cli.profile)?)?,
        Command::List => {
            cli::list::run(&Context::for_user(&cli.profile)?, true)?;
        }
        Command::Download(name) => cli::download::run(&Context::for_user(&cli.profile)?, &name)?,
        Command::Upload(name) => cli::upload::run(&Context::for_user(&cli.profile)?, &name)?,
        Command::Files(args) => cli::files::run(&Context::for_user(&cli.profile)?, &args)?,
    }
    Ok(())
}
