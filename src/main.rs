//! git-shadow - shadow history of every save between commits.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use git_shadow::cli::{self, dir_arg, Cli, Commands};
use git_shadow::Error;

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("git_shadow=info".parse().unwrap()))
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("git-shadow: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode, Error> {
    match command {
        Commands::Activate { path, no_hooks } => {
            cli::lifecycle::activate(&dir_arg(path), !no_hooks)?;
        }
        Commands::Deactivate { path } => {
            cli::lifecycle::deactivate(&dir_arg(path))?;
        }
        Commands::Shadow { target, source } => {
            cli::shadow::run(&target, source.as_deref())?;
        }
        Commands::Watch { path } => {
            cli::watch::run(&dir_arg(path))?;
        }
        Commands::Status { path, json } => {
            cli::status::run(&dir_arg(path), json)?;
        }
        Commands::Unpack { commit, dest, path } => {
            cli::unpack::run(&dir_arg(path), &commit, &dest)?;
        }
        Commands::Config { path, write } => {
            cli::config::run(&dir_arg(path), write)?;
        }
        Commands::AddHooks { path } => {
            cli::lifecycle::add_hooks(&dir_arg(path))?;
        }
        Commands::RemoveHooks { path } => {
            cli::lifecycle::remove_hooks(&dir_arg(path))?;
        }
        Commands::PreCommit { path } => {
            cli::lifecycle::pre_commit(&dir_arg(path))?;
        }
        Commands::PostCommit { path } => {
            cli::lifecycle::post_commit(&dir_arg(path))?;
        }
        Commands::PreCheckout { path } => {
            cli::lifecycle::ensure_current(&dir_arg(path), "pre-checkout")?;
        }
        Commands::External(args) => {
            return cli::passthrough::run(&dir_arg(None), &args);
        }
    }

    Ok(ExitCode::SUCCESS)
}
