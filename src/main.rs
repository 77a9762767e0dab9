mod ansi;
mod app;
mod changeset;
mod cli;
mod config;
mod constants;
mod diff;
mod diffview;
mod git;
mod log;
mod render;
mod repo;
mod tree;
mod tui;
mod watcher;

use crate::cli::Cli;
use crate::config::Config;
use crate::diff::DeltaRenderer;
use crate::repo::Registry;
use anyhow::{Result, bail};
use std::io::IsTerminal;
use std::path::PathBuf;

fn main() {
    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();

    if let Some(path) = &cli.log {
        log::init(path)?;
    }
    trace!("diffwatch starting");

    // profile management never needs the diff tool or a terminal
    if cli.list || cli.save.is_some() || cli.delete.is_some() {
        return manage_profiles(&cli);
    }

    // sanity checks
    if let Err(e) = DeltaRenderer::check_installed() {
        trace!("{}", e);
        bail!(
            "'delta' is not installed or not on PATH\n\
             install it from https://github.com/dandavison/delta (e.g. `brew install git-delta` or `cargo install git-delta`)"
        );
    }
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        bail!("interactive terminal required");
    }

    let mut repos = Vec::new();
    for path in watch_paths(&cli.paths)? {
        match git::discover(&path) {
            Ok(found) => repos.extend(found),
            Err(e) => warning!("skipping {}: {:#}", path.display(), e),
        }
    }

    let registry = Registry::new(repos);
    if registry.is_empty() {
        bail!("no git repositories found in the specified paths");
    }
    for repo in registry.iter() {
        trace!("watching {} ({})", repo.name, repo.scope.display());
    }

    status!("found {} repo(s), starting diffwatch...", registry.len());
    tui::run(registry)
}

/// a lone argument naming a saved profile expands to its paths
fn watch_paths(args: &[String]) -> Result<Vec<PathBuf>> {
    if let [name] = args {
        let config = Config::load(&config::config_path()?)?;
        if let Some(paths) = config.resolve(name, dirs::home_dir().as_deref()) {
            status!("using profile '{}'", name);
            return Ok(paths);
        }
    }
    if args.is_empty() {
        return Ok(vec![PathBuf::from(".")]);
    }
    Ok(args.iter().map(PathBuf::from).collect())
}

fn manage_profiles(cli: &Cli) -> Result<()> {
    let path = config::config_path()?;
    let mut config = Config::load(&path)?;

    if cli.list {
        if config.profiles.is_empty() {
            info!("no saved profiles");
        }
        for (name, paths) in &config.profiles {
            info!("{}: {}", name, paths.join(", "));
        }
        return Ok(());
    }

    if let Some(name) = &cli.delete {
        config.remove_profile(name)?;
        config.save(&path)?;
        status!("deleted profile '{}'", name);
        return Ok(());
    }

    if let Some(name) = &cli.save {
        let paths: Vec<PathBuf> = if cli.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            cli.paths.iter().map(PathBuf::from).collect()
        };
        let stored = config
            .set_profile(name, &paths, dirs::home_dir().as_deref())?
            .join(", ");
        config.save(&path)?;
        status!("saved profile '{}': {}", name, stored);
    }

    Ok(())
}
