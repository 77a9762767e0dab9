use clap::Parser;
use std::path::PathBuf;

/// diffwatch: watch git repositories and browse uncommitted changes
#[derive(Parser, Debug)]
#[command(name = "diffwatch", about, long_about = None)]
pub struct Cli {
    /// directories to scan for repositories, or the name of a saved profile
    #[arg(value_name = "PATHS_OR_PROFILE")]
    pub paths: Vec<String>,

    /// save the given paths as a named profile
    #[arg(long, value_name = "NAME", conflicts_with_all = ["list", "delete"])]
    pub save: Option<String>,

    /// list saved profiles
    #[arg(long, conflicts_with = "delete")]
    pub list: bool,

    /// delete a saved profile
    #[arg(long, value_name = "NAME")]
    pub delete: Option<String>,

    /// append diagnostics to this file
    #[arg(long, value_name = "FILE", env = "DIFFWATCH_LOG")]
    pub log: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
