//! operator output and background diagnostics
//!
//! console macros are for use before the tui takes the terminal or after it
//! is restored. while the tui is running, diagnostics go through `trace!`,
//! which appends to the log file (if one was configured) and never touches
//! the terminal.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();

#[derive(Debug, Clone, Copy)]
pub enum Level {
    Info,
    Status,
    Warning,
    Error,
}

pub fn console(level: Level, args: fmt::Arguments) {
    let line = args.to_string();
    let _ = match level {
        Level::Info => writeln!(io::stdout(), "{line}"),
        Level::Status => writeln!(io::stdout(), "{}", line.green()),
        Level::Warning => writeln!(io::stderr(), "{}", line.yellow()),
        Level::Error => writeln!(io::stderr(), "{}", line.red()),
    };
}

/// open the diagnostics log; later calls keep the first file
pub fn init(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let _ = LOG_FILE.set(Mutex::new(file));
    Ok(())
}

pub fn trace(args: fmt::Arguments) {
    let Some(file) = LOG_FILE.get() else { return };
    let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let _ = writeln!(file, "{now} {args}");
}

#[macro_export]
macro_rules! info {
    () => {
        $crate::log::console($crate::log::Level::Info, format_args!(""))
    };
    ($($arg:tt)+) => {
        $crate::log::console($crate::log::Level::Info, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! status {
    ($($arg:tt)+) => {
        $crate::log::console($crate::log::Level::Status, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! warning {
    ($($arg:tt)+) => {
        $crate::log::console($crate::log::Level::Warning, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::log::console($crate::log::Level::Error, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)+) => {
        $crate::log::trace(format_args!($($arg)+))
    };
}
