//! rendering diffs through git and delta, off the ui thread

use crate::changeset::{ChangedFile, StatusCode};
use crate::constants::{DIFF_TOOL, DIFF_TOOL_ARGS};
use crate::git;
use crate::trace;
use regex::Regex;
use std::env;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

#[derive(Debug)]
pub enum DiffError {
    ToolNotFound(&'static str),
    Failed {
        tool: &'static str,
        code: Option<i32>,
        stderr: String,
    },
    TimedOut(&'static str),
    Io(&'static str, io::Error),
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolNotFound(tool) => write!(f, "'{tool}' is not installed or not on PATH"),
            Self::Failed { tool, code, stderr } => {
                match code {
                    Some(code) => write!(f, "{tool} exited with status {code}")?,
                    None => write!(f, "{tool} was terminated by a signal")?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            Self::TimedOut(tool) => write!(f, "{tool} took too long"),
            Self::Io(tool, e) => write!(f, "failed to run {tool}: {e}"),
        }
    }
}

impl std::error::Error for DiffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

/// produces rendered diff text for a changed file
pub trait DiffRenderer: Send + Sync {
    fn render(&self, file: &ChangedFile) -> Result<String, DiffError>;
}

/// `git diff` piped through delta
pub struct DeltaRenderer {
    timeout: Duration,
}

impl DeltaRenderer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// startup check; a missing tool is fatal, unlike per-file failures
    pub fn check_installed() -> Result<PathBuf, DiffError> {
        find_on_path(DIFF_TOOL).ok_or(DiffError::ToolNotFound(DIFF_TOOL))
    }

    fn git_diff(&self, file: &ChangedFile) -> Result<Vec<u8>, DiffError> {
        let root = &file.repo.root;
        let mut cmd = Command::new("git");
        cmd.arg("-C")
            .arg(root)
            .arg("--no-optional-locks")
            .arg("--literal-pathspecs")
            .arg("diff");

        if file.status == StatusCode::Untracked {
            cmd.arg("--no-index")
                .arg("--")
                .arg("/dev/null")
                .arg(root.join(&file.path));
        } else {
            if git::has_head(root) {
                cmd.arg("HEAD");
            } else {
                cmd.arg("--cached");
            }
            cmd.arg("--").arg(&file.path);
        }

        let output = run(&mut cmd, "git", None, self.timeout)?;
        // --no-index exits 1 when the files differ, which is always the case here
        let ok = output.code == Some(0)
            || (file.status == StatusCode::Untracked && output.code == Some(1));
        if !ok {
            return Err(output.into_error("git"));
        }
        Ok(output.stdout)
    }

    fn highlight(&self, raw: Vec<u8>) -> Result<String, DiffError> {
        let mut cmd = Command::new(DIFF_TOOL);
        cmd.args(DIFF_TOOL_ARGS);
        let output = run(&mut cmd, DIFF_TOOL, Some(raw), self.timeout)?;
        if output.code != Some(0) {
            return Err(output.into_error(DIFF_TOOL));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DiffRenderer for DeltaRenderer {
    fn render(&self, file: &ChangedFile) -> Result<String, DiffError> {
        let raw = self.git_diff(file)?;
        if raw.is_empty() {
            return Ok(String::new());
        }
        let highlighted = self.highlight(raw)?;
        Ok(strip_diff_header(&highlighted))
    }
}

struct Output {
    code: Option<i32>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Output {
    fn into_error(self, tool: &'static str) -> DiffError {
        DiffError::Failed {
            tool,
            code: self.code,
            stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
        }
    }
}

/// run a command with optional stdin, killing it after `timeout`
///
/// stdin is written and stdout/stderr drained on their own threads so a full
/// pipe can never stall the child
fn run(
    cmd: &mut Command,
    tool: &'static str,
    input: Option<Vec<u8>>,
    timeout: Duration,
) -> Result<Output, DiffError> {
    let mut child = cmd
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DiffError::ToolNotFound(tool),
            _ => DiffError::Io(tool, e),
        })?;

    let writer = match (child.stdin.take(), input) {
        (Some(mut stdin), Some(input)) => Some(thread::spawn(move || {
            // a broken pipe just means the child stopped reading early
            let _ = stdin.write_all(&input);
        })),
        _ => None,
    };
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DiffError::TimedOut(tool));
        }
        Err(e) => return Err(DiffError::Io(tool, e)),
    };

    if let Some(writer) = writer {
        let _ = writer.join();
    }
    let collect = |handle: Option<thread::JoinHandle<Vec<u8>>>| {
        handle.and_then(|h| h.join().ok()).unwrap_or_default()
    };

    Ok(Output {
        code: status.code(),
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

fn find_on_path(tool: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file() && is_executable::is_executable(candidate))
}

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid ansi regex"));

pub fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    ANSI_ESCAPE.replace_all(s, "")
}

const HEADER_PREFIXES: &[&str] = &[
    "diff --git ",
    "index ",
    "--- ",
    "+++ ",
    "new file mode",
    "deleted file mode",
    "old mode",
    "new mode",
    "similarity index",
    "rename from",
    "rename to",
];

/// drop the git header block (diff --git, index, mode and ---/+++ lines)
/// preceding the first hunk
pub fn strip_diff_header(s: &str) -> String {
    let lines: Vec<&str> = s.split('\n').collect();
    let start = lines
        .iter()
        .position(|line| {
            let plain = strip_ansi(line);
            !(plain.is_empty() || HEADER_PREFIXES.iter().any(|p| plain.starts_with(p)))
        })
        .unwrap_or(lines.len());
    lines[start..].join("\n")
}

/// completion of one diff request
#[derive(Debug)]
pub struct DiffLoaded {
    pub file: ChangedFile,
    pub result: Result<String, DiffError>,
}

/// fire-and-forget diff requests; completions are collected on the ui thread
pub struct DiffBridge {
    renderer: Arc<dyn DiffRenderer>,
    tx: Sender<DiffLoaded>,
    rx: Receiver<DiffLoaded>,
}

impl DiffBridge {
    pub fn new(renderer: Arc<dyn DiffRenderer>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { renderer, tx, rx }
    }

    pub fn request(&self, file: ChangedFile) {
        let renderer = Arc::clone(&self.renderer);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("diffwatch-diff".to_string())
            .spawn(move || {
                let result = renderer.render(&file);
                if let Err(e) = &result {
                    trace!("diff failed for {}: {}", file.path, e);
                }
                // the receiver only goes away on shutdown
                let _ = tx.send(DiffLoaded { file, result });
            });
        if let Err(e) = spawned {
            trace!("failed to start diff thread: {}", e);
        }
    }

    /// completed requests, without blocking
    pub fn completed(&self) -> impl Iterator<Item = DiffLoaded> + '_ {
        self.rx.try_iter()
    }
}
