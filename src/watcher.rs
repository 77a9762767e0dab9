//! background change detection
//!
//! one thread samples every tracked scope on a fixed interval, fingerprints
//! the result and only emits a notification when the fingerprint for that
//! scope differs from the previous sample.

use crate::changeset::{ChangedFile, fingerprint};
use crate::constants::{ENQUEUE_RETRY_MS, NOTIFY_QUEUE_CAPACITY};
use crate::git;
use crate::repo::{Registry, TrackedRepo};
use crate::trace;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// the changed files of one tracked scope after a detected transition
#[derive(Debug, Clone)]
pub struct FilesChanged {
    pub repo: Arc<TrackedRepo>,
    pub files: Vec<ChangedFile>,
    /// taken just before the status query ran
    pub sampled_at: Instant,
}

/// queries the current changed files of a tracked scope
pub trait StatusSource: Send + Sync {
    fn changed_files(&self, repo: &Arc<TrackedRepo>) -> Result<Vec<ChangedFile>>;
}

/// status source backed by libgit2
pub struct GitStatus;

impl StatusSource for GitStatus {
    fn changed_files(&self, repo: &Arc<TrackedRepo>) -> Result<Vec<ChangedFile>> {
        git::changed_files(repo)
            .with_context(|| format!("status query failed for {}", repo.scope.display()))
    }
}

/// process-wide shutdown broadcast; triggering more than once is harmless
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        let (flag, cvar) = &*self.inner;
        let mut fired = flag.lock().unwrap_or_else(PoisonError::into_inner);
        if !*fired {
            *fired = true;
            cvar.notify_all();
        }
    }

    pub fn is_triggered(&self) -> bool {
        let (flag, _) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// sleep for up to `timeout`, waking early on shutdown
    /// returns true if shutdown has fired
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let fired = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (fired, _) = cvar
            .wait_timeout_while(fired, timeout, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
        *fired
    }
}

/// the polling loop state, owned by the background thread
struct Poller {
    registry: Registry,
    source: Arc<dyn StatusSource>,
    fingerprints: HashMap<PathBuf, String>, // keyed by watch scope
    tx: SyncSender<FilesChanged>,
    shutdown: Shutdown,
}

impl Poller {
    fn run(mut self, interval: Duration) {
        trace!("watcher started for {} repo(s)", self.registry.len());
        loop {
            if !self.tick() || self.shutdown.wait_timeout(interval) {
                break;
            }
        }
        trace!("watcher stopped");
    }

    /// sample every repository once, in registry order
    /// returns false if shutdown interrupted the pass
    fn tick(&mut self) -> bool {
        let repos: Vec<Arc<TrackedRepo>> = self.registry.iter().cloned().collect();
        for repo in repos {
            if self.shutdown.is_triggered() {
                return false;
            }

            let sampled_at = Instant::now();
            let files = match self.source.changed_files(&repo) {
                Ok(files) => files,
                Err(e) => {
                    // leave this scope's state untouched until the next tick
                    trace!("{:#}", e);
                    continue;
                }
            };

            let current = fingerprint(&files);
            let previous = self.fingerprints.get(&repo.scope).map_or("", String::as_str);
            if current == previous {
                continue;
            }

            self.fingerprints.insert(repo.scope.clone(), current);
            let changed = FilesChanged {
                repo,
                files,
                sampled_at,
            };
            if !self.send(changed) {
                return false;
            }
        }
        true
    }

    /// blocking enqueue, bounded only by shutdown; notifications are never dropped
    fn send(&self, mut msg: FilesChanged) -> bool {
        let retry = Duration::from_millis(ENQUEUE_RETRY_MS);
        loop {
            match self.tx.try_send(msg) {
                Ok(()) => return true,
                Err(TrySendError::Full(pending)) => {
                    if self.shutdown.wait_timeout(retry) {
                        return false;
                    }
                    msg = pending;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// result of waiting for the next notification
#[derive(Debug)]
pub enum Wait {
    Changed(FilesChanged),
    Pending,
    Closed,
}

/// consumer handle for the background poller
pub struct Watcher {
    rx: Receiver<FilesChanged>,
    shutdown: Shutdown,
    handle: Option<JoinHandle<()>>,
}

impl Watcher {
    pub fn spawn(
        registry: Registry,
        source: Arc<dyn StatusSource>,
        interval: Duration,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel(NOTIFY_QUEUE_CAPACITY);
        let poller = Poller {
            registry,
            source,
            fingerprints: HashMap::new(),
            tx,
            shutdown: shutdown.clone(),
        };

        let handle = thread::Builder::new()
            .name("diffwatch-poller".to_string())
            .spawn(move || poller.run(interval))
            .context("failed to start watcher thread")?;

        Ok(Self {
            rx,
            shutdown,
            handle: Some(handle),
        })
    }

    /// wait up to `timeout` for exactly one notification
    /// a zero timeout checks without blocking
    pub fn wait_for_change(&self, timeout: Duration) -> Wait {
        if self.shutdown.is_triggered() {
            return Wait::Closed;
        }
        let received = if timeout.is_zero() {
            self.rx.try_recv().map_err(|e| match e {
                TryRecvError::Empty => RecvTimeoutError::Timeout,
                TryRecvError::Disconnected => RecvTimeoutError::Disconnected,
            })
        } else {
            self.rx.recv_timeout(timeout)
        };
        match received {
            Ok(msg) => Wait::Changed(msg),
            Err(RecvTimeoutError::Timeout) => Wait::Pending,
            Err(RecvTimeoutError::Disconnected) => Wait::Closed,
        }
    }

    /// stop polling and wait for the thread to finish
    pub fn close(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            trace!("watcher thread panicked");
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.close();
    }
}
