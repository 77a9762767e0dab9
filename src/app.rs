//! the coordinator: sole owner and mutator of the displayed state
//!
//! every change arrives as a `Message` (or a key press) and is handled to
//! completion before the next one. handling never blocks; anything slow is
//! returned as an `Effect` for the event loop to carry out.

use crate::changeset::{ChangedFile, fingerprint};
use crate::diff::DiffLoaded;
use crate::diffview::DiffView;
use crate::repo::Registry;
use crate::trace;
use crate::tree::{FileTree, Row};
use crate::watcher::{FilesChanged, StatusSource};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug)]
pub enum Message {
    FilesChanged(FilesChanged),
    Select(ChangedFile),
    DiffLoaded(DiffLoaded),
}

/// work requested by the coordinator
#[derive(Debug)]
pub enum Effect {
    LoadDiff(ChangedFile),
    /// listen for the next change notification
    WaitForChange,
    Refresh,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Diff,
}

pub struct App {
    tree: FileTree,
    selected: Option<ChangedFile>,
    diff: DiffView,
    focus: Focus,
    repo_count: usize,
    /// when the displayed files of each watch scope were sampled
    sampled: HashMap<PathBuf, Instant>,
}

impl App {
    pub fn new(repo_count: usize) -> Self {
        Self {
            tree: FileTree::new(),
            selected: None,
            diff: DiffView::new(),
            focus: Focus::Tree,
            repo_count,
            sampled: HashMap::new(),
        }
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn diff(&self) -> &DiffView {
        &self.diff
    }

    pub fn selected(&self) -> Option<&ChangedFile> {
        self.selected.as_ref()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn repo_count(&self) -> usize {
        self.repo_count
    }

    pub fn set_diff_height(&mut self, height: usize) {
        self.diff.set_height(height);
    }

    pub fn update(&mut self, msg: Message) -> Vec<Effect> {
        match msg {
            Message::FilesChanged(changed) => self.reconcile(changed),
            Message::Select(file) => self.select(file),
            Message::DiffLoaded(loaded) => {
                self.apply_diff(loaded);
                Vec::new()
            }
        }
    }

    fn reconcile(&mut self, changed: FilesChanged) -> Vec<Effect> {
        // a notification queued before a manual refresh must not roll the
        // display back to the older sample
        let outdated = self
            .sampled
            .get(&changed.repo.scope)
            .is_some_and(|shown| changed.sampled_at < *shown);
        let mut effects = if outdated {
            trace!("ignoring outdated status for {}", changed.repo.name);
            Vec::new()
        } else {
            self.merge(changed)
        };
        effects.push(Effect::WaitForChange);
        effects
    }

    /// fold one scope's new file list into the tree, keeping the selection
    /// when its file is still present and auto-selecting otherwise
    fn merge(&mut self, changed: FilesChanged) -> Vec<Effect> {
        self.sampled
            .insert(changed.repo.scope.clone(), changed.sampled_at);
        self.tree.apply(changed.repo, changed.files);

        if self
            .selected
            .as_ref()
            .is_some_and(|selected| !self.tree.contains(selected))
        {
            self.selected = None;
        }

        self.tree.clamp_cursor();

        if self.selected.is_some() {
            return Vec::new();
        }
        match self.tree.first_file().cloned() {
            Some(file) => self.select(file),
            None => {
                self.diff.clear();
                Vec::new()
            }
        }
    }

    fn select(&mut self, file: ChangedFile) -> Vec<Effect> {
        self.selected = Some(file.clone());
        self.diff.set_loading();
        vec![Effect::LoadDiff(file)]
    }

    fn apply_diff(&mut self, loaded: DiffLoaded) {
        let current = self
            .selected
            .as_ref()
            .is_some_and(|selected| selected.same_file(&loaded.file));
        if !current {
            trace!("discarding stale diff for {}", loaded.file.path);
            return;
        }
        match loaded.result {
            Ok(content) => self.diff.set_content(&loaded.file.path, &content),
            Err(e) => self
                .diff
                .set_error(&loaded.file.path, format!("error loading diff: {e}")),
        }
    }

    /// query every repository now and reconcile the first one whose files
    /// differ from what is displayed
    pub fn refresh(&mut self, registry: &Registry, source: &dyn StatusSource) -> Vec<Effect> {
        for repo in registry.iter() {
            let sampled_at = Instant::now();
            let files = match source.changed_files(repo) {
                Ok(files) => files,
                Err(e) => {
                    trace!("{:#}", e);
                    continue;
                }
            };
            if fingerprint(&files) != fingerprint(self.tree.files_for(repo)) {
                return self.merge(FilesChanged {
                    repo: repo.clone(),
                    files,
                    sampled_at,
                });
            }
        }
        Vec::new()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Effect::Quit];
        }

        if self.tree.is_filtering() {
            self.filter_key(key);
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('q') => return vec![Effect::Quit],
            KeyCode::Char('r') => return vec![Effect::Refresh],
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Tree => Focus::Diff,
                    Focus::Diff => Focus::Tree,
                };
                return Vec::new();
            }
            _ => {}
        }

        match self.focus {
            Focus::Tree => self.tree_key(key),
            Focus::Diff => {
                self.diff_key(key);
                Vec::new()
            }
        }
    }

    fn filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.tree.accept_filter(),
            KeyCode::Esc => self.tree.cancel_filter(),
            KeyCode::Backspace => self.tree.pop_filter(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.tree.push_filter(c);
            }
            _ => {}
        }
    }

    fn tree_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.tree.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.tree.move_cursor(-1),
            KeyCode::Char('/') => self.tree.start_filter(),
            KeyCode::Char('c') => {
                if let Some(row) = self.tree.row_at_cursor() {
                    self.tree.toggle_collapse(row.group());
                }
            }
            KeyCode::Enter => match self.tree.row_at_cursor() {
                Some(Row::Header { group }) => self.tree.toggle_collapse(group),
                Some(row @ Row::File { .. }) => {
                    if let Some(file) = self.tree.file(row).cloned() {
                        return self.update(Message::Select(file));
                    }
                }
                None => {}
            },
            _ => {}
        }
        Vec::new()
    }

    fn diff_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.diff.scroll_by(1),
            KeyCode::Char('k') | KeyCode::Up => self.diff.scroll_by(-1),
            KeyCode::Char('g') | KeyCode::Home => self.diff.top(),
            KeyCode::Char('G') | KeyCode::End => self.diff.bottom(),
            KeyCode::Char('d') | KeyCode::PageDown => self.diff.half_page_down(),
            KeyCode::Char('u') | KeyCode::PageUp => self.diff.half_page_up(),
            KeyCode::Char('n') => self.diff.next_hunk(),
            KeyCode::Char('N') => self.diff.prev_hunk(),
            _ => {}
        }
    }
}
