use crate::changeset::ChangedFile;
use crate::repo::TrackedRepo;
use std::sync::Arc;

/// a tracked repository and its current changed files, as displayed
#[derive(Debug, Clone)]
pub struct RepoGroup {
    pub repo: Arc<TrackedRepo>,
    pub files: Vec<ChangedFile>,
    pub collapsed: bool,
}

/// one line of the flattened tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Header { group: usize },
    /// `file` indexes the group's full file list, not the filtered one
    File { group: usize, file: usize },
}

impl Row {
    pub fn group(self) -> usize {
        match self {
            Row::Header { group } | Row::File { group, .. } => group,
        }
    }
}

/// repository groups plus the collapse, filter and cursor state used to
/// project them into navigable rows
#[derive(Debug, Default)]
pub struct FileTree {
    groups: Vec<RepoGroup>,
    cursor: usize,
    filter: String,
    filtering: bool,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[RepoGroup] {
        &self.groups
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_filtering(&self) -> bool {
        self.filtering
    }

    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }

    /// indices of the group's files matching the filter (case-insensitive substring)
    pub fn filtered_files(&self, group: usize) -> Vec<usize> {
        let Some(group) = self.groups.get(group) else {
            return Vec::new();
        };
        if self.filter.is_empty() {
            return (0..group.files.len()).collect();
        }
        let needle = self.filter.to_lowercase();
        group
            .files
            .iter()
            .enumerate()
            .filter(|(_, f)| f.path.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    /// visible rows in display order
    ///
    /// groups without a single file matching the filter are left out entirely
    pub fn flatten(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for (gi, group) in self.groups.iter().enumerate() {
            let files = self.filtered_files(gi);
            if files.is_empty() {
                continue;
            }
            rows.push(Row::Header { group: gi });
            if !group.collapsed {
                rows.extend(files.into_iter().map(|fi| Row::File { group: gi, file: fi }));
            }
        }
        rows
    }

    pub fn file(&self, row: Row) -> Option<&ChangedFile> {
        match row {
            Row::Header { .. } => None,
            Row::File { group, file } => self.groups.get(group)?.files.get(file),
        }
    }

    pub fn row_at_cursor(&self) -> Option<Row> {
        self.flatten().get(self.cursor).copied()
    }

    /// first file row in display order
    pub fn first_file(&self) -> Option<&ChangedFile> {
        self.flatten().into_iter().find_map(|row| self.file(row))
    }

    pub fn contains(&self, file: &ChangedFile) -> bool {
        self.groups
            .iter()
            .filter(|g| g.repo.scope == file.repo.scope)
            .flat_map(|g| &g.files)
            .any(|f| f.same_file(file))
    }

    /// files currently shown for a watch scope (empty when the scope has no group)
    pub fn files_for(&self, repo: &TrackedRepo) -> &[ChangedFile] {
        self.groups
            .iter()
            .find(|g| g.repo.scope == repo.scope)
            .map(|g| g.files.as_slice())
            .unwrap_or_default()
    }

    /// replace (or add) a scope's files, then drop every group left without files
    pub fn apply(&mut self, repo: Arc<TrackedRepo>, files: Vec<ChangedFile>) {
        match self.groups.iter_mut().find(|g| g.repo.scope == repo.scope) {
            Some(group) => group.files = files,
            None if !files.is_empty() => self.groups.push(RepoGroup {
                repo,
                files,
                collapsed: false,
            }),
            None => {}
        }
        self.groups.retain(|g| !g.files.is_empty());
    }

    pub fn toggle_collapse(&mut self, group: usize) {
        if let Some(group) = self.groups.get_mut(group) {
            group.collapsed = !group.collapsed;
        }
        self.clamp_cursor();
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.cursor = self.cursor.saturating_add_signed(delta);
        self.clamp_cursor();
    }

    /// keep the cursor inside `[0, len - 1]`, or at 0 when nothing is visible
    pub fn clamp_cursor(&mut self) {
        let len = self.flatten().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    pub fn start_filter(&mut self) {
        self.filtering = true;
        self.filter.clear();
        self.clamp_cursor();
    }

    pub fn push_filter(&mut self, c: char) {
        self.filter.push(c);
        self.clamp_cursor();
    }

    pub fn pop_filter(&mut self) {
        self.filter.pop();
        self.clamp_cursor();
    }

    /// leave filter mode keeping the filter
    pub fn accept_filter(&mut self) {
        self.filtering = false;
        self.clamp_cursor();
    }

    /// leave filter mode and clear the filter
    pub fn cancel_filter(&mut self) {
        self.filtering = false;
        self.filter.clear();
        self.clamp_cursor();
    }
}
