use crate::repo::TrackedRepo;
use std::fmt::{self, Write};
use std::sync::Arc;

/// display status of a changed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Untracked,
    Other(char), // typechange, unmerged, etc.
}

impl StatusCode {
    /// collapse a two-character (index, worktree) status into one display status
    ///
    /// precedence: untracked > added > deleted > renamed > modified > copied,
    /// falling back to the index code (or the worktree code when the index is clean)
    pub fn from_xy(x: char, y: char) -> Self {
        let either = |c: char| x == c || y == c;
        if either('?') {
            Self::Untracked
        } else if either('A') {
            Self::Added
        } else if either('D') {
            Self::Deleted
        } else if either('R') {
            Self::Renamed
        } else if either('M') {
            Self::Modified
        } else if either('C') {
            Self::Copied
        } else if x == ' ' {
            Self::Other(y)
        } else {
            Self::Other(x)
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Modified => 'M',
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Renamed => 'R',
            Self::Copied => 'C',
            Self::Untracked => '?',
            Self::Other(c) => c,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(self.as_char())
    }
}

/// a file with uncommitted changes inside a tracked scope
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub repo: Arc<TrackedRepo>,
    pub path: String, // relative to the repository root
    pub status: StatusCode,
}

impl ChangedFile {
    pub fn new(repo: &Arc<TrackedRepo>, path: impl Into<String>, status: StatusCode) -> Self {
        Self {
            repo: Arc::clone(repo),
            path: path.into(),
            status,
        }
    }

    /// identity is (watch scope, relative path); status is not part of it
    pub fn same_file(&self, other: &ChangedFile) -> bool {
        self.repo.scope == other.repo.scope && self.path == other.path
    }
}

pub fn sort_files(files: &mut [ChangedFile]) {
    files.sort_by(|a, b| a.path.cmp(&b.path));
}

/// deterministic snapshot of a file list, one "status path" pair per line
///
/// an empty list fingerprints to the empty string. only used for equality
/// against the previous snapshot of the same watch scope.
pub fn fingerprint(files: &[ChangedFile]) -> String {
    let mut entries: Vec<&ChangedFile> = files.iter().collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    let mut out = String::new();
    for file in entries {
        let _ = writeln!(out, "{} {}", file.status, file.path);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo() -> Arc<TrackedRepo> {
        Arc::new(TrackedRepo::whole("app", "/src/app"))
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(StatusCode::from_xy('?', '?'), StatusCode::Untracked);
        assert_eq!(StatusCode::from_xy('A', 'M'), StatusCode::Added);
        assert_eq!(StatusCode::from_xy('M', 'D'), StatusCode::Deleted);
        assert_eq!(StatusCode::from_xy('R', 'M'), StatusCode::Renamed);
        assert_eq!(StatusCode::from_xy(' ', 'M'), StatusCode::Modified);
        assert_eq!(StatusCode::from_xy('C', ' '), StatusCode::Copied);
        assert_eq!(StatusCode::from_xy('U', 'U'), StatusCode::Other('U'));
        assert_eq!(StatusCode::from_xy(' ', 'T'), StatusCode::Other('T'));
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let repo = repo();
        let a = ChangedFile::new(&repo, "a.txt", StatusCode::Added);
        let b = ChangedFile::new(&repo, "b.txt", StatusCode::Modified);

        let forward = fingerprint(&[a.clone(), b.clone()]);
        let backward = fingerprint(&[b, a]);
        assert_eq!(forward, backward);
        assert_eq!(forward, "A a.txt\nM b.txt\n");
    }

    #[test]
    fn test_fingerprint_distinguishes_status_and_path() {
        let repo = repo();
        let modified = fingerprint(&[ChangedFile::new(&repo, "a.txt", StatusCode::Modified)]);
        let deleted = fingerprint(&[ChangedFile::new(&repo, "a.txt", StatusCode::Deleted)]);
        let other_path = fingerprint(&[ChangedFile::new(&repo, "b.txt", StatusCode::Modified)]);

        assert_ne!(modified, deleted);
        assert_ne!(modified, other_path);
        assert_eq!(fingerprint(&[]), "");
    }

    #[test]
    fn test_same_file_uses_scope_identity() {
        let a = Arc::new(TrackedRepo::new("mono/a", "/src/mono", "/src/mono/a"));
        let b = Arc::new(TrackedRepo::new("mono/b", "/src/mono", "/src/mono/b"));

        let in_a = ChangedFile::new(&a, "shared.txt", StatusCode::Modified);
        let in_b = ChangedFile::new(&b, "shared.txt", StatusCode::Modified);
        let in_a_again = ChangedFile::new(&a, "shared.txt", StatusCode::Added);

        assert!(!in_a.same_file(&in_b));
        assert!(in_a.same_file(&in_a_again));
    }
}
