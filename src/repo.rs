use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// a tracked scope: a repository root plus the subtree being watched
///
/// `scope` is the identity of a tracked repository. two entries may share the
/// same `root` when different subtrees of one large repository are tracked
/// independently, so nothing may be keyed on `root`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackedRepo {
    pub name: String,
    pub root: PathBuf,
    pub scope: PathBuf,
}

impl TrackedRepo {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, scope: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            scope: scope.into(),
        }
    }

    /// repository tracked as a whole
    pub fn whole(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self::new(name, root.clone(), root)
    }

    /// scope relative to the root, when the scope is a strict subtree of it
    pub fn scope_pathspec(&self) -> Option<String> {
        if self.scope == self.root {
            return None;
        }
        let rel = self.scope.strip_prefix(&self.root).ok()?;
        if rel.as_os_str().is_empty() {
            return None;
        }
        Some(pathspec_string(rel))
    }
}

/// git pathspecs always use forward slashes
fn pathspec_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// fixed, ordered set of tracked repositories for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct Registry {
    repos: Vec<Arc<TrackedRepo>>,
}

impl Registry {
    /// build the registry, dropping entries whose scope is already tracked
    pub fn new(repos: impl IntoIterator<Item = TrackedRepo>) -> Self {
        let mut seen = HashSet::new();
        let repos = repos
            .into_iter()
            .filter(|repo| seen.insert(repo.scope.clone()))
            .map(Arc::new)
            .collect();
        Self { repos }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TrackedRepo>> {
        self.repos.iter()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}
