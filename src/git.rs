use crate::changeset::{ChangedFile, StatusCode, sort_files};
use crate::repo::TrackedRepo;
use anyhow::{Context, Result};
use git2::{Repository, Status, StatusEntry, StatusOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// find the repositories to track for a path
///
/// a repository root is tracked whole; a path inside a repository tracks just
/// that subtree; anything else is searched for nested repositories
pub fn discover(path: &Path) -> Result<Vec<TrackedRepo>> {
    let start = path
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", path.display()))?;

    if is_git_repo(&start) {
        return Ok(vec![TrackedRepo::whole(base_name(&start), start)]);
    }

    if let Some(root) = find_git_root(&start) {
        let mut name = base_name(&root);
        if let Ok(rel) = start.strip_prefix(&root) {
            name = format!("{}/{}", name, slash_path(rel));
        }
        return Ok(vec![TrackedRepo::new(name, root, start)]);
    }

    let mut repos = Vec::new();
    let mut walker = WalkDir::new(&start).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        // unreadable directories are skipped
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.') {
            walker.skip_current_dir();
            continue;
        }
        if is_git_repo(entry.path()) {
            let name = entry
                .path()
                .strip_prefix(&start)
                .map_or_else(|_| base_name(entry.path()), slash_path);
            repos.push(TrackedRepo::whole(name, entry.path()));
            // nested repositories are not tracked separately
            walker.skip_current_dir();
        }
    }

    Ok(repos)
}

/// a `.git` directory, or a `.git` file for worktrees
fn is_git_repo(dir: &Path) -> bool {
    dir.join(".git").exists()
}

fn find_git_root(dir: &Path) -> Option<PathBuf> {
    dir.ancestors().find(|d| is_git_repo(d)).map(Path::to_path_buf)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}

fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// current changed files for a tracked scope, sorted by path
pub fn changed_files(repo: &Arc<TrackedRepo>) -> Result<Vec<ChangedFile>, git2::Error> {
    let git = Repository::open(&repo.root)?;

    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        // unstaged moves stay a deletion plus an untracked file, as in porcelain
        .renames_head_to_index(true);

    let scope = repo.scope_pathspec();
    // libgit2 reads pathspecs as globs; a scope whose name contains glob
    // characters is narrowed by `in_scope` alone
    if let Some(spec) = scope.as_deref().filter(|s| !has_glob_chars(s)) {
        opts.pathspec(spec);
    }

    let statuses = git.statuses(Some(&mut opts))?;
    let mut files: Vec<ChangedFile> = statuses
        .iter()
        .filter_map(|entry| {
            let (x, y) = status_chars(entry.status());
            if x == ' ' && y == ' ' {
                return None;
            }
            let path = entry_path(&entry)?;
            Some(ChangedFile::new(repo, path, StatusCode::from_xy(x, y)))
        })
        .filter(|file| scope.as_deref().is_none_or(|spec| in_scope(&file.path, spec)))
        .collect();

    sort_files(&mut files);
    Ok(files)
}

fn has_glob_chars(spec: &str) -> bool {
    spec.contains(['*', '?', '[', ']', '\\'])
}

fn in_scope(path: &str, spec: &str) -> bool {
    path == spec
        || path
            .strip_prefix(spec)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// map libgit2 status bits onto porcelain (index, worktree) codes
fn status_chars(status: Status) -> (char, char) {
    if status.is_conflicted() {
        return ('U', 'U');
    }
    if status.is_wt_new() {
        return ('?', '?');
    }

    let x = if status.is_index_new() {
        'A'
    } else if status.is_index_modified() {
        'M'
    } else if status.is_index_deleted() {
        'D'
    } else if status.is_index_renamed() {
        'R'
    } else if status.is_index_typechange() {
        'T'
    } else {
        ' '
    };

    let y = if status.is_wt_modified() {
        'M'
    } else if status.is_wt_deleted() {
        'D'
    } else if status.is_wt_renamed() {
        'R'
    } else if status.is_wt_typechange() {
        'T'
    } else {
        ' '
    };

    (x, y)
}

/// path of the entry as it is now (the new side of a rename)
fn entry_path(entry: &StatusEntry) -> Option<String> {
    let workdir_path = entry.index_to_workdir().and_then(|d| d.new_file().path());
    let index_path = entry.head_to_index().and_then(|d| d.new_file().path());

    match workdir_path.or(index_path) {
        Some(path) => Some(slash_path(path)),
        None => entry.path().map(str::to_string),
    }
}

/// whether HEAD points at a commit (false for freshly initialised repositories)
pub fn has_head(root: &Path) -> bool {
    Repository::open(root)
        .and_then(|repo| repo.head().map(|_| ()))
        .is_ok()
}

#[cfg(test)]
pub(crate) mod tests;
