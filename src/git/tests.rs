use super::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// helper to initialise a test git repository
pub(crate) fn setup_test_repo() -> (TempDir, Repository) {
    let temp_dir = TempDir::new().unwrap();
    let repo = Repository::init(temp_dir.path()).unwrap();

    // configure git user for commits
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    (temp_dir, repo)
}

/// helper to create a file with content, creating parent directories
pub(crate) fn create_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// helper to commit all changes
pub(crate) fn commit_all(repo: &Repository, message: &str) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();

    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let signature = repo.signature().unwrap();

    let parent_commit = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent_commit.iter().collect();

    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )
    .unwrap();
}

pub(crate) fn tracked(root: &Path) -> Arc<TrackedRepo> {
    let root = root.canonicalize().unwrap();
    Arc::new(TrackedRepo::whole("test", root))
}

fn summary(files: &[ChangedFile]) -> Vec<(char, String)> {
    files
        .iter()
        .map(|f| (f.status.as_char(), f.path.clone()))
        .collect()
}

#[test]
fn test_clean_repository_has_no_changes() {
    let (temp_dir, repo) = setup_test_repo();
    create_file(&temp_dir.path().join("readme.md"), "hello");
    commit_all(&repo, "initial commit");

    let files = changed_files(&tracked(temp_dir.path())).unwrap();
    assert!(files.is_empty());
}

#[test]
fn test_mixed_changes_are_sorted_by_path() {
    let (temp_dir, repo) = setup_test_repo();
    let repo_path = temp_dir.path();

    create_file(&repo_path.join("to_modify.txt"), "original");
    create_file(&repo_path.join("to_delete.txt"), "delete me");
    commit_all(&repo, "initial commit");

    create_file(&repo_path.join("to_modify.txt"), "modified");
    fs::remove_file(repo_path.join("to_delete.txt")).unwrap();
    create_file(&repo_path.join("dir/untracked.txt"), "new");
    create_file(&repo_path.join("staged.txt"), "staged");

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("staged.txt")).unwrap();
    index.write().unwrap();

    let files = changed_files(&tracked(repo_path)).unwrap();
    assert_eq!(
        summary(&files),
        vec![
            ('?', "dir/untracked.txt".to_string()),
            ('A', "staged.txt".to_string()),
            ('D', "to_delete.txt".to_string()),
            ('M', "to_modify.txt".to_string()),
        ]
    );
}

#[test]
fn test_staged_rename_reports_new_path() {
    let (temp_dir, repo) = setup_test_repo();
    let repo_path = temp_dir.path();

    create_file(&repo_path.join("old_name.txt"), "file content that is long enough");
    commit_all(&repo, "initial commit");

    fs::rename(
        repo_path.join("old_name.txt"),
        repo_path.join("new_name.txt"),
    )
    .unwrap();

    let mut index = repo.index().unwrap();
    index.remove_path(Path::new("old_name.txt")).unwrap();
    index.add_path(Path::new("new_name.txt")).unwrap();
    index.write().unwrap();

    let files = changed_files(&tracked(repo_path)).unwrap();
    assert_eq!(summary(&files), vec![('R', "new_name.txt".to_string())]);
}

#[test]
fn test_unstaged_move_is_a_deletion_plus_an_untracked_file() {
    let (temp_dir, repo) = setup_test_repo();
    let repo_path = temp_dir.path();

    create_file(&repo_path.join("old_name.txt"), "file content that is long enough");
    commit_all(&repo, "initial commit");

    fs::rename(
        repo_path.join("old_name.txt"),
        repo_path.join("new_name.txt"),
    )
    .unwrap();

    let files = changed_files(&tracked(repo_path)).unwrap();
    assert_eq!(
        summary(&files),
        vec![
            ('?', "new_name.txt".to_string()),
            ('D', "old_name.txt".to_string()),
        ]
    );
}

#[test]
fn test_scope_with_glob_characters_is_matched_literally() {
    let (temp_dir, repo) = setup_test_repo();
    let root = temp_dir.path().canonicalize().unwrap();

    create_file(&root.join("pkg[1]/a.rs"), "v1");
    create_file(&root.join("pkg1/b.rs"), "v1");
    commit_all(&repo, "initial commit");

    create_file(&root.join("pkg[1]/a.rs"), "v2");
    create_file(&root.join("pkg1/b.rs"), "v2");

    let scoped = Arc::new(TrackedRepo::new("repo/pkg[1]", &root, root.join("pkg[1]")));
    let files = changed_files(&scoped).unwrap();
    assert_eq!(summary(&files), vec![('M', "pkg[1]/a.rs".to_string())]);
}

#[test]
fn test_glob_characters_are_detected() {
    assert!(has_glob_chars("pkg[1]"));
    assert!(has_glob_chars("a*b"));
    assert!(has_glob_chars("what?"));
    assert!(!has_glob_chars("billing/api"));
}

#[test]
fn test_subtree_scopes_of_one_repository_are_independent() {
    let (temp_dir, repo) = setup_test_repo();
    let root = temp_dir.path().canonicalize().unwrap();

    create_file(&root.join("billing/api.rs"), "v1");
    create_file(&root.join("search/index.rs"), "v1");
    commit_all(&repo, "initial commit");

    create_file(&root.join("billing/api.rs"), "v2");
    create_file(&root.join("search/index.rs"), "v2");
    create_file(&root.join("search/new.rs"), "new");
    create_file(&root.join("top.txt"), "outside both scopes");

    let billing = Arc::new(TrackedRepo::new("repo/billing", &root, root.join("billing")));
    let search = Arc::new(TrackedRepo::new("repo/search", &root, root.join("search")));

    let billing_files = changed_files(&billing).unwrap();
    let search_files = changed_files(&search).unwrap();

    assert_eq!(
        summary(&billing_files),
        vec![('M', "billing/api.rs".to_string())]
    );
    assert_eq!(
        summary(&search_files),
        vec![
            ('M', "search/index.rs".to_string()),
            ('?', "search/new.rs".to_string()),
        ]
    );
    assert!(billing_files.iter().all(|f| f.repo.scope == billing.scope));
}

#[test]
fn test_has_head() {
    let (temp_dir, repo) = setup_test_repo();
    assert!(!has_head(temp_dir.path()));

    create_file(&temp_dir.path().join("a.txt"), "a");
    commit_all(&repo, "initial commit");
    assert!(has_head(temp_dir.path()));
}

#[test]
fn test_discover_repository_root() {
    let (temp_dir, _repo) = setup_test_repo();
    let root = temp_dir.path().canonicalize().unwrap();

    let repos = discover(temp_dir.path()).unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].root, root);
    assert_eq!(repos[0].scope, root);
}

#[test]
fn test_discover_inside_repository_scopes_to_subtree() {
    let (temp_dir, _repo) = setup_test_repo();
    let root = temp_dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("pkg/api")).unwrap();

    let repos = discover(&root.join("pkg/api")).unwrap();
    assert_eq!(repos.len(), 1);

    let repo = &repos[0];
    assert_eq!(repo.root, root);
    assert_eq!(repo.scope, root.join("pkg/api"));
    assert!(repo.name.ends_with("/pkg/api"), "name was {}", repo.name);
}

#[test]
fn test_discover_nested_repositories_skips_hidden_dirs() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().canonicalize().unwrap();

    Repository::init(base.join("work/alpha")).unwrap();
    Repository::init(base.join("work/beta")).unwrap();
    Repository::init(base.join("work/beta/vendored")).unwrap();
    Repository::init(base.join(".cache/hidden")).unwrap();

    let repos = discover(&base).unwrap();
    let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["work/alpha", "work/beta"]);
    assert!(repos.iter().all(|r| r.root == r.scope));
}

#[test]
fn test_discover_missing_path_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(discover(&temp_dir.path().join("nope")).is_err());
}
