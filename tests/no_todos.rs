use std::fs;
use std::path::Path;
use walkdir::WalkDir;

type Finding = (String, usize, String);

#[test]
fn no_todo_comments() {
    let findings = scan(is_todo_in_comment);
    report(&findings, "TODO comment(s)", "todo comments must be removed before tests pass");
}

#[test]
fn no_debug_macros() {
    let findings = scan(|line| line.contains(concat!("dbg", "!(")));
    report(&findings, "dbg! call(s)", "debug macros must be removed before tests pass");
}

/// every line of every rust source file under src/ matching `check`
fn scan(check: impl Fn(&str) -> bool) -> Vec<Finding> {
    let src_dir = Path::new("src");
    let mut findings = Vec::new();

    for entry in WalkDir::new(src_dir)
        .sort_by_file_name()
        .into_iter()
        .flatten()
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        for (line_num, line) in content.lines().enumerate() {
            if check(line) {
                findings.push((path.display().to_string(), line_num + 1, line.to_string()));
            }
        }
    }
    findings
}

fn report(findings: &[Finding], what: &str, message: &str) {
    if findings.is_empty() {
        return;
    }
    eprintln!("\nfound {} {}:", findings.len(), what);
    for (file, line_num, line) in findings {
        eprintln!("  {}:{}: {}", file, line_num, line.trim());
    }
    panic!("{message}");
}

fn is_todo_in_comment(line: &str) -> bool {
    let line_upper = line.to_uppercase();

    // line comments and block comment openers
    for marker in ["//", "/*"] {
        if let Some(pos) = line.find(marker)
            && line[pos..].to_uppercase().contains("TODO")
        {
            return true;
        }
    }

    // block comment continuation lines (e.g., " * TODO")
    let trimmed = line.trim_start();
    trimmed.starts_with('*') && !trimmed.starts_with("*/") && line_upper.contains("TODO")
}

#[test]
fn todo_detection() {
    assert!(is_todo_in_comment("    // todo: later"));
    assert!(is_todo_in_comment("/* TODO */"));
    assert!(is_todo_in_comment(" * todo"));
    assert!(!is_todo_in_comment("let todo_list = Vec::new();"));
}
