// watcher
pub const POLL_INTERVAL_MS: u64 = 1000;
pub const NOTIFY_QUEUE_CAPACITY: usize = 64;
pub const ENQUEUE_RETRY_MS: u64 = 10;

// diff
pub const DIFF_TOOL: &str = "delta";
pub const DIFF_TOOL_ARGS: &[&str] = &[
    "--paging=never",
    "--color-only",
    "--line-numbers",
    "--file-style=omit",
    "--hunk-header-style=omit",
];
pub const DIFF_TIMEOUT_SECS: u64 = 10;

// ui
pub const INPUT_POLL_MS: u64 = 50;
pub const TREE_WIDTH_PERCENT: u16 = 30;
pub const MIN_PANE_WIDTH: u16 = 10;

// config
pub const CONFIG_ENV: &str = "DIFFWATCH_CONFIG";
