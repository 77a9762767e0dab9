use crate::diff::strip_ansi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffState {
    Empty,
    Loading,
    Ready,
    Failed(String),
}

/// scrollable diff pane
#[derive(Debug)]
pub struct DiffView {
    state: DiffState,
    path: Option<String>,
    lines: Vec<String>,
    scroll: usize,
    height: usize,
}

impl Default for DiffView {
    fn default() -> Self {
        Self {
            state: DiffState::Empty,
            path: None,
            lines: Vec::new(),
            scroll: 0,
            height: 1,
        }
    }
}

impl DiffView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DiffState {
        &self.state
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn set_loading(&mut self) {
        self.state = DiffState::Loading;
    }

    /// show freshly loaded content from the top
    pub fn set_content(&mut self, path: &str, content: &str) {
        self.state = DiffState::Ready;
        self.path = Some(path.to_string());
        self.lines = content
            .trim_end_matches('\n')
            .split('\n')
            .map(|line| line.replace('\t', "    "))
            .collect();
        if self.lines.iter().all(|l| strip_ansi(l).trim().is_empty()) {
            self.lines.clear();
        }
        self.scroll = 0;
    }

    pub fn set_error(&mut self, path: &str, message: String) {
        self.state = DiffState::Failed(message);
        self.path = Some(path.to_string());
        self.lines.clear();
        self.scroll = 0;
    }

    pub fn clear(&mut self) {
        *self = Self {
            height: self.height,
            ..Self::default()
        };
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height.max(1);
        self.clamp();
    }

    /// lines currently in view
    pub fn visible(&self) -> &[String] {
        let end = (self.scroll + self.height).min(self.lines.len());
        &self.lines[self.scroll.min(end)..end]
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    fn clamp(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.scroll = self.scroll.saturating_add_signed(delta);
        self.clamp();
    }

    pub fn half_page_down(&mut self) {
        self.scroll_by((self.height / 2).max(1) as isize);
    }

    pub fn half_page_up(&mut self) {
        self.scroll_by(-((self.height / 2).max(1) as isize));
    }

    pub fn top(&mut self) {
        self.scroll = 0;
    }

    pub fn bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn is_hunk(line: &str) -> bool {
        strip_ansi(line).contains("@@")
    }

    pub fn next_hunk(&mut self) {
        if let Some(i) = (self.scroll + 1..self.lines.len()).find(|&i| Self::is_hunk(&self.lines[i])) {
            self.scroll = i;
            self.clamp();
        }
    }

    pub fn prev_hunk(&mut self) {
        if let Some(i) = (0..self.scroll).rev().find(|&i| Self::is_hunk(&self.lines[i])) {
            self.scroll = i;
        }
    }
}
