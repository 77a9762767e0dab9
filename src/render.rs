//! drawing the app state into a ratatui frame; reads only, never mutates

use crate::ansi;
use crate::app::{App, Focus};
use crate::changeset::StatusCode;
use crate::constants::{MIN_PANE_WIDTH, TREE_WIDTH_PERCENT};
use crate::diffview::DiffState;
use crate::tree::Row;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// rows of diff text visible in a terminal `height` rows tall
pub fn diff_viewport_height(height: u16) -> usize {
    // pane borders plus the status bar
    usize::from(height.saturating_sub(3).max(1))
}

pub fn draw(frame: &mut Frame, app: &App) {
    let [body, status] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());
    let [tree_area, diff_area] = Layout::horizontal([
        Constraint::Percentage(TREE_WIDTH_PERCENT),
        Constraint::Min(MIN_PANE_WIDTH),
    ])
    .areas(body);

    draw_tree(frame, app, tree_area);
    draw_diff(frame, app, diff_area);
    draw_status(frame, app, status);
}

fn pane(title: String, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::new().fg(Color::Blue).add_modifier(Modifier::BOLD)
    } else {
        Style::new().add_modifier(Modifier::DIM)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(Span::styled(title, style))
}

fn status_color(status: StatusCode) -> Color {
    match status {
        StatusCode::Modified => Color::Yellow,
        StatusCode::Added => Color::Green,
        StatusCode::Deleted => Color::Red,
        StatusCode::Renamed => Color::Cyan,
        StatusCode::Untracked => Color::DarkGray,
        StatusCode::Copied | StatusCode::Other(_) => Color::Reset,
    }
}

fn draw_tree(frame: &mut Frame, app: &App, area: Rect) {
    let tree = app.tree();
    let block = pane(
        format!(" Changed Files ({}) ", tree.total_files()),
        app.focus() == Focus::Tree,
    );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = tree.flatten();
    let lines: Vec<Line> = if rows.is_empty() {
        let messages = if tree.filter().is_empty() {
            vec![
                "No uncommitted changes found.".to_string(),
                "Watching for changes...".to_string(),
            ]
        } else {
            vec![format!("No files matching '{}'", tree.filter())]
        };
        messages.into_iter().map(|m| Line::from(m).dim()).collect()
    } else {
        // keep the cursor in view
        let height = usize::from(inner.height);
        let offset = (tree.cursor() + 1).saturating_sub(height);
        rows.iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, &row)| row_line(app, row, i == tree.cursor()))
            .collect()
    };

    frame.render_widget(Paragraph::new(lines), inner);
}

fn row_line(app: &App, row: Row, highlighted: bool) -> Line<'static> {
    let tree = app.tree();
    let line = match tree.file(row) {
        None => {
            let group = &tree.groups()[row.group()];
            let arrow = if group.collapsed { "▸" } else { "▾" };
            let count = tree.filtered_files(row.group()).len();
            Line::from(format!("{arrow} {} ({count})", group.repo.name))
                .bold()
                .fg(Color::Blue)
        }
        Some(file) => {
            let is_selected = app.selected().is_some_and(|s| s.same_file(file));
            let marker = if is_selected { "•" } else { " " };
            let status = Span::styled(
                format!("{marker} {} ", file.status),
                Style::new().fg(status_color(file.status)),
            );
            let path = Span::raw(file.path.clone());
            Line::from(vec![status, if is_selected { path.bold() } else { path }])
        }
    };
    if highlighted { line.reversed() } else { line }
}

fn draw_diff(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.diff();
    let ready = view.state() == &DiffState::Ready && !view.is_empty();
    let title = match view.path() {
        Some(path) if ready => format!(
            " {path} [{}-{}/{}] ",
            view.scroll() + 1,
            view.scroll() + view.visible().len(),
            view.line_count()
        ),
        Some(path) => format!(" {path} "),
        None => " Diff ".to_string(),
    };
    let block = pane(title, app.focus() == Focus::Diff);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let placeholder = |text: String| vec![Line::default(), Line::from(format!("  {text}"))];
    let lines: Vec<Line> = match view.state() {
        DiffState::Empty => placeholder("Select a file to view diff".to_string())
            .into_iter()
            .map(|l| l.dim())
            .collect(),
        DiffState::Loading => placeholder("Loading...".to_string())
            .into_iter()
            .map(|l| l.dim())
            .collect(),
        DiffState::Failed(message) => placeholder(message.clone())
            .into_iter()
            .map(|l| l.red())
            .collect(),
        DiffState::Ready if view.is_empty() => placeholder("No textual changes".to_string())
            .into_iter()
            .map(|l| l.dim())
            .collect(),
        // lines wider than the pane are clipped, never wrapped
        DiffState::Ready => view.visible().iter().map(|l| ansi::to_line(l)).collect(),
    };

    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let tree = app.tree();
    let line = if tree.is_filtering() {
        Line::from(format!("/{}█", tree.filter())).fg(Color::Yellow)
    } else {
        let focus = match app.focus() {
            Focus::Tree => "file tree",
            Focus::Diff => "diff view",
        };
        let filter = if tree.filter().is_empty() {
            String::new()
        } else {
            format!(" | filter: {}", tree.filter())
        };
        Line::from(format!(
            " {} repo(s) | focus: {}{} | tab:switch  /:filter  r:refresh  q:quit",
            app.repo_count(),
            focus,
            filter
        ))
        .dim()
    };
    frame.render_widget(Paragraph::new(line), area);
}
