use crate::app::{App, Effect, Message};
use crate::constants::{DIFF_TIMEOUT_SECS, INPUT_POLL_MS, POLL_INTERVAL_MS};
use crate::diff::{DeltaRenderer, DiffBridge};
use crate::render;
use crate::repo::Registry;
use crate::trace;
use crate::watcher::{GitStatus, Shutdown, StatusSource, Wait, Watcher};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::{cursor, execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

/// raw mode + alternate screen for as long as the guard lives
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("this command requires an interactive terminal")?;
        let guard = Self;
        execute!(io::stdout(), terminal::EnterAlternateScreen)
            .context("failed to set up terminal")?;

        // restore the terminal before the panic message is printed
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            default_hook(info);
        }));

        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

fn restore() {
    let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

/// run the dashboard until the user quits
pub fn run(registry: Registry) -> Result<()> {
    let shutdown = Shutdown::new();
    let source: Arc<dyn StatusSource> = Arc::new(GitStatus);
    let mut watcher = Watcher::spawn(
        registry.clone(),
        Arc::clone(&source),
        Duration::from_millis(POLL_INTERVAL_MS),
        shutdown.clone(),
    )?;
    let bridge = DiffBridge::new(Arc::new(DeltaRenderer::new(Duration::from_secs(
        DIFF_TIMEOUT_SECS,
    ))));
    let mut app = App::new(registry.len());

    let result = {
        let _guard = TerminalGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
            .context("failed to set up terminal")?;
        event_loop(&mut terminal, &mut app, &registry, source.as_ref(), &watcher, &bridge)
    };

    shutdown.trigger();
    watcher.close();
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    registry: &Registry,
    source: &dyn StatusSource,
    watcher: &Watcher,
    bridge: &DiffBridge,
) -> Result<()> {
    let size = terminal.size().context("failed to read terminal size")?;
    app.set_diff_height(render::diff_viewport_height(size.height));

    let mut armed = true;
    let mut dirty = true;
    let mut effects: VecDeque<Effect> = VecDeque::new();

    loop {
        if dirty {
            terminal
                .draw(|frame| render::draw(frame, app))
                .context("failed to draw")?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(INPUT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    effects.extend(app.handle_key(key));
                    dirty = true;
                }
                // the next draw picks up the new size
                Event::Resize(_, height) => {
                    app.set_diff_height(render::diff_viewport_height(height));
                    dirty = true;
                }
                _ => {}
            }
        }

        // at most one change notification per tick, and only when listening
        if armed {
            match watcher.wait_for_change(Duration::ZERO) {
                Wait::Changed(changed) => {
                    armed = false;
                    effects.extend(app.update(Message::FilesChanged(changed)));
                    dirty = true;
                }
                Wait::Pending => {}
                Wait::Closed => armed = false,
            }
        }

        for loaded in bridge.completed() {
            effects.extend(app.update(Message::DiffLoaded(loaded)));
            dirty = true;
        }

        while let Some(effect) = effects.pop_front() {
            match effect {
                Effect::LoadDiff(file) => bridge.request(file),
                Effect::WaitForChange => armed = true,
                Effect::Refresh => {
                    trace!("manual refresh");
                    effects.extend(app.refresh(registry, source));
                    dirty = true;
                }
                Effect::Quit => return Ok(()),
            }
        }
    }
}
