//! Terminal setup and the dashboard event loop.

use std::{
    io::{Stdout, stdout},
    panic,
    time::Duration,
};

use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
    crossterm::{
        ExecutableCommand,
        event::{self, Event, KeyEventKind},
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
};
use tracing::error;

use crate::{
    app::{self, App, Effect},
    view,
};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn init_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout()))?)
}

fn restore_terminal() -> anyhow::Result<()> {
    stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Run the dashboard until the user quits, starting with `first`.
pub async fn run(mut app: App, first: Effect) -> anyhow::Result<()> {
    install_panic_hook();
    let mut terminal = init_terminal()?;

    let result = event_loop(&mut terminal, &mut app, first).await;
    if let Err(err) = restore_terminal() {
        error!("Error restoring terminal: {err}");
    }
    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    first: Effect,
) -> anyhow::Result<()> {
    let mut pending = Some(first);

    while app.is_running() {
        if let Some(effect) = pending.take() {
            app.set_status(effect.progress());
            terminal.draw(|frame| view::draw(frame, app))?;
            app.apply(effect).await;
        }

        terminal.draw(|frame| view::draw(frame, app))?;

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    pending = app::key_message(key).and_then(|message| app.update(message));
                }
                _ => {}
            }
        }
    }
    Ok(())
}
