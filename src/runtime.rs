use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use chrono::Utc;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use crate::app::App;
use crate::export;
use crate::model::ScheduleSnapshot;
use crate::normalize::display_offset;
use crate::ui;

pub fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Synchronous display loop. Each message from the fetcher drives one
/// refresh cycle (normalize + highlight selection); drawing in between
/// only repaints the current state. Refresh cycles never overlap because
/// everything runs on this one thread.
pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: App,
    rx: Receiver<Result<ScheduleSnapshot, String>>,
    refresh_tx: Sender<()>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    loop {
        while let Ok(message) = rx.try_recv() {
            let now = Utc::now().with_timezone(&display_offset());
            match message {
                Ok(snapshot) => app.apply_snapshot(snapshot, now),
                Err(err) => app.apply_error(err, now),
            }
        }

        terminal.draw(|f| ui::ui(f, &app))?;
        app.advance_tick();

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('s') => app.toggle_simplified(),
                    KeyCode::Char('r') => {
                        let _ = refresh_tx.send(());
                    }
                    KeyCode::Char('e') => {
                        if let Ok(path) = export::export_csv(&app) {
                            app.set_last_export(path);
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}
