use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;

pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Bracketed paste, delivered whole.
    Paste(String),
    Tick,
    Resize,
}

pub fn poll_event(timeout: Duration) -> color_eyre::Result<AppEvent> {
    if !event::poll(timeout)? {
        return Ok(AppEvent::Tick);
    }
    let event = match event::read()? {
        // Windows reports releases too; only act on presses.
        Event::Key(key) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
        Event::Mouse(mouse) => AppEvent::Mouse(mouse),
        Event::Paste(text) => AppEvent::Paste(text),
        Event::Resize(_, _) => AppEvent::Resize,
        _ => AppEvent::Tick,
    };
    Ok(event)
}
