use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::tabs::Tab;
use super::theme;
use crate::app::{App, InputMode};
use crate::util::truncate;

fn hint<'a>(key: &'a str, desc: &'a str) -> [Span<'a>; 2] {
    [
        Span::styled(key, theme::key_hint_style()),
        Span::styled(desc, theme::label_style()),
    ]
}

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let hints = if app.input_mode != InputMode::Normal {
        input_hints(app)
    } else if app.picker.is_some() {
        let mut h = vec![Span::raw(" ")];
        h.extend(hint("j/k", " choose  "));
        h.extend(hint("Enter", " add  "));
        h.extend(hint("Esc", " cancel"));
        h
    } else {
        let mut h = vec![Span::raw(" ")];
        h.extend(hint("q", " quit  "));
        h.extend(hint("?", " help  "));
        h.extend(hint("Tab", " switch  "));
        h.extend(hint("r", " refresh  "));

        match app.current_tab {
            Tab::Dashboard => {
                h.extend(hint("j/k", " panel  "));
                h.extend(hint("h/l", " point  "));
                h.extend(hint("a", " add  "));
                h.extend(hint("x", " remove"));
            }
            Tab::Readings => {
                h.extend(hint("/", " filter  "));
                h.extend(hint("t", " time  "));
                h.extend(hint("s", " sensor  "));
                h.extend(hint("v", " value"));
            }
            Tab::Entry => {
                h.extend(hint("j/k", " sensor  "));
                h.extend(hint("e", " value  "));
                h.extend(hint("n", " notes  "));
                h.extend(hint("Enter", " save"));
            }
            Tab::Learn => {
                h.extend(hint("i", " ask  "));
                h.extend(hint("C", " clear  "));
                h.extend(hint("j/k", " scroll"));
            }
            Tab::Settings => {
                h.extend(hint("u", " API URL  "));
                if app.session.user.is_some() {
                    h.extend(hint("o", " log out"));
                } else {
                    h.extend(hint("l", " log in  "));
                    h.extend(hint("n", " register"));
                }
            }
            Tab::Overview => {
                h.extend(hint("j/k", " scroll"));
            }
        }
        h
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(36)])
        .split(area);

    frame.render_widget(
        Paragraph::new(Line::from(hints)).style(theme::footer_style()),
        chunks[0],
    );

    let status = app.status.as_deref().unwrap_or("");
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!("{} ", truncate(status, 35)),
            theme::value_style(),
        )))
        .alignment(Alignment::Right)
        .style(theme::footer_style()),
        chunks[1],
    );
}

fn input_hints(app: &App) -> Vec<Span<'static>> {
    let prompt = match app.input_mode {
        InputMode::Filter => "filter",
        InputMode::EntryValue => "value",
        InputMode::EntryNotes => "notes",
        InputMode::Chat => "ask",
        InputMode::ApiUrl => "API URL",
        InputMode::Email => "email",
        InputMode::Password => "password",
        InputMode::Normal => "",
    };
    let shown = if app.input_mode == InputMode::Password {
        "*".repeat(app.input_buffer.chars().count())
    } else {
        app.input_buffer.clone()
    };
    vec![
        Span::styled(format!(" {prompt}: "), theme::key_hint_style()),
        Span::styled(format!("{shown}_ "), theme::input_style()),
        Span::styled(" Enter", theme::key_hint_style()),
        Span::styled(" confirm  ", theme::label_style()),
        Span::styled("Esc", theme::key_hint_style()),
        Span::styled(" cancel", theme::label_style()),
    ]
}
