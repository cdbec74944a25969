use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, InputMode};
use crate::data::entry::SubmitStatus;
use crate::ui::theme;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    // Sensor list
    let sensors = app.repo.sensors();
    let items: Vec<ListItem> = sensors
        .iter()
        .map(|s| ListItem::new(format!(" {}", s.name)))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(Line::styled(" Sensor ", theme::title_style()))
                .borders(Borders::ALL)
                .border_style(theme::border_style()),
        )
        .style(theme::value_style())
        .highlight_style(theme::highlight_style());
    let selected = (!sensors.is_empty()).then_some(app.entry.sensor_index);
    let mut state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, chunks[0], &mut state);

    // Form
    let field = |label: &'static str, value: &str, editing: bool| {
        let shown = if editing {
            format!("{}_", app.input_buffer)
        } else if value.is_empty() {
            "-".to_string()
        } else {
            value.to_string()
        };
        let style = if editing { theme::input_style() } else { theme::value_style() };
        Line::from(vec![
            Span::styled(format!("  {label:<10}"), theme::label_style()),
            Span::styled(shown, style),
        ])
    };

    let sensor = app
        .entry_sensor()
        .map(|s| match s.unit.as_str() {
            "" => s.name.clone(),
            unit => format!("{} ({unit})", s.name),
        })
        .unwrap_or_default();

    let mut lines = vec![
        field("Sensor", &sensor, false),
        field("Value", &app.entry.value, app.input_mode == InputMode::EntryValue),
        field("Notes", &app.entry.notes, app.input_mode == InputMode::EntryNotes),
        Line::raw(""),
    ];

    if let Some(err) = &app.entry.error {
        lines.push(Line::from(Span::styled(format!("  {err}"), theme::error_style())));
    }
    match &app.submitter.status {
        Some(SubmitStatus::Sending) => {
            lines.push(Line::from(Span::styled("  Saving...", theme::input_style())));
        }
        Some(SubmitStatus::Saved) => {
            lines.push(Line::from(Span::styled("  Reading saved.", theme::ok_style())));
        }
        Some(SubmitStatus::Failed(msg)) => {
            lines.push(Line::from(Span::styled(
                format!("  Could not save: {msg}"),
                theme::error_style(),
            )));
        }
        None => {}
    }

    let block = Block::default()
        .title(Line::styled(" Manual reading ", theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style());
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        chunks[1],
    );
}
