use chrono::Utc;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Frame;

use crate::app::App;
use crate::data::series::format_full;
use crate::ui::theme;
use crate::util::{format_age, format_value, with_unit};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(4)])
        .split(area);

    render_summary(frame, chunks[0], app);
    render_latest(frame, chunks[1], app);
}

fn render_summary(frame: &mut Frame, area: Rect, app: &App) {
    let snapshot = app.repo.snapshot();
    let updated = match app.refresher.last_success {
        Some(at) => format_age(at, Utc::now()),
        None => "never".to_string(),
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("  Sensors    ", theme::label_style()),
            Span::styled(snapshot.sensors.len().to_string(), theme::value_style()),
            Span::styled("    Readings  ", theme::label_style()),
            Span::styled(snapshot.readings.len().to_string(), theme::value_style()),
            Span::styled("    Charts  ", theme::label_style()),
            Span::styled(app.panels.len().to_string(), theme::value_style()),
        ]),
        Line::from(vec![
            Span::styled("  Updated    ", theme::label_style()),
            Span::styled(updated, theme::value_style()),
        ]),
    ];
    match &app.refresher.last_error {
        Some(err) => lines.push(Line::from(vec![
            Span::styled("  Error      ", theme::label_style()),
            Span::styled(err.clone(), theme::error_style()),
        ])),
        None => lines.push(Line::from(Span::styled("  Connected", theme::ok_style()))),
    }
    for warning in snapshot.warnings.iter().take(1) {
        lines.push(Line::from(vec![
            Span::styled("  Warning    ", theme::label_style()),
            Span::styled(warning.clone(), theme::input_style()),
        ]));
    }

    let block = Block::default()
        .title(Line::styled(" Farm ", theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_latest(frame: &mut Frame, area: Rect, app: &App) {
    let latest = app.repo.latest_readings();
    let block = Block::default()
        .title(Line::styled(" Latest readings ", theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style());

    if latest.is_empty() {
        let text = if app.refresher.is_busy() { "Loading..." } else { "No sensors found." };
        frame.render_widget(
            Paragraph::new(Span::styled(format!("  {text}"), theme::label_style())).block(block),
            area,
        );
        return;
    }

    let visible = area.height.saturating_sub(3) as usize;
    let offset = app.scroll_offset.min(latest.len().saturating_sub(visible));
    let rows: Vec<Row> = latest
        .iter()
        .skip(offset)
        .take(visible)
        .map(|entry| {
            let (value, time) = match entry.reading {
                Some(r) => (
                    with_unit(&format_value(&r.value), &entry.sensor.unit),
                    r.time()
                        .as_ref()
                        .map(format_full)
                        .unwrap_or_else(|| r.timestamp.clone()),
                ),
                None => ("-".to_string(), String::new()),
            };
            Row::new(vec![entry.sensor.name.clone(), value, time])
        })
        .collect();

    let header = Row::new(vec!["Sensor", "Latest", "When"]).style(theme::label_style());
    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(16),
            Constraint::Length(16),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}
