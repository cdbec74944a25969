use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::ui::help::centered_rect;
use crate::ui::theme;
use crate::ui::widgets::chart_panel;

const PANEL_HEIGHT: u16 = 10;
const COLUMNS: usize = 2;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let series = app.repo.panel_series(&app.panels, app.series_options);

    if series.is_empty() {
        let block = Block::default()
            .title(Line::styled(" Charts ", theme::title_style()))
            .borders(Borders::ALL)
            .border_style(theme::border_style());
        let mut lines = Vec::new();
        if let Some(err) = &app.refresher.last_error {
            lines.push(Line::from(Span::styled(format!("  {err}"), theme::error_style())));
        }
        let hint = if app.repo.sensors().is_empty() {
            "  No sensors loaded. Press r to refresh."
        } else {
            "  No charts. Press a to add a sensor."
        };
        lines.push(Line::from(Span::styled(hint, theme::label_style())));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    } else {
        // Page of panel rows that keeps the selected panel on screen.
        let rows_fit = (area.height / PANEL_HEIGHT).max(1) as usize;
        let per_page = rows_fit * COLUMNS;
        let first = (app.panel_selected / per_page) * per_page;
        let page = &series[first..(first + per_page).min(series.len())];

        let row_count = page.len().div_ceil(COLUMNS);
        let row_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                (0..rows_fit)
                    .map(|_| Constraint::Length(PANEL_HEIGHT))
                    .collect::<Vec<_>>(),
            )
            .split(area);

        for (row, chunk) in page.chunks(COLUMNS).enumerate().take(row_count) {
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
                .split(row_areas[row]);
            for (col, s) in chunk.iter().enumerate() {
                let index = first + row * COLUMNS + col;
                let selected = index == app.panel_selected;
                let unit = app
                    .repo
                    .sensor(s.sensor_id)
                    .map(|sensor| sensor.unit.as_str())
                    .unwrap_or("");
                chart_panel::render(
                    frame,
                    cells[col],
                    s,
                    unit,
                    theme::chart_color(index),
                    selected,
                    if selected { app.point_cursor } else { None },
                );
            }
        }
    }

    if let Some(index) = app.picker {
        render_picker(frame, area, app, index);
    }
}

fn render_picker(frame: &mut Frame, area: Rect, app: &App, index: usize) {
    let candidates = app.candidates();
    let height = (candidates.len() as u16 + 2).min(area.height);
    let popup = centered_rect(40, height, area);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem> = candidates
        .iter()
        .map(|s| ListItem::new(format!(" {}", s.name)))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .title(Line::styled(" Add sensor ", theme::title_style()))
                .borders(Borders::ALL)
                .border_style(theme::border_style())
                .style(ratatui::style::Style::default().bg(theme::BASE)),
        )
        .style(theme::value_style())
        .highlight_style(theme::highlight_style());
    let mut state = ListState::default().with_selected(Some(index));
    frame.render_stateful_widget(list, popup, &mut state);
}
