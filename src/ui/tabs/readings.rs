use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row};
use ratatui::Frame;

use crate::app::App;
use crate::data::table::ReadingSortField;
use crate::ui::theme;
use crate::ui::widgets::sortable_table::{self, SortableColumn};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let table = &app.table;

    let area = match &app.refresher.last_error {
        Some(err) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(3)])
                .split(area);
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" Error: {err}"), theme::error_style())),
                chunks[0],
            );
            chunks[1]
        }
        None => area,
    };

    let rows = table.rows(&app.repo);
    let title = if table.filter.is_empty() {
        format!("Readings ({})", rows.len())
    } else {
        format!(
            "Readings ({}/{}) [filter: {}]",
            rows.len(),
            app.repo.readings().len(),
            table.filter
        )
    };

    if rows.is_empty() {
        let block = Block::default()
            .title(Line::styled(format!(" {title} "), theme::title_style()))
            .borders(Borders::ALL)
            .border_style(theme::border_style());
        frame.render_widget(
            Paragraph::new(Span::styled("  No readings found.", theme::label_style()))
                .block(block),
            area,
        );
        return;
    }

    let column = |title: &'static str, width: Constraint, field: ReadingSortField| SortableColumn {
        title,
        width,
        is_sorted: table.sort_field == field,
        ascending: table.sort_ascending,
    };
    let columns = [
        column("Time", Constraint::Length(16), ReadingSortField::Time),
        column("Sensor", Constraint::Min(20), ReadingSortField::Sensor),
        column("Value", Constraint::Length(14), ReadingSortField::Value),
    ];

    let visible_rows = area.height.saturating_sub(3) as usize; // borders + header
    let offset = app.scroll_offset.min(rows.len().saturating_sub(visible_rows));
    let rows: Vec<Row> = rows
        .into_iter()
        .skip(offset)
        .take(visible_rows)
        .map(|r| Row::new(vec![r.time_label, r.sensor, r.value]))
        .collect();

    sortable_table::render(frame, area, &title, &columns, rows, None);
}
