use ratatui::layout::{Constraint, Rect};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Row, Table, TableState};
use ratatui::Frame;

use crate::ui::theme;

pub struct SortableColumn {
    pub title: &'static str,
    pub width: Constraint,
    pub is_sorted: bool,
    pub ascending: bool,
}

impl SortableColumn {
    pub fn header_text(&self) -> String {
        if self.is_sorted {
            let arrow = if self.ascending { " ^" } else { " v" };
            format!("{}{}", self.title, arrow)
        } else {
            self.title.to_string()
        }
    }
}

/// Table whose header marks the sorted column with an arrow.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    columns: &[SortableColumn],
    rows: Vec<Row>,
    highlight_index: Option<usize>,
) {
    let header_cells: Vec<String> = columns.iter().map(|c| c.header_text()).collect();
    let header = Row::new(header_cells).style(theme::label_style()).height(1);

    let widths: Vec<Constraint> = columns.iter().map(|c| c.width).collect();

    let block = Block::default()
        .title(Line::styled(format!(" {title} "), theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style());

    let table = Table::new(rows, &widths)
        .header(header)
        .block(block)
        .row_highlight_style(theme::highlight_style());

    match highlight_index {
        Some(idx) => {
            let mut state = TableState::default().with_selected(Some(idx));
            frame.render_stateful_widget(table, area, &mut state);
        }
        None => frame.render_widget(table, area),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_column_shows_direction() {
        let mut column = SortableColumn {
            title: "Value",
            width: Constraint::Length(10),
            is_sorted: false,
            ascending: true,
        };
        assert_eq!(column.header_text(), "Value");
        column.is_sorted = true;
        assert_eq!(column.header_text(), "Value ^");
        column.ascending = false;
        assert_eq!(column.header_text(), "Value v");
    }
}
