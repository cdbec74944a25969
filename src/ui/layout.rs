use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// App name line plus the tab bar.
const HEADER_HEIGHT: u16 = 2;
const FOOTER_HEIGHT: u16 = 1;

pub struct AppLayout {
    pub header: Rect,
    pub body: Rect,
    pub footer: Rect,
}

pub fn compute_layout(area: Rect) -> AppLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(10),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    AppLayout {
        header: chunks[0],
        body: chunks[1],
        footer: chunks[2],
    }
}

/// Rows available inside the bordered body block, used for paging.
pub fn body_rows(area: Rect) -> usize {
    area.height
        .saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT + 2) as usize
}
