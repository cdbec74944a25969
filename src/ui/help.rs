use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::theme;

pub fn render(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 34, area);
    frame.render_widget(Clear, popup);

    let lines = vec![
        header_line("Navigation"),
        key_line("1-6", "Switch to tab by number"),
        key_line("Tab / Shift+Tab", "Cycle through tabs"),
        key_line("F1-F6", "Switch to tab by function key"),
        Line::raw(""),
        header_line("General"),
        key_line("r", "Refresh sensors and readings"),
        key_line("j / k, g / G", "Scroll, jump to top / bottom"),
        key_line("?", "Toggle this help"),
        key_line("q / Ctrl+C", "Quit"),
        Line::raw(""),
        header_line("Dashboard"),
        key_line("j / k", "Select chart panel"),
        key_line("h / l", "Inspect points of the selected chart"),
        key_line("a", "Add a sensor panel"),
        key_line("x", "Remove the selected panel"),
        Line::raw(""),
        header_line("Readings"),
        key_line("t / s / v", "Sort by time / sensor / value"),
        key_line("/", "Filter by sensor name"),
        Line::raw(""),
        header_line("Entry"),
        key_line("j / k", "Choose sensor"),
        key_line("e / n", "Edit value / notes"),
        key_line("Enter", "Save the reading"),
        Line::raw(""),
        header_line("Learn"),
        key_line("i", "Ask the assistant"),
        key_line("C", "Clear the conversation"),
        Line::raw(""),
        header_line("Settings"),
        key_line("u", "Change API URL"),
        key_line("l / n / o", "Log in / register / log out"),
    ];

    let block = Block::default()
        .title(Line::styled(" Help ", theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style())
        .style(ratatui::style::Style::default().bg(theme::BASE));

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, popup);
}

fn header_line(text: &str) -> Line<'_> {
    Line::from(Span::styled(format!("  {text}"), theme::title_style()))
}

fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("    {key:<20}"), theme::key_hint_style()),
        Span::styled(desc, theme::label_style()),
    ])
}

pub fn centered_rect(width_pct: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .flex(Flex::Center)
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_pct) / 2),
            Constraint::Percentage(width_pct),
            Constraint::Percentage((100 - width_pct) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
