use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{App, InputMode};
use crate::ui::theme;

const GUIDES: &[(&str, &str)] = &[
    ("pH", "6.8-7.2 keeps fish, plants and bacteria all working."),
    ("Water temp", "22-29 C for most warm-water systems."),
    ("EC", "0.6-1.2 mS/cm; low values mean too few fish for the plants."),
    ("Ammonia", "Under 1 ppm. Cut feeding and check the biofilter if it climbs."),
    ("Oxygen", "Above 5 mg/L. Add air stones when water warms up."),
];

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(GUIDES.len() as u16 + 2),
            Constraint::Min(4),
        ])
        .split(area);

    let guide_lines: Vec<Line> = GUIDES
        .iter()
        .map(|(topic, text)| {
            Line::from(vec![
                Span::styled(format!("  {topic:<12}"), Style::default().fg(theme::TEAL)),
                Span::styled(*text, theme::value_style()),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(guide_lines).block(
            Block::default()
                .title(Line::styled(" Quick guide ", theme::title_style()))
                .borders(Borders::ALL)
                .border_style(theme::border_style()),
        ),
        chunks[0],
    );

    let mut lines: Vec<Line> = Vec::new();
    for message in &app.chat.messages {
        let (who, style) = if message.role == "user" {
            ("you", Style::default().fg(theme::BLUE))
        } else {
            ("assistant", Style::default().fg(theme::MAUVE))
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {who}: "), style),
            Span::styled(message.content.as_str(), theme::value_style()),
        ]));
    }
    if app.input_mode == InputMode::Chat {
        lines.push(Line::from(vec![
            Span::styled("  you: ", Style::default().fg(theme::BLUE)),
            Span::styled(format!("{}_", app.input_buffer), theme::input_style()),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Press i to ask about water quality, fish or plants.",
            theme::label_style(),
        )));
    }

    let chat = Paragraph::new(lines)
        .block(
            Block::default()
                .title(Line::styled(" Ask the assistant ", theme::title_style()))
                .borders(Borders::ALL)
                .border_style(theme::border_style()),
        )
        .wrap(Wrap { trim: false });
    let offset = app.scroll_offset.min(max_scroll(&chat, chunks[1]));
    frame.render_widget(chat.scroll((offset as u16, 0)), chunks[1]);
}

/// Last useful scroll offset for a bordered, wrapped paragraph drawn in
/// `area`. Counts rows after wrapping, not source lines.
fn max_scroll(paragraph: &Paragraph, area: Rect) -> usize {
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2) as usize;
    // line_count includes the two border rows.
    paragraph
        .line_count(inner_width)
        .saturating_sub(2 + inner_height)
}
