use chrono::Utc;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::tabs::Tab;
use super::theme;
use crate::app::App;
use crate::util::format_age;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(28)])
        .split(chunks[0]);

    // Top line: app name + API + signed-in user
    let mut info = vec![
        Span::styled(" aquamon ", theme::title_style()),
        Span::styled(format!("  {}", app.repo.gateway().base_url()), theme::value_style()),
    ];
    if let Some(user) = &app.session.user {
        info.push(Span::styled(format!("  {}", user.email), theme::label_style()));
    }
    frame.render_widget(
        Paragraph::new(Line::from(info)).style(theme::header_style()),
        top[0],
    );

    // Refresh state on the right
    let state = if app.refresher.is_busy() {
        Span::styled("refreshing... ", theme::input_style())
    } else if app.refresher.last_error.is_some() {
        Span::styled("refresh failed ", theme::error_style())
    } else if let Some(at) = app.refresher.last_success {
        Span::styled(
            format!("updated {} ", format_age(at, Utc::now())),
            theme::label_style(),
        )
    } else {
        Span::styled("no data yet ", theme::label_style())
    };
    frame.render_widget(
        Paragraph::new(Line::from(state))
            .alignment(Alignment::Right)
            .style(theme::header_style()),
        top[1],
    );

    // Tab bar
    let mut tab_spans = vec![Span::raw(" ")];
    for tab in &Tab::ALL {
        let label = format!(" {}:{} ", tab.index() + 1, tab.label());
        if *tab == app.current_tab {
            tab_spans.push(Span::styled(label, theme::active_tab_style()));
        } else {
            tab_spans.push(Span::styled(label, theme::inactive_tab_style()));
        }
        tab_spans.push(Span::raw(" "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(tab_spans)).style(theme::header_style()),
        chunks[1],
    );
}
