use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{App, AuthMode, InputMode};
use crate::ui::theme;

fn row<'a>(label: &'a str, value: Span<'a>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {label:<14}"), theme::label_style()),
        value,
    ])
}

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let url = if app.input_mode == InputMode::ApiUrl {
        Span::styled(format!("{}_", app.input_buffer), theme::input_style())
    } else {
        Span::styled(app.repo.gateway().base_url(), theme::value_style())
    };

    let mut lines = vec![
        Line::from(Span::styled("  Connection", theme::title_style())),
        row("API URL", url),
        row(
            "Refresh",
            Span::styled(
                match app.refresh_every {
                    Some(every) => format!("every {}s", every.as_secs()),
                    None => "manual".to_string(),
                },
                theme::value_style(),
            ),
        ),
        row(
            "Stored in",
            Span::styled(app.prefs.path().display().to_string(), theme::label_style()),
        ),
        Line::raw(""),
        Line::from(Span::styled("  Account", theme::title_style())),
    ];

    match &app.session.user {
        Some(user) => {
            lines.push(row("Signed in", Span::styled(user.email.as_str(), theme::ok_style())));
        }
        None => {
            let action = match app.auth.mode {
                AuthMode::Login => "Log in",
                AuthMode::Register => "Register",
            };
            match app.input_mode {
                InputMode::Email => {
                    lines.push(row(action, Span::raw("")));
                    lines.push(row(
                        "Email",
                        Span::styled(format!("{}_", app.input_buffer), theme::input_style()),
                    ));
                }
                InputMode::Password => {
                    lines.push(row(action, Span::raw("")));
                    lines.push(row("Email", Span::styled(app.auth.email.as_str(), theme::value_style())));
                    lines.push(row(
                        "Password",
                        Span::styled(
                            format!("{}_", "*".repeat(app.input_buffer.chars().count())),
                            theme::input_style(),
                        ),
                    ));
                }
                _ => lines.push(row("Signed in", Span::styled("no", theme::label_style()))),
            }
            if let Some(err) = &app.auth.error {
                lines.push(Line::from(Span::styled(format!("  {err}"), theme::error_style())));
            }
        }
    }

    let block = Block::default()
        .title(Line::styled(" Settings ", theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
