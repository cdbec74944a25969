pub mod footer;
pub mod header;
pub mod help;
pub mod layout;
pub mod tabs;
pub mod theme;
pub mod widgets;

use ratatui::Frame;

use crate::app::App;
use tabs::Tab;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let app_layout = layout::compute_layout(area);

    header::render(frame, app_layout.header, app);

    // Body - dispatch to current tab
    match app.current_tab {
        Tab::Overview => tabs::overview::render(frame, app_layout.body, app),
        Tab::Dashboard => tabs::dashboard::render(frame, app_layout.body, app),
        Tab::Readings => tabs::readings::render(frame, app_layout.body, app),
        Tab::Entry => tabs::entry::render(frame, app_layout.body, app),
        Tab::Learn => tabs::learn::render(frame, app_layout.body, app),
        Tab::Settings => tabs::settings::render(frame, app_layout.body, app),
    }

    footer::render(frame, app_layout.footer, app);

    if app.show_help {
        help::render(frame, area);
    }
}
