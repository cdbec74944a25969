use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

use crate::account::{self, Session, User};
use crate::assistant::Conversation;
use crate::config::Config;
use crate::data::entry::{EntrySubmitter, ManualEntry, SubmitStatus};
use crate::data::refresh::{RefreshOrchestrator, RefreshOutcome};
use crate::data::repository::{Endpoints, ReadingRepository};
use crate::data::series::SeriesOptions;
use crate::data::table::{ReadingSortField, ReadingTable};
use crate::data::{PanelSet, Sensor, SensorId};
use crate::event::{self, AppEvent};
use crate::gateway::{GatewayConfig, HttpGateway};
use crate::store::{Preferences, API_URL_KEY};
use crate::ui::tabs::Tab;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum InputMode {
    Normal,
    Filter,
    EntryValue,
    EntryNotes,
    Chat,
    ApiUrl,
    Email,
    Password,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AuthMode {
    Login,
    Register,
}

/// Manual entry form.
#[derive(Default)]
pub struct EntryForm {
    pub sensor_index: usize,
    pub value: String,
    pub notes: String,
    pub error: Option<String>,
}

pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub error: Option<String>,
}

pub struct App {
    pub running: bool,
    pub current_tab: Tab,
    pub repo: ReadingRepository,
    pub panels: PanelSet,
    pub refresher: RefreshOrchestrator,
    pub submitter: EntrySubmitter,
    pub prefs: Preferences,
    pub session: Session,
    pub chat: Conversation,
    pub table: ReadingTable,
    pub entry: EntryForm,
    pub auth: AuthForm,
    pub series_options: SeriesOptions,
    pub refresh_every: Option<Duration>,
    gateway_config: GatewayConfig,
    pub scroll_offset: usize,
    pub viewport_height: usize,
    pub panel_selected: usize,
    pub point_cursor: Option<usize>,
    pub picker: Option<usize>,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub status: Option<String>,
    pub show_help: bool,
}

impl App {
    pub fn new(config: &Config, mut prefs: Preferences, runtime: Handle) -> Self {
        let api_url = config.resolve_api_url(prefs.get_str(API_URL_KEY));
        let gateway_config = GatewayConfig::new(&api_url, config.timeout());
        let gateway = HttpGateway::new(gateway_config.clone());
        if let Err(e) = prefs.set(API_URL_KEY, &gateway.config().base_url) {
            log::warn!("could not persist API URL: {e}");
        }
        log::info!("using farm API at {}", gateway.config().base_url);

        let session = Session::restore(&mut prefs);

        Self {
            running: true,
            current_tab: Tab::Overview,
            repo: ReadingRepository::new(Arc::new(gateway), Endpoints::default()),
            panels: PanelSet::new(),
            refresher: RefreshOrchestrator::new(runtime.clone()),
            submitter: EntrySubmitter::new(runtime),
            prefs,
            session,
            chat: Conversation::default(),
            table: ReadingTable::new(),
            entry: EntryForm::default(),
            auth: AuthForm {
                mode: AuthMode::Login,
                email: String::new(),
                error: None,
            },
            series_options: config.series_options(),
            refresh_every: config.refresh_every(),
            gateway_config,
            scroll_offset: 0,
            viewport_height: 24,
            panel_selected: 0,
            point_cursor: None,
            picker: None,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            status: None,
            show_help: false,
        }
    }

    pub fn run(
        &mut self,
        terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    ) -> color_eyre::Result<()> {
        let mut last_refresh = Instant::now();
        let poll_timeout = Duration::from_millis(250);

        self.refresher.request(&self.repo);

        while self.running {
            terminal.draw(|frame| {
                self.viewport_height = crate::ui::layout::body_rows(frame.area());
                crate::ui::render(frame, self);
            })?;

            match event::poll_event(poll_timeout)? {
                AppEvent::Key(key) => self.handle_key(key),
                AppEvent::Mouse(mouse) => self.handle_mouse(mouse),
                AppEvent::Paste(text) => self.handle_paste(&text),
                AppEvent::Resize => {}
                AppEvent::Tick => {}
            }

            self.tick();

            if let Some(every) = self.refresh_every {
                if last_refresh.elapsed() >= every {
                    self.request_refresh();
                    last_refresh = Instant::now();
                }
            }
        }

        Ok(())
    }

    /// Picks up finished background work.
    pub fn tick(&mut self) {
        if let Some(outcome) = self.refresher.poll(&mut self.repo) {
            self.on_refreshed(outcome);
        }

        let saved = match self.submitter.poll() {
            Some(SubmitStatus::Saved) => true,
            Some(SubmitStatus::Failed(msg)) => {
                self.status = Some(format!("Entry not saved: {msg}"));
                false
            }
            _ => false,
        };
        if saved {
            self.status = Some("Entry saved".to_string());
            self.entry.value.clear();
            self.entry.notes.clear();
            self.request_refresh();
        }
    }

    pub fn on_refreshed(&mut self, outcome: RefreshOutcome) {
        match outcome {
            RefreshOutcome::Updated { sensors, readings } => {
                if self.panels.seed(self.repo.sensors()) {
                    log::debug!("showing all {} sensors", self.panels.len());
                }
                self.status = Some(format!("{sensors} sensors, {readings} readings"));
                self.clamp_selection();
            }
            RefreshOutcome::Failed(err) if err.is_timeout() => {
                self.status = Some("Farm API did not answer in time".to_string());
            }
            RefreshOutcome::Failed(err) => {
                self.status = Some(format!("Refresh failed: {err}"));
            }
        }
    }

    pub fn request_refresh(&mut self) {
        if !self.refresher.request(&self.repo) {
            self.status = Some("Refresh already in progress".to_string());
        }
    }

    fn clamp_selection(&mut self) {
        self.panel_selected = self.panel_selected.min(self.panels.len().saturating_sub(1));
        let sensor_count = self.repo.sensors().len();
        self.entry.sensor_index = self.entry.sensor_index.min(sensor_count.saturating_sub(1));
        if let Some(cursor) = self.point_cursor {
            let len = self.selected_series_len();
            self.point_cursor = (len > 0).then(|| cursor.min(len - 1));
        }
    }

    pub fn candidates(&self) -> Vec<&Sensor> {
        self.panels.candidates(self.repo.sensors())
    }

    pub fn selected_panel(&self) -> Option<SensorId> {
        self.panels.ids().get(self.panel_selected).copied()
    }

    fn selected_series_len(&self) -> usize {
        self.selected_panel()
            .map(|id| self.repo.series(id, self.series_options).len())
            .unwrap_or(0)
    }

    pub fn entry_sensor(&self) -> Option<&Sensor> {
        self.repo.sensors().get(self.entry.sensor_index)
    }

    pub fn add_panel(&mut self, id: Option<SensorId>) {
        if self.panels.add(id) {
            self.panel_selected = self.panels.len() - 1;
            self.point_cursor = None;
        }
    }

    pub fn remove_selected_panel(&mut self) {
        if let Some(id) = self.selected_panel() {
            self.panels.remove(id);
            self.point_cursor = None;
            self.clamp_selection();
        }
    }

    pub fn set_api_url(&mut self, url: &str) {
        let url = url.trim();
        if url.is_empty() {
            return;
        }
        self.gateway_config = self.gateway_config.with_base_url(url);
        let base = self.gateway_config.base_url.clone();
        let gateway = HttpGateway::new(self.gateway_config.clone());
        self.repo = self.repo.with_gateway(Arc::new(gateway));
        if let Err(e) = self.prefs.set(API_URL_KEY, &base) {
            log::warn!("could not persist API URL: {e}");
        }
        log::info!("API URL changed to {base}");
        self.status = Some(format!("API URL set to {base}"));
        // A refresh still running against the old URL must not land here.
        self.refresher.cancel();
        self.request_refresh();
    }

    fn submit_entry(&mut self) {
        let Some(sensor_id) = self.entry_sensor().map(|s| s.sensor_id) else {
            self.entry.error = Some("No sensors loaded yet".to_string());
            return;
        };
        match ManualEntry::parse(sensor_id, &self.entry.value, &self.entry.notes) {
            Ok(entry) => {
                self.entry.error = None;
                let token = self.session.token().map(str::to_string);
                if !self.submitter.submit(&self.repo, entry, token) {
                    self.status = Some("Previous entry still sending".to_string());
                }
            }
            Err(msg) => self.entry.error = Some(msg),
        }
    }

    fn complete_auth(&mut self, password: &str) {
        let email = self.auth.email.clone();
        let result = match self.auth.mode {
            AuthMode::Login => account::login(&email, password),
            AuthMode::Register => account::register(&email, password),
        };
        match result {
            Ok(user) => self.sign_in(user),
            Err(e) => self.auth.error = Some(e.to_string()),
        }
    }

    fn sign_in(&mut self, user: User) {
        self.auth.error = None;
        self.status = Some(format!("Signed in as {}", user.email));
        if let Err(e) = self.session.sign_in(&mut self.prefs, user) {
            log::warn!("could not persist user: {e}");
        }
    }

    fn sign_out(&mut self) {
        if self.session.user.is_none() {
            return;
        }
        if let Err(e) = self.session.sign_out(&mut self.prefs) {
            log::warn!("could not clear stored user: {e}");
        }
        self.status = Some("Signed out".to_string());
    }

    fn begin_input(&mut self, mode: InputMode, initial: &str) {
        self.input_mode = mode;
        self.input_buffer = initial.to_string();
    }

    fn finish_input(&mut self) {
        let text = std::mem::take(&mut self.input_buffer);
        let mode = self.input_mode;
        self.input_mode = InputMode::Normal;
        match mode {
            InputMode::Normal => {}
            InputMode::Filter => {
                self.table.filter = text.trim().to_string();
                self.scroll_offset = 0;
            }
            InputMode::EntryValue => self.entry.value = text.trim().to_string(),
            InputMode::EntryNotes => self.entry.notes = text,
            InputMode::Chat => {
                if !text.trim().is_empty() {
                    self.chat.ask(&text);
                    // Jump to the newest answer.
                    self.scroll_offset = usize::MAX;
                }
            }
            InputMode::ApiUrl => self.set_api_url(&text),
            InputMode::Email => {
                self.auth.email = text.trim().to_string();
                self.begin_input(InputMode::Password, "");
            }
            InputMode::Password => self.complete_auth(&text),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        // Help overlay
        if self.show_help {
            self.show_help = false;
            return;
        }

        // Text input
        if self.input_mode != InputMode::Normal {
            match key.code {
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.input_buffer.clear();
                }
                KeyCode::Enter => self.finish_input(),
                KeyCode::Backspace => {
                    self.input_buffer.pop();
                }
                KeyCode::Char(c) => {
                    self.input_buffer.push(c);
                }
                _ => {}
            }
            return;
        }

        // Sensor picker on the dashboard
        if let Some(index) = self.picker {
            let count = self.candidates().len();
            match key.code {
                KeyCode::Esc => self.picker = None,
                KeyCode::Char('j') | KeyCode::Down if count > 0 => {
                    self.picker = Some((index + 1).min(count - 1));
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.picker = Some(index.saturating_sub(1));
                }
                KeyCode::Enter => {
                    let id = self.candidates().get(index).map(|s| s.sensor_id);
                    self.add_panel(id);
                    self.picker = None;
                }
                _ => {}
            }
            return;
        }

        // Global keys
        match key.code {
            KeyCode::Char('q') => {
                self.running = false;
                return;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
                return;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
                return;
            }
            _ => {}
        }

        match key.code {
            KeyCode::Char(c @ '1'..='6') => {
                if let Some(tab) = Tab::from_index(c as usize - '1' as usize) {
                    self.switch_tab(tab);
                }
            }
            KeyCode::Tab => self.switch_tab(self.current_tab.next()),
            KeyCode::BackTab => self.switch_tab(self.current_tab.prev()),
            KeyCode::F(n) if (1..=6).contains(&n) => {
                if let Some(tab) = Tab::from_index(n as usize - 1) {
                    self.switch_tab(tab);
                }
            }

            KeyCode::Char('r') => self.request_refresh(),

            // Dashboard
            KeyCode::Char('j') | KeyCode::Down if self.current_tab == Tab::Dashboard => {
                if !self.panels.is_empty() {
                    self.panel_selected = (self.panel_selected + 1).min(self.panels.len() - 1);
                    self.point_cursor = None;
                }
            }
            KeyCode::Char('k') | KeyCode::Up if self.current_tab == Tab::Dashboard => {
                self.panel_selected = self.panel_selected.saturating_sub(1);
                self.point_cursor = None;
            }
            KeyCode::Char('x') if self.current_tab == Tab::Dashboard => {
                self.remove_selected_panel();
            }
            KeyCode::Char('a') if self.current_tab == Tab::Dashboard => {
                if !self.candidates().is_empty() {
                    self.picker = Some(0);
                }
            }
            KeyCode::Char('l') | KeyCode::Right if self.current_tab == Tab::Dashboard => {
                let len = self.selected_series_len();
                if len > 0 {
                    self.point_cursor = Some(match self.point_cursor {
                        Some(i) => (i + 1).min(len - 1),
                        None => len - 1,
                    });
                }
            }
            KeyCode::Char('h') | KeyCode::Left if self.current_tab == Tab::Dashboard => {
                let len = self.selected_series_len();
                if len > 0 {
                    self.point_cursor = Some(match self.point_cursor {
                        Some(i) => i.saturating_sub(1),
                        None => len - 1,
                    });
                }
            }
            KeyCode::Esc if self.current_tab == Tab::Dashboard => self.point_cursor = None,

            // Readings table
            KeyCode::Char('/') if self.current_tab == Tab::Readings => {
                let current = self.table.filter.clone();
                self.begin_input(InputMode::Filter, &current);
            }
            KeyCode::Char('t') if self.current_tab == Tab::Readings => {
                self.table.set_sort_field(ReadingSortField::Time);
            }
            KeyCode::Char('s') if self.current_tab == Tab::Readings => {
                self.table.set_sort_field(ReadingSortField::Sensor);
            }
            KeyCode::Char('v') if self.current_tab == Tab::Readings => {
                self.table.set_sort_field(ReadingSortField::Value);
            }

            // Manual entry
            KeyCode::Char('j') | KeyCode::Down if self.current_tab == Tab::Entry => {
                let count = self.repo.sensors().len();
                if count > 0 {
                    self.entry.sensor_index = (self.entry.sensor_index + 1).min(count - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up if self.current_tab == Tab::Entry => {
                self.entry.sensor_index = self.entry.sensor_index.saturating_sub(1);
            }
            KeyCode::Char('e') if self.current_tab == Tab::Entry => {
                let current = self.entry.value.clone();
                self.begin_input(InputMode::EntryValue, &current);
            }
            KeyCode::Char('n') if self.current_tab == Tab::Entry => {
                let current = self.entry.notes.clone();
                self.begin_input(InputMode::EntryNotes, &current);
            }
            KeyCode::Enter if self.current_tab == Tab::Entry => self.submit_entry(),

            // Learn
            KeyCode::Char('i') if self.current_tab == Tab::Learn => {
                self.begin_input(InputMode::Chat, "");
            }
            KeyCode::Char('C') if self.current_tab == Tab::Learn => {
                self.chat.clear();
                self.scroll_offset = 0;
            }

            // Settings
            KeyCode::Char('u') if self.current_tab == Tab::Settings => {
                let current = self.repo.gateway().base_url().to_string();
                self.begin_input(InputMode::ApiUrl, &current);
            }
            KeyCode::Char('l') if self.current_tab == Tab::Settings => {
                if self.session.user.is_none() {
                    self.auth.mode = AuthMode::Login;
                    self.auth.error = None;
                    self.begin_input(InputMode::Email, "");
                }
            }
            KeyCode::Char('n') if self.current_tab == Tab::Settings => {
                if self.session.user.is_none() {
                    self.auth.mode = AuthMode::Register;
                    self.auth.error = None;
                    self.begin_input(InputMode::Email, "");
                }
            }
            KeyCode::Char('o') if self.current_tab == Tab::Settings => self.sign_out(),

            // Scrolling elsewhere
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
            }
            KeyCode::Char('g') => self.scroll_offset = 0,
            KeyCode::Char('G') => self.scroll_offset = usize::MAX,
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_add(self.viewport_height);
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(self.viewport_height);
            }

            _ => {}
        }
    }

    /// Pasted text goes into the active input field, newlines dropped.
    pub fn handle_paste(&mut self, text: &str) {
        if self.input_mode == InputMode::Normal {
            return;
        }
        self.input_buffer
            .extend(text.chars().filter(|c| !c.is_control()));
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.scroll_offset = 0;
        self.picker = None;
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.show_help || self.picker.is_some() {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                self.show_help = false;
                self.picker = None;
            }
            return;
        }

        match mouse.kind {
            MouseEventKind::ScrollUp => {
                if self.current_tab == Tab::Dashboard {
                    self.panel_selected = self.panel_selected.saturating_sub(1);
                } else {
                    self.scroll_offset = self.scroll_offset.saturating_sub(3);
                }
            }
            MouseEventKind::ScrollDown => {
                if self.current_tab == Tab::Dashboard {
                    if !self.panels.is_empty() {
                        self.panel_selected =
                            (self.panel_selected + 1).min(self.panels.len() - 1);
                    }
                } else {
                    self.scroll_offset = self.scroll_offset.saturating_add(3);
                }
            }
            MouseEventKind::Down(crossterm::event::MouseButton::Left) => {
                // Tab bar is on row 1 (second row of header)
                if mouse.row == 1 {
                    self.handle_tab_click(mouse.column);
                }
            }
            _ => {}
        }
    }

    fn handle_tab_click(&mut self, col: u16) {
        // Tab bar format: " N:Label  N:Label  ..."
        let mut x: u16 = 1;
        for tab in &Tab::ALL {
            let label = format!(" {}:{} ", tab.index() + 1, tab.label());
            let width = label.len() as u16;
            if col >= x && col < x + width {
                self.switch_tab(*tab);
                return;
            }
            x += width + 1;
        }
    }
}
