use crate::actions::{command_for, Action, LaunchSpec};
use crate::worker::{AppEvent, ProbeJob};
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use mc_core::paths::{display_with_home, expand_home};
use mc_core::probe::groups_for;
use mc_core::projection;
use mc_core::{Config, Motion, MotionPrefix, Project, Registry, StatusUpdate, Viewport};
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Rows taken by the header, search box, chat box and footer.
pub const CHROME_HEIGHT: u16 = 8;

pub fn list_height(terminal_height: u16) -> usize {
    usize::from(terminal_height.saturating_sub(CHROME_HEIGHT)).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
    ChatCompose,
    Detail,
    Help,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Browse => "BROWSE",
            Mode::Search => "SEARCH",
            Mode::ChatCompose => "CHAT",
            Mode::Detail => "DETAIL",
            Mode::Help => "HELP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Sending,
    Reply(String),
    Failed(String),
}

/// A clickable button drawn in the current frame. Columns are absolute,
/// `end` exclusive; `row` is relative to the top of the list viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRegion {
    pub start: u16,
    pub end: u16,
    pub action: Action,
    pub row: usize,
}

/// Geometry produced by the last render. Replaced wholesale every frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameMap {
    pub list_area: Rect,
    pub regions: Vec<ActionRegion>,
}

/// Work the event loop must carry out after a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Quit,
    Reload {
        request: u64,
    },
    Probe {
        generation: u64,
        jobs: Vec<ProbeJob>,
    },
    Launch {
        action: Action,
        project: String,
        spec: LaunchSpec,
    },
    SendChat {
        message: String,
        cwd: PathBuf,
    },
}

pub struct App {
    pub config: Arc<Config>,
    pub registry: Registry,
    pub mode: Mode,
    pub filter: String,
    pub viewport: Viewport,
    pub prefix: MotionPrefix,
    pub chat_input: String,
    pub chat_cwd: PathBuf,
    pub chat: ChatState,
    pub loading: bool,
    pub pending_probes: usize,
    pub gateway_connected: bool,
    visible: Vec<usize>,
    detail: Option<String>,
    frame: FrameMap,
    load_request: u64,
    home: Option<PathBuf>,
}

impl App {
    pub fn new(config: Arc<Config>, terminal_height: u16) -> Self {
        let chat_cwd = config.projects_root.clone();
        Self {
            config,
            registry: Registry::new(),
            mode: Mode::Browse,
            filter: String::new(),
            viewport: Viewport::new(list_height(terminal_height)),
            prefix: MotionPrefix::default(),
            chat_input: String::new(),
            chat_cwd,
            chat: ChatState::Idle,
            loading: true,
            pending_probes: 0,
            gateway_connected: false,
            visible: Vec::new(),
            detail: None,
            frame: FrameMap::default(),
            load_request: 0,
            home: dirs::home_dir(),
        }
    }

    /// Registry indices of the projects currently shown, in order.
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    pub fn visible_project(&self, row: usize) -> Option<&Project> {
        let idx = *self.visible.get(row)?;
        self.registry.projects().get(idx)
    }

    pub fn selected_project(&self) -> Option<&Project> {
        let row = self.viewport.selected(self.visible.len())?;
        self.visible_project(row)
    }

    /// Name captured when Detail was entered.
    pub fn detail_name(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Current data for the detail view, looked up by name.
    pub fn detail_project(&self) -> Option<&Project> {
        self.registry.get(self.detail.as_deref()?)
    }

    pub fn chat_cwd_display(&self) -> String {
        display_with_home(&self.chat_cwd, self.home.as_deref())
    }

    pub fn set_frame(&mut self, frame: FrameMap) {
        if frame.list_area.height > 0 {
            self.viewport
                .set_height(usize::from(frame.list_area.height), self.visible.len());
        }
        self.frame = frame;
    }

    pub fn resize(&mut self, terminal_height: u16) {
        self.viewport
            .set_height(list_height(terminal_height), self.visible.len());
    }

    /// Starts a new load. Results for older requests are dropped on arrival.
    pub fn request_reload(&mut self) -> Effect {
        self.load_request += 1;
        self.loading = true;
        Effect::Reload {
            request: self.load_request,
        }
    }

    pub fn apply_event(&mut self, event: AppEvent) -> Option<Effect> {
        match event {
            AppEvent::ProjectsLoaded { request, projects } => {
                if request != self.load_request {
                    debug!(request, current = self.load_request, "dropping stale discovery result");
                    return None;
                }
                self.loading = false;
                let generation = self.registry.load(projects);
                self.refresh_projection();
                let jobs = self.probe_jobs();
                self.pending_probes = jobs.len();
                if jobs.is_empty() {
                    return None;
                }
                Some(Effect::Probe { generation, jobs })
            }
            AppEvent::Probe {
                generation,
                name,
                update,
            } => {
                if generation != self.registry.generation() {
                    debug!(generation, %name, "dropping probe result from an older load");
                    return None;
                }
                self.pending_probes = self.pending_probes.saturating_sub(1);
                if let Some(update) = update {
                    self.registry.apply_status_update(&name, update);
                    self.registry.recompute_derived();
                    self.refresh_projection();
                }
                None
            }
            AppEvent::ChatReply(result) => {
                self.chat = match result {
                    Ok(reply) => ChatState::Reply(reply),
                    Err(message) => ChatState::Failed(message),
                };
                None
            }
            AppEvent::Gateway(connected) => {
                self.gateway_connected = connected;
                None
            }
        }
    }

    fn probe_jobs(&self) -> Vec<ProbeJob> {
        self.registry
            .projects()
            .iter()
            .flat_map(|project| {
                let path = expand_home(&project.path);
                groups_for(project.discovered_kind)
                    .into_iter()
                    .map(move |group| ProbeJob {
                        name: project.name.clone(),
                        path: path.clone(),
                        group,
                    })
            })
            .collect()
    }

    fn refresh_projection(&mut self) {
        self.visible = projection::project(&self.filter, self.registry.projects());
        self.viewport.clamp(self.visible.len());
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Effect> {
        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            if self.mode == Mode::Browse {
                return Some(Effect::Quit);
            }
            self.mode = Mode::Browse;
            return None;
        }
        if key.code == KeyCode::Esc {
            if self.mode == Mode::Browse {
                self.prefix.clear();
            } else {
                self.cancel();
            }
            return None;
        }
        match self.mode {
            Mode::Browse => self.handle_browse_key(key, ctrl),
            Mode::Search => {
                self.handle_search_key(key, ctrl);
                None
            }
            Mode::ChatCompose => self.handle_chat_key(key, ctrl),
            Mode::Detail | Mode::Help => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Enter)
                    || (self.mode == Mode::Help && key.code == KeyCode::Char('?'))
                {
                    self.mode = Mode::Browse;
                }
                None
            }
        }
    }

    /// Back to Browse, dropping text entry, chat output and the filter.
    fn cancel(&mut self) {
        self.mode = Mode::Browse;
        self.chat_input.clear();
        if matches!(self.chat, ChatState::Reply(_) | ChatState::Failed(_)) {
            self.chat = ChatState::Idle;
        }
        if !self.filter.is_empty() {
            self.filter.clear();
            self.refresh_projection();
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent, ctrl: bool) -> Option<Effect> {
        if let (KeyCode::Char(ch), false) = (key.code, ctrl) {
            if self.prefix.push(ch) {
                return None;
            }
        }
        let count = self.prefix.take();
        let len = self.visible.len();

        if ctrl {
            match key.code {
                KeyCode::Char('d') => self.viewport.apply(Motion::HalfPageDown, count, len),
                KeyCode::Char('u') => self.viewport.apply(Motion::HalfPageUp, count, len),
                KeyCode::Char('r') => return Some(self.request_reload()),
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.viewport.apply(Motion::Down, count, len),
            KeyCode::Char('k') | KeyCode::Up => self.viewport.apply(Motion::Up, count, len),
            KeyCode::Char('g') | KeyCode::Home => self.viewport.apply(Motion::First, None, len),
            KeyCode::Char('G') | KeyCode::End => self.viewport.apply(Motion::Last, count, len),
            KeyCode::PageDown => self.viewport.apply(Motion::HalfPageDown, count, len),
            KeyCode::PageUp => self.viewport.apply(Motion::HalfPageUp, count, len),
            KeyCode::Char('q') => return Some(Effect::Quit),
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('?') => self.mode = Mode::Help,
            KeyCode::Char('C') => {
                self.chat_cwd = self.config.projects_root.clone();
                self.mode = Mode::ChatCompose;
            }
            KeyCode::Char('c') => {
                if let Some(project) = self.selected_project() {
                    self.chat_cwd = expand_home(&project.path);
                }
                self.mode = Mode::ChatCompose;
            }
            KeyCode::Enter => {
                if let Some(name) = self.selected_project().map(|p| p.name.clone()) {
                    self.detail = Some(name);
                    self.mode = Mode::Detail;
                }
            }
            KeyCode::Char(ch) => {
                let action = Action::from_key(ch)?;
                let name = self.selected_project()?.name.clone();
                return self.dispatch(action, &name);
            }
            _ => {}
        }
        None
    }

    fn handle_search_key(&mut self, key: KeyEvent, ctrl: bool) {
        match key.code {
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                return;
            }
            KeyCode::Backspace => {
                if self.filter.pop().is_none() {
                    return;
                }
            }
            KeyCode::Char(ch) if !ctrl => self.filter.push(ch),
            _ => return,
        }
        self.viewport.reset();
        self.refresh_projection();
    }

    fn handle_chat_key(&mut self, key: KeyEvent, ctrl: bool) -> Option<Effect> {
        match key.code {
            KeyCode::Enter => {
                if self.chat_input.trim().is_empty() {
                    return None;
                }
                let message = std::mem::take(&mut self.chat_input);
                self.chat = ChatState::Sending;
                Some(Effect::SendChat {
                    message,
                    cwd: self.chat_cwd.clone(),
                })
            }
            KeyCode::Backspace => {
                self.chat_input.pop();
                None
            }
            KeyCode::Char(ch) if !ctrl => {
                self.chat_input.push(ch);
                None
            }
            _ => None,
        }
    }

    /// Resolves `action` against the named project. Keyboard shortcuts and
    /// button clicks both land here.
    pub fn dispatch(&mut self, action: Action, name: &str) -> Option<Effect> {
        let project = self.registry.get(name)?;
        let was_running = project.running;
        let spec = command_for(action, project, &self.config)?;
        if action == Action::Run {
            self.registry
                .apply_status_update(name, StatusUpdate::Running(!was_running));
            self.registry.recompute_derived();
        }
        Some(Effect::Launch {
            action,
            project: name.to_string(),
            spec,
        })
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) -> Option<Effect> {
        if self.mode != Mode::Browse || self.loading {
            return None;
        }
        let len = self.visible.len();
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                return self.handle_click(event.column, event.row);
            }
            MouseEventKind::ScrollDown => {
                self.prefix.clear();
                self.viewport.apply(Motion::Down, None, len);
            }
            MouseEventKind::ScrollUp => {
                self.prefix.clear();
                self.viewport.apply(Motion::Up, None, len);
            }
            _ => {}
        }
        None
    }

    fn handle_click(&mut self, column: u16, row: u16) -> Option<Effect> {
        let area = self.frame.list_area;
        if !contains(area, column, row) {
            return None;
        }
        let line = usize::from(row - area.y);
        let target = self.viewport.row_at(line, self.visible.len())?;
        self.prefix.clear();

        let hit = self
            .frame
            .regions
            .iter()
            .find(|region| region.row == line && column >= region.start && column < region.end)
            .map(|region| region.action);
        if let Some(action) = hit {
            let name = self.visible_project(target)?.name.clone();
            return self.dispatch(action, &name);
        }
        self.viewport.select(target, self.visible.len());
        None
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
