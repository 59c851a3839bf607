use crate::actions::Action;
use crate::state::{ActionRegion, App, ChatState, FrameMap, Mode};
use crate::theme::{self, icons};
use chrono::{DateTime, Utc};
use mc_core::viewport::scrollbar_thumb;
use mc_core::{DeployState, Project, ProjectKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const NAME_WIDTH: usize = 18;
const TIME_WIDTH: usize = 4;
const COUNT_WIDTH: usize = 3;

pub fn render(f: &mut Frame, app: &App) -> FrameMap {
    render_at(f, app, Utc::now())
}

/// Draws one frame and returns the geometry the input router needs to map
/// clicks. `now` anchors the relative commit times.
pub fn render_at(f: &mut Frame, app: &App, now: DateTime<Utc>) -> FrameMap {
    let area = f.size();
    if app.loading && app.registry.is_empty() {
        render_loading(f, app, area);
        return FrameMap::default();
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_search(f, app, chunks[1]);
    let regions = match app.mode {
        Mode::Detail => {
            render_detail(f, app, chunks[2], now);
            Vec::new()
        }
        Mode::Help => {
            render_help(f, chunks[2]);
            Vec::new()
        }
        _ => render_list(f, app, chunks[2], now),
    };
    render_chat(f, app, chunks[3]);
    render_footer(f, app, chunks[4]);

    FrameMap {
        list_area: chunks[2],
        regions,
    }
}

fn render_loading(f: &mut Frame, app: &App, area: Rect) {
    let root = app.chat_cwd_display();
    let lines = vec![
        Line::from(Span::styled(
            format!("{} Mission Control", icons::ROCKET),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Loading projects from {root} {}", icons::THINKING),
            Style::default().fg(theme::MUTED),
        )),
    ];
    let top = area.height.saturating_sub(3) / 2;
    let centered = Rect {
        y: area.y + top,
        height: area.height.saturating_sub(top),
        ..area
    };
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), centered);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let stats = app.registry.stats();
    let left = vec![
        Span::styled(format!(" {} Mission Control ", icons::ROCKET), theme::HEADER_STYLE),
        Span::styled(
            format!(
                " {} {}{} {}{} {}{} {}{} ",
                icons::WEB,
                stats.deploy_ready,
                icons::READY,
                stats.deploy_building,
                icons::BUILDING,
                stats.deploy_queued,
                icons::QUEUED,
                stats.deploy_failed,
                icons::FAILED,
            ),
            theme::segment(theme::WEB),
        ),
        Span::styled(
            format!(
                " {} {}{} {}{} {}{} ",
                icons::GIT,
                icons::STAGED,
                stats.total_staged,
                icons::UNTRACKED,
                stats.total_untracked,
                icons::MODIFIED,
                stats.total_modified,
            ),
            theme::segment(theme::GIT),
        ),
        Span::styled(
            format!(
                " {} {}{} {}{} ",
                icons::HOSTING,
                icons::ISSUE,
                stats.total_issues,
                icons::PULL_REQUEST,
                stats.total_prs,
            ),
            theme::segment(theme::HOSTING),
        ),
    ];
    let right = vec![Span::styled(
        format!(" {} {} running ", icons::PLAY, stats.running),
        theme::segment(theme::MINT),
    )];
    f.render_widget(Paragraph::new(Line::from(spread(left, right, area.width))), area);
}

fn render_search(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.mode == Mode::Search;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            theme::FOCUSED_BOX_STYLE
        } else {
            theme::BOX_STYLE
        })
        .title(format!(" {} search ", icons::SEARCH));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let line = if app.filter.is_empty() && !focused {
        Line::from(Span::styled(
            "press / to filter projects",
            Style::default().fg(theme::MUTED),
        ))
    } else {
        Line::from(app.filter.as_str())
    };
    f.render_widget(Paragraph::new(line), inner);
    if focused {
        place_cursor(f, inner, &app.filter);
    }
}

fn render_list(f: &mut Frame, app: &App, area: Rect, now: DateTime<Utc>) -> Vec<ActionRegion> {
    if area.height == 0 || area.width < 2 {
        return Vec::new();
    }
    let visible = app.visible();
    if visible.is_empty() {
        let message = if app.filter.is_empty() {
            "No projects found. Press Ctrl+R to reload.".to_string()
        } else {
            format!("No projects match \"{}\".", app.filter)
        };
        f.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(theme::MUTED))),
            area,
        );
        return Vec::new();
    }

    let row_width = area.width - 1;
    let scroll = app.viewport.scroll();
    let selection = app.viewport.selected(visible.len());
    let mut regions = Vec::new();

    for line in 0..usize::from(area.height) {
        let row = scroll + line;
        let Some(project) = app.visible_project(row) else {
            break;
        };
        let (spans, buttons) = build_row(project, usize::from(row_width), now);
        let style = if selection == Some(row) {
            theme::SELECTED_STYLE
        } else {
            theme::zebra_row_style(row)
        };
        let y = area.y + line as u16;
        f.render_widget(
            Paragraph::new(Line::from(spans)).style(style),
            Rect::new(area.x, y, row_width, 1),
        );
        regions.extend(buttons.into_iter().map(|(start, end, action)| ActionRegion {
            start: area.x + start,
            end: area.x + end,
            action,
            row: line,
        }));
    }

    render_scrollbar(f, app, Rect::new(area.x + row_width, area.y, 1, area.height));
    regions
}

fn render_scrollbar(f: &mut Frame, app: &App, area: Rect) {
    let len = app.visible().len();
    let track = usize::from(area.height);
    if len <= track {
        return;
    }
    let (position, thumb) = scrollbar_thumb(app.viewport.selection(), len, track);
    let lines: Vec<Line> = (0..track)
        .map(|cell| {
            if cell >= position && cell < position + thumb {
                Line::from(Span::styled(icons::THUMB, Style::default().fg(theme::GIT)))
            } else {
                Line::from(Span::styled(icons::TRACK, theme::BOX_STYLE))
            }
        })
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

/// Builds one list row. Returns the styled spans and the button columns as
/// `(start, end, action)` offsets into the row, `end` exclusive. Buttons that
/// do not fit in `width` cells get no region.
pub fn build_row(
    project: &Project,
    width: usize,
    now: DateTime<Utc>,
) -> (Vec<Span<'static>>, Vec<(u16, u16, Action)>) {
    let muted = Style::default().fg(theme::MUTED);
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(
            theme::kind_icon(project.kind),
            Style::default().fg(theme::kind_color(project.kind)),
        ),
        Span::raw(" "),
        Span::styled(
            fit(&project.name, NAME_WIDTH),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];

    let deploy = if project.kind == ProjectKind::Vercel {
        deploy_icon(project.deploy.as_ref())
    } else {
        " "
    };
    spans.push(Span::styled(
        deploy,
        Style::default().fg(theme::deploy_color(project.deploy.as_ref())),
    ));

    let commits = project.commits.unwrap_or_default();
    let known = project.commits.is_some();
    let first = if known { format_since(commits.first, now) } else { "-".to_string() };
    let last = if known { format_since(commits.last, now) } else { "-".to_string() };
    spans.push(Span::styled(
        format!(
            " {}{} {}{}",
            icons::FIRST_COMMIT,
            pad(&first, TIME_WIDTH),
            icons::LAST_COMMIT,
            pad(&last, TIME_WIDTH)
        ),
        muted,
    ));

    let git = project.git.as_ref();
    spans.push(Span::styled(
        format!(
            " {}{} {}{} {}{}",
            icons::STAGED,
            count(git.map(|g| g.staged)),
            icons::UNTRACKED,
            count(git.map(|g| g.untracked)),
            icons::MODIFIED,
            count(git.map(|g| g.modified)),
        ),
        Style::default().fg(theme::GIT),
    ));

    let hosting = project.hosting.as_ref();
    spans.push(Span::styled(
        format!(
            " {}{} {}{}",
            icons::ISSUE,
            count(hosting.map(|h| h.issues)),
            icons::PULL_REQUEST,
            count(hosting.map(|h| h.pull_requests)),
        ),
        Style::default().fg(theme::HOSTING),
    ));

    let left_width: usize = spans.iter().map(|span| span.content.width()).sum();
    let labels: Vec<(&'static str, Action)> = Action::BUTTONS
        .iter()
        .map(|action| (button_icon(*action, project.running), *action))
        .collect();
    // One leading space, a space between buttons, one trailing space.
    let buttons_width: usize =
        labels.iter().map(|(icon, _)| icon.width()).sum::<usize>() + labels.len() + 1;
    let gap = width.saturating_sub(left_width + buttons_width).max(1);
    spans.push(Span::raw(" ".repeat(gap)));

    let mut regions = Vec::new();
    let mut column = left_width + gap + 1;
    spans.push(Span::raw(" "));
    for (idx, (icon, action)) in labels.into_iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw(" "));
            column += 1;
        }
        let end = column + icon.width();
        if end <= width {
            regions.push((column as u16, end as u16, action));
        }
        spans.push(Span::styled(icon, Style::default().add_modifier(Modifier::BOLD)));
        column = end;
    }
    spans.push(Span::raw(" "));
    (spans, regions)
}

fn button_icon(action: Action, running: bool) -> &'static str {
    match action {
        Action::Push => icons::PUSH,
        Action::Merge => icons::MERGE,
        Action::Run if running => icons::PAUSE,
        Action::Run => icons::PLAY,
        Action::Deploy => icons::DEPLOY,
        Action::Readme => icons::README,
        Action::Roadmap => icons::ROADMAP,
        Action::Plan => icons::PLAN,
        Action::Todo => icons::TODO,
        Action::AgentChat => icons::AGENT,
        Action::Open | Action::GitTui | Action::Production => " ",
    }
}

fn deploy_icon(state: Option<&DeployState>) -> &'static str {
    match state {
        Some(DeployState::Ready) => icons::READY,
        Some(DeployState::Building) => icons::BUILDING,
        Some(DeployState::Queued) => icons::QUEUED,
        Some(DeployState::Failed) => icons::FAILED,
        Some(DeployState::Other(_)) => "?",
        None => "-",
    }
}

fn render_chat(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.mode == Mode::ChatCompose;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            theme::FOCUSED_BOX_STYLE
        } else {
            theme::BOX_STYLE
        })
        .title(format!(" {} chat {} ", icons::CHAT, app.chat_cwd_display()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let muted = Style::default().fg(theme::MUTED);
    let line = if focused {
        Line::from(app.chat_input.as_str())
    } else {
        match &app.chat {
            ChatState::Idle => Line::from(Span::styled(
                "c: ask about the selected project   C: ask about the portfolio",
                muted,
            )),
            ChatState::Sending => {
                Line::from(Span::styled(format!("{} waiting for reply", icons::THINKING), muted))
            }
            ChatState::Reply(text) => Line::from(text.as_str()),
            ChatState::Failed(message) => Line::from(Span::styled(
                format!("{} {message}", icons::FAILED),
                Style::default().fg(theme::ERROR),
            )),
        }
    };
    f.render_widget(Paragraph::new(line), inner);
    if focused {
        place_cursor(f, inner, &app.chat_input);
    }
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let stats = app.registry.stats();
    let muted = Style::default().fg(theme::MUTED);
    let mut left = vec![
        Span::styled(format!(" {} ", app.mode.label()), theme::HEADER_STYLE),
        Span::styled(format!(" {} projects", stats.total_projects), muted),
        Span::styled(format!("  {} {}", icons::PLAY, stats.running), muted),
    ];
    if app.pending_probes > 0 {
        left.push(Span::styled(
            format!("  {} {} probes", icons::THINKING, app.pending_probes),
            muted,
        ));
    }
    if app.loading {
        left.push(Span::styled(format!("  reloading{}", icons::THINKING), muted));
    }
    if !app.prefix.is_empty() {
        left.push(Span::styled(
            format!("  {}", app.prefix.as_str()),
            Style::default().fg(theme::WEB),
        ));
    }
    let right = if app.gateway_connected {
        vec![Span::styled(
            format!("{} gateway ", icons::CONNECTED),
            Style::default().fg(theme::HOSTING),
        )]
    } else {
        vec![Span::styled(format!("{} gateway ", icons::DISCONNECTED), muted)]
    };
    f.render_widget(Paragraph::new(Line::from(spread(left, right, area.width))), area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Help ")
        .border_style(theme::FOCUSED_BOX_STYLE);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let key = |keys: &str, text: &str| {
        Line::from(vec![
            Span::styled(format!("{keys:<12}"), Style::default().fg(theme::GIT)),
            Span::raw(text.to_string()),
        ])
    };
    let mut lines = vec![
        Line::from(Span::styled(
            "Keyboard",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        key("j / k", "down / up (accepts a count, e.g. 5j)"),
        key("g / G", "first / last, or line N with a count (12G)"),
        key("Ctrl+d / u", "half page down / up"),
        key("/", "filter by name, Enter keeps it, Esc clears"),
        key("Enter", "project details"),
        key("c / C", "chat about project / portfolio"),
        key("Ctrl+r", "reload projects"),
        key("q", "quit (Ctrl+C also leaves any mode)"),
        Line::from(""),
        Line::from(Span::styled(
            "Actions",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    for action in Action::BUTTONS
        .into_iter()
        .chain([Action::Open, Action::GitTui, Action::Production])
    {
        let icon = button_icon(action, false);
        lines.push(key(&format!("{} {}", action.key(), icon), action.label()));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn render_detail(f: &mut Frame, app: &App, area: Rect, now: DateTime<Utc>) {
    let name = app.detail_name().unwrap_or_default();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {name} "))
        .border_style(theme::FOCUSED_BOX_STYLE);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(project) = app.detail_project() else {
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("{name} is no longer present. Press q to go back."),
                Style::default().fg(theme::ERROR),
            )),
            inner,
        );
        return;
    };

    let label = Style::default().fg(theme::MUTED);
    let field = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{name:<14}"), label),
            Span::raw(value),
        ])
    };
    let unknown = || "-".to_string();

    let mut lines = vec![
        field("path", project.path.clone()),
        field(
            "kind",
            format!("{} {}", theme::kind_icon(project.kind), project.kind.label()),
        ),
        field(
            "language",
            project.primary_language().map(str::to_string).unwrap_or_else(unknown),
        ),
    ];
    match &project.git {
        Some(git) => {
            let branch = if git.branch.is_empty() { "-" } else { git.branch.as_str() };
            lines.push(field(
                "branch",
                format!("{branch}  ahead {}  behind {}", git.ahead, git.behind),
            ));
            lines.push(field(
                "changes",
                format!(
                    "{} staged  {} untracked  {} modified",
                    git.staged, git.untracked, git.modified
                ),
            ));
        }
        None => {
            lines.push(field("branch", unknown()));
            lines.push(field("changes", unknown()));
        }
    }
    lines.push(field(
        "hosting",
        project
            .hosting
            .map(|h| format!("{} issues  {} pull requests", h.issues, h.pull_requests))
            .unwrap_or_else(unknown),
    ));
    lines.push(field(
        "deploy",
        project
            .deploy
            .as_ref()
            .map(|state| state.label().to_string())
            .unwrap_or_else(unknown),
    ));
    let commits = project.commits.unwrap_or_default();
    lines.push(field("first commit", format_commit(commits.first, now)));
    lines.push(field("last commit", format_commit(commits.last, now)));
    lines.push(field(
        "running",
        if project.running { "yes" } else { "no" }.to_string(),
    ));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn format_commit(time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match time {
        Some(at) => format!("{} ({} ago)", at.format("%Y-%m-%d %H:%M"), format_since(time, now)),
        None => "-".to_string(),
    }
}

/// Compact age of `time` relative to `now`.
pub fn format_since(time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(time) = time else {
        return "-".to_string();
    };
    let secs = (now - time).num_seconds().max(0);
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    match secs {
        s if s < MINUTE => format!("{s}s"),
        s if s < HOUR => format!("{}m", s / MINUTE),
        s if s < DAY => format!("{}h", s / HOUR),
        s if s < 7 * DAY => format!("{}d", s / DAY),
        s if s < 30 * DAY => format!("{}w", s / (7 * DAY)),
        s if s < 365 * DAY => format!("{}M", s / (30 * DAY)),
        s => format!("{}y", s / (365 * DAY)),
    }
}

fn count(value: Option<u32>) -> String {
    pad(
        &value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
        COUNT_WIDTH,
    )
}

/// Truncates `text` to `width` display cells, marking the cut with an
/// ellipsis, and pads the rest with spaces.
pub fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return pad(text, width);
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    pad(&out, width)
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

/// Joins two span groups with an elastic gap so `right` hugs the edge.
fn spread<'a>(mut left: Vec<Span<'a>>, right: Vec<Span<'a>>, width: u16) -> Vec<Span<'a>> {
    let used: usize = left
        .iter()
        .chain(right.iter())
        .map(|span| span.content.width())
        .sum();
    let gap = usize::from(width).saturating_sub(used);
    left.push(Span::raw(" ".repeat(gap)));
    left.extend(right);
    left
}

fn place_cursor(f: &mut Frame, area: Rect, text: &str) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let offset = (text.width() as u16).min(area.width - 1);
    f.set_cursor(area.x + offset, area.y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Effect, CHROME_HEIGHT};
    use crate::worker::AppEvent;
    use chrono::{Duration, TimeZone};
    use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
    use mc_core::{CommitTimes, Config, GitStatus, StatusUpdate};
    use pretty_assertions::assert_eq;
    use ratatui::{backend::TestBackend, Terminal};
    use std::path::Path;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn loaded_app(names: &[&str], height: u16) -> App {
        let config = Config::defaults(Some(Path::new("/home/dev")));
        let mut app = App::new(Arc::new(config), height);
        let Effect::Reload { request } = app.request_reload() else {
            unreachable!()
        };
        let projects = names
            .iter()
            .map(|name| Project::new(*name, format!("/p/{name}"), ProjectKind::Git))
            .collect();
        app.apply_event(AppEvent::ProjectsLoaded { request, projects });
        app
    }

    fn draw(app: &App, width: u16, height: u16) -> (Terminal<TestBackend>, FrameMap) {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let mut map = FrameMap::default();
        terminal
            .draw(|f| map = render_at(f, app, now()))
            .unwrap();
        (terminal, map)
    }

    fn row_text(terminal: &Terminal<TestBackend>, y: u16, width: u16) -> String {
        let buffer = terminal.backend().buffer();
        (0..width).map(|x| buffer.get(x, y).symbol()).collect()
    }

    #[test]
    fn relative_times_use_compact_units() {
        let at = |secs: i64| Some(now() - Duration::seconds(secs));
        assert_eq!(format_since(None, now()), "-");
        assert_eq!(format_since(at(42), now()), "42s");
        assert_eq!(format_since(at(5 * 60), now()), "5m");
        assert_eq!(format_since(at(3 * 3600), now()), "3h");
        assert_eq!(format_since(at(2 * 86_400), now()), "2d");
        assert_eq!(format_since(at(15 * 86_400), now()), "2w");
        assert_eq!(format_since(at(90 * 86_400), now()), "3M");
        assert_eq!(format_since(at(800 * 86_400), now()), "2y");
        assert_eq!(format_since(Some(now() + Duration::seconds(30)), now()), "0s");
    }

    #[test]
    fn fit_measures_display_width() {
        assert_eq!(fit("api", 5), "api  ");
        assert_eq!(fit("mission-control-v2", 8), "mission…");
        assert_eq!(fit("日本語プロジェクト", 7), "日本語…");
        assert_eq!(fit("日本語プロジェクト", 7).width(), 7);
    }

    #[test]
    fn unknown_status_renders_distinct_from_zero() {
        let mut project = Project::new("api", "/p/api", ProjectKind::Git);
        let text = |project: &Project| -> String {
            build_row(project, 120, now())
                .0
                .iter()
                .map(|span| span.content.to_string())
                .collect()
        };
        assert!(text(&project).contains("+-   ?-   ~-"));
        project.git = Some(GitStatus::default());
        project.commits = Some(CommitTimes {
            first: None,
            last: Some(now() - Duration::hours(2)),
        });
        let row = text(&project);
        assert!(row.contains("+0   ?0   ~0"));
        assert!(row.contains(&format!("{}2h", icons::LAST_COMMIT)));
    }

    #[test]
    fn row_fills_width_and_buttons_hug_the_right_edge() {
        let project = Project::new("api", "/p/api", ProjectKind::Git);
        let (spans, regions) = build_row(&project, 100, now());
        let total: usize = spans.iter().map(|span| span.content.width()).sum();
        assert_eq!(total, 100);
        assert_eq!(regions.len(), Action::BUTTONS.len());
        let (_, end, action) = regions[regions.len() - 1];
        assert_eq!(action, Action::AgentChat);
        assert_eq!(end, 99);
        assert!(regions.windows(2).all(|pair| pair[0].1 < pair[1].0));
    }

    #[test]
    fn buttons_past_the_edge_get_no_region() {
        let project = Project::new("api", "/p/api", ProjectKind::Git);
        let (_, regions) = build_row(&project, 60, now());
        assert!(regions.len() < Action::BUTTONS.len());
        assert!(regions.iter().all(|(_, end, _)| *end <= 60));
    }

    #[test]
    fn regions_point_at_drawn_buttons() {
        let app = loaded_app(&["alpha", "beta", "gamma"], 24);
        let (terminal, map) = draw(&app, 120, 24);
        assert_eq!(map.list_area, Rect::new(0, 4, 120, 24 - CHROME_HEIGHT));

        let buffer = terminal.backend().buffer();
        for row in 0..3 {
            let on_row: Vec<&ActionRegion> =
                map.regions.iter().filter(|region| region.row == row).collect();
            assert_eq!(on_row.len(), Action::BUTTONS.len());
            for region in on_row {
                let symbol = buffer.get(region.start, map.list_area.y + row as u16).symbol();
                assert_eq!(symbol, button_icon(region.action, false));
            }
        }
        let agent = map
            .regions
            .iter()
            .find(|region| region.action == Action::AgentChat)
            .unwrap();
        assert_eq!(agent.end - agent.start, 2);
        assert_eq!(buffer.get(agent.start, map.list_area.y).symbol(), icons::AGENT);
    }

    #[test]
    fn clicking_a_rendered_button_dispatches_for_that_row() {
        let names: Vec<String> = (0..30).map(|i| format!("proj-{i:02}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut app = loaded_app(&refs, 16);
        for _ in 0..12 {
            app.viewport.apply(mc_core::Motion::Down, None, app.visible().len());
        }
        let (_, map) = draw(&app, 120, 16);
        app.set_frame(map.clone());
        let scroll = app.viewport.scroll();
        assert!(scroll > 0);

        let push = map
            .regions
            .iter()
            .find(|region| region.row == 1 && region.action == Action::Push)
            .copied()
            .unwrap();
        let effect = app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: push.start,
            row: map.list_area.y + 1,
            modifiers: KeyModifiers::NONE,
        });
        let Some(Effect::Launch { action, project, .. }) = effect else {
            panic!("expected launch");
        };
        assert_eq!(action, Action::Push);
        assert_eq!(project, format!("proj-{:02}", scroll + 1));
        assert_eq!(app.viewport.selection(), 12);
    }

    #[test]
    fn header_totals_follow_enrichment() {
        let mut app = loaded_app(&["alpha", "beta"], 20);
        for name in ["alpha", "beta"] {
            app.apply_event(AppEvent::Probe {
                generation: app.registry.generation(),
                name: name.to_string(),
                update: Some(StatusUpdate::Git(GitStatus {
                    untracked: 2,
                    ..GitStatus::default()
                })),
            });
        }
        let (terminal, _) = draw(&app, 120, 20);
        let header = row_text(&terminal, 0, 120);
        assert!(header.contains(&format!("{}4", icons::UNTRACKED)));
        assert!(header.contains("Mission Control"));
    }

    #[test]
    fn detail_and_help_replace_the_list_without_regions() {
        let mut app = loaded_app(&["alpha"], 20);
        app.handle_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Enter,
            KeyModifiers::NONE,
        ));
        let (terminal, map) = draw(&app, 80, 20);
        assert!(map.regions.is_empty());
        assert!(row_text(&terminal, 4, 80).contains("alpha"));

        let mut gone = loaded_app(&["alpha"], 20);
        gone.handle_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Enter,
            KeyModifiers::NONE,
        ));
        let Effect::Reload { request } = gone.request_reload() else {
            unreachable!()
        };
        gone.apply_event(AppEvent::ProjectsLoaded {
            request,
            projects: vec![Project::new("beta", "/p/beta", ProjectKind::Git)],
        });
        let (terminal, _) = draw(&gone, 80, 20);
        assert!(row_text(&terminal, 5, 80).contains("no longer present"));
    }

    #[test]
    fn loading_screen_has_no_list() {
        let config = Config::defaults(Some(Path::new("/home/dev")));
        let app = App::new(Arc::new(config), 20);
        let (terminal, map) = draw(&app, 80, 20);
        assert_eq!(map, FrameMap::default());
        let text: String = (0..20).map(|y| row_text(&terminal, y, 80)).collect();
        assert!(text.contains("Loading projects"));
    }
}
