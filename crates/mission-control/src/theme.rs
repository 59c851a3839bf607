use mc_core::{DeployState, ProjectKind};
use ratatui::style::{Color, Modifier, Style};

pub const MINT: Color = Color::Rgb(142, 192, 124);
pub const WEB: Color = Color::Rgb(250, 189, 47);
pub const GIT: Color = Color::Rgb(131, 165, 152);
pub const HOSTING: Color = Color::Rgb(184, 187, 38);
pub const MUTED: Color = Color::Rgb(146, 131, 116);
pub const ERROR: Color = Color::Rgb(251, 73, 52);

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(MINT)
    .add_modifier(Modifier::BOLD);
pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(69, 133, 136))
    .fg(Color::Black)
    .add_modifier(Modifier::BOLD);
pub const BOX_STYLE: Style = Style::new().fg(Color::Rgb(102, 92, 84));
pub const FOCUSED_BOX_STYLE: Style = Style::new().fg(GIT);

pub fn zebra_row_style(index: usize) -> Style {
    if index % 2 == 0 {
        Style::new()
    } else {
        Style::new().bg(Color::Rgb(28, 28, 28))
    }
}

pub fn segment(bg: Color) -> Style {
    Style::new().fg(Color::Black).bg(bg)
}

pub fn deploy_color(state: Option<&DeployState>) -> Color {
    match state {
        Some(DeployState::Ready) => HOSTING,
        Some(DeployState::Building) | Some(DeployState::Queued) => WEB,
        Some(DeployState::Failed) => ERROR,
        Some(DeployState::Other(_)) | None => MUTED,
    }
}

pub mod icons {
    pub const ROCKET: &str = "🚀";
    pub const WEB: &str = "▲";
    pub const GIT: &str = "⎇";
    pub const HOSTING: &str = "◎";
    pub const SEARCH: &str = "⌕";
    pub const CHAT: &str = "✉";
    pub const THINKING: &str = "…";
    pub const FAILED: &str = "✗";
    pub const READY: &str = "✓";
    pub const BUILDING: &str = "⚙";
    pub const QUEUED: &str = "◷";
    pub const STAGED: &str = "+";
    pub const UNTRACKED: &str = "?";
    pub const MODIFIED: &str = "~";
    pub const ISSUE: &str = "!";
    pub const PULL_REQUEST: &str = "⇄";
    pub const FIRST_COMMIT: &str = "◖";
    pub const LAST_COMMIT: &str = "◗";
    pub const CONNECTED: &str = "●";
    pub const DISCONNECTED: &str = "○";
    pub const THUMB: &str = "┃";
    pub const TRACK: &str = "│";

    pub const PUSH: &str = "⇡";
    pub const MERGE: &str = "⑂";
    pub const PLAY: &str = "▶";
    pub const PAUSE: &str = "⏸";
    pub const DEPLOY: &str = "☁";
    pub const README: &str = "ℝ";
    pub const ROADMAP: &str = "⛳";
    pub const PLAN: &str = "☰";
    pub const TODO: &str = "☑";
    pub const AGENT: &str = "🤖";
}

pub fn kind_icon(kind: ProjectKind) -> &'static str {
    match kind {
        ProjectKind::Vercel => "▲",
        ProjectKind::Swift => "◭",
        ProjectKind::Go => "ɢ",
        ProjectKind::C => "ƈ",
        ProjectKind::Python => "π",
        ProjectKind::Ruby => "◆",
        ProjectKind::Rust => "⚙",
        ProjectKind::Lua => "☾",
        ProjectKind::Html => "‹",
        ProjectKind::Css => "♯",
        ProjectKind::Php => "φ",
        ProjectKind::Java => "☕",
        ProjectKind::WordPress => "ω",
        ProjectKind::Terminal => "❯",
        ProjectKind::Chrome => "◉",
        ProjectKind::Docker => "▦",
        ProjectKind::Markdown => "¶",
        ProjectKind::Json => "{",
        ProjectKind::Git => "⎇",
    }
}

pub fn kind_color(kind: ProjectKind) -> Color {
    match kind {
        ProjectKind::Vercel => WEB,
        ProjectKind::Swift => Color::Rgb(254, 128, 25),
        ProjectKind::Rust => Color::Rgb(214, 93, 14),
        ProjectKind::Go | ProjectKind::Docker => Color::Rgb(69, 133, 136),
        ProjectKind::Python | ProjectKind::Lua => Color::Rgb(131, 165, 152),
        ProjectKind::Ruby | ProjectKind::Java => Color::Rgb(204, 36, 29),
        ProjectKind::WordPress | ProjectKind::Php => Color::Rgb(177, 98, 134),
        _ => MUTED,
    }
}
