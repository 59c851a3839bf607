use mc_core::paths::expand_home;
use mc_core::{Config, Project, ProjectKind};
use std::path::PathBuf;
use std::process::Stdio;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Push,
    Merge,
    Run,
    Deploy,
    Readme,
    Roadmap,
    Plan,
    Todo,
    AgentChat,
    Open,
    GitTui,
    Production,
}

impl Action {
    /// Actions drawn as clickable buttons on every row, left to right.
    pub const BUTTONS: [Action; 9] = [
        Action::Push,
        Action::Merge,
        Action::Run,
        Action::Deploy,
        Action::Readme,
        Action::Roadmap,
        Action::Plan,
        Action::Todo,
        Action::AgentChat,
    ];

    pub fn from_key(ch: char) -> Option<Self> {
        let action = match ch {
            'P' => Action::Push,
            'M' => Action::Merge,
            'x' => Action::Run,
            'D' => Action::Deploy,
            'r' => Action::Readme,
            'R' => Action::Roadmap,
            'p' => Action::Plan,
            't' => Action::Todo,
            'A' => Action::AgentChat,
            'o' => Action::Open,
            'l' => Action::GitTui,
            'd' => Action::Production,
            _ => return None,
        };
        Some(action)
    }

    pub fn key(self) -> char {
        match self {
            Action::Push => 'P',
            Action::Merge => 'M',
            Action::Run => 'x',
            Action::Deploy => 'D',
            Action::Readme => 'r',
            Action::Roadmap => 'R',
            Action::Plan => 'p',
            Action::Todo => 't',
            Action::AgentChat => 'A',
            Action::Open => 'o',
            Action::GitTui => 'l',
            Action::Production => 'd',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Action::Push => "push",
            Action::Merge => "merge",
            Action::Run => "run / pause",
            Action::Deploy => "deploy",
            Action::Readme => "edit README.md",
            Action::Roadmap => "edit ROADMAP.md",
            Action::Plan => "edit PLAN.md",
            Action::Todo => "edit TODO.md",
            Action::AgentChat => "agent chat",
            Action::Open => "open in editor",
            Action::GitTui => "git TUI",
            Action::Production => "open production URL",
        }
    }

    fn helper(self) -> Option<&'static str> {
        match self {
            Action::Push => Some("mc-push"),
            Action::Merge => Some("mc-merge"),
            Action::Run => Some("mc-run"),
            Action::Deploy => Some("mc-deploy"),
            Action::AgentChat => Some("mc-chat"),
            _ => None,
        }
    }

    fn document(self) -> Option<&'static str> {
        match self {
            Action::Readme => Some("README.md"),
            Action::Roadmap => Some("ROADMAP.md"),
            Action::Plan => Some("PLAN.md"),
            Action::Todo => Some("TODO.md"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Detached; the dashboard keeps running.
    Background,
    /// Owns the terminal until it exits.
    Foreground,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub mode: LaunchMode,
}

/// Resolves the command for `action` on `project`. `None` when the action
/// does not apply, e.g. a production URL for a non-web project.
pub fn command_for(action: Action, project: &Project, config: &Config) -> Option<LaunchSpec> {
    let cwd = expand_home(&project.path);
    let path_arg = cwd.to_string_lossy().into_owned();

    if let Some(helper) = action.helper() {
        return Some(LaunchSpec {
            program: config.helper(helper),
            args: vec![path_arg],
            cwd,
            mode: LaunchMode::Background,
        });
    }
    if let Some(document) = action.document() {
        return Some(LaunchSpec {
            program: PathBuf::from(&config.editor),
            args: vec![cwd.join(document).to_string_lossy().into_owned()],
            cwd,
            mode: LaunchMode::Foreground,
        });
    }
    match action {
        Action::Open => Some(LaunchSpec {
            program: PathBuf::from(&config.editor),
            args: vec![".".to_string()],
            cwd,
            mode: LaunchMode::Foreground,
        }),
        Action::GitTui => Some(LaunchSpec {
            program: PathBuf::from(&config.git_tui),
            args: Vec::new(),
            cwd,
            mode: LaunchMode::Foreground,
        }),
        Action::Production if project.kind == ProjectKind::Vercel => Some(LaunchSpec {
            program: PathBuf::from(&config.url_opener),
            args: vec![format!("https://{}", project.name)],
            cwd,
            mode: LaunchMode::Background,
        }),
        _ => None,
    }
}

/// Fire-and-forget launch. The child is reaped on a tokio task and only its
/// outcome is logged.
pub fn launch_background(spec: &LaunchSpec) {
    let mut command = tokio::process::Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if spec.cwd.is_dir() {
        command.current_dir(&spec.cwd);
    }
    match command.spawn() {
        Ok(mut child) => {
            let program = spec.program.display().to_string();
            info!(%program, "launched background action");
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) if status.success() => {}
                    Ok(status) => {
                        warn!(%program, %status, "background action exited with failure")
                    }
                    Err(err) => warn!(%program, ?err, "failed to wait for background action"),
                }
            });
        }
        Err(err) => {
            warn!(program = %spec.program.display(), ?err, "failed to launch action")
        }
    }
}

/// Runs a terminal program to completion. The caller must release the
/// terminal first.
pub fn run_foreground(spec: &LaunchSpec) {
    let mut command = std::process::Command::new(&spec.program);
    command.args(&spec.args);
    if spec.cwd.is_dir() {
        command.current_dir(&spec.cwd);
    }
    match command.status() {
        Ok(status) => {
            info!(program = %spec.program.display(), %status, "foreground action finished")
        }
        Err(err) => warn!(program = %spec.program.display(), ?err, "failed to launch action"),
    }
}
