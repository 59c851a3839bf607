use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project classification, derived from discovery hints, on-disk markers and
/// the primary language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Vercel,
    Swift,
    Go,
    C,
    Python,
    Ruby,
    Rust,
    Lua,
    Html,
    Css,
    Php,
    Java,
    WordPress,
    Terminal,
    Chrome,
    Docker,
    Markdown,
    Json,
    #[default]
    Git,
}

impl ProjectKind {
    /// Maps the discovery helper's `type` field. Anything unrecognised is a
    /// plain git project until language enrichment says otherwise.
    pub fn from_discovery(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vercel" => ProjectKind::Vercel,
            "swift" => ProjectKind::Swift,
            _ => ProjectKind::Git,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProjectKind::Vercel => "vercel",
            ProjectKind::Swift => "swift",
            ProjectKind::Go => "go",
            ProjectKind::C => "c",
            ProjectKind::Python => "python",
            ProjectKind::Ruby => "ruby",
            ProjectKind::Rust => "rust",
            ProjectKind::Lua => "lua",
            ProjectKind::Html => "html",
            ProjectKind::Css => "css",
            ProjectKind::Php => "php",
            ProjectKind::Java => "java",
            ProjectKind::WordPress => "wordpress",
            ProjectKind::Terminal => "terminal",
            ProjectKind::Chrome => "chrome",
            ProjectKind::Docker => "docker",
            ProjectKind::Markdown => "markdown",
            ProjectKind::Json => "json",
            ProjectKind::Git => "git",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatus {
    pub staged: u32,
    pub untracked: u32,
    pub modified: u32,
    pub branch: String,
    pub ahead: u32,
    pub behind: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostingStatus {
    pub issues: u32,
    pub pull_requests: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployState {
    Ready,
    Building,
    Queued,
    Failed,
    Other(String),
}

impl DeployState {
    /// Normalises a raw deployment state. Empty and `unknown` carry no
    /// information and are treated as "no result".
    pub fn from_raw(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" | "unknown" => None,
            "ready" => Some(DeployState::Ready),
            "building" => Some(DeployState::Building),
            "queued" => Some(DeployState::Queued),
            "failed" | "error" => Some(DeployState::Failed),
            _ => Some(DeployState::Other(normalized)),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DeployState::Ready => "ready",
            DeployState::Building => "building",
            DeployState::Queued => "queued",
            DeployState::Failed => "failed",
            DeployState::Other(raw) => raw.as_str(),
        }
    }
}

/// Marker files that steer classification ahead of the language heuristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectMarkers {
    pub vercel: bool,
    pub swift_package: bool,
    pub wp_config: bool,
    pub manifest_json: bool,
    pub dockerfile: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageInfo {
    pub language: Option<String>,
    pub markers: ProjectMarkers,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitTimes {
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

/// Names one cluster of status attributes written atomically by one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Git,
    Hosting,
    Deploy,
    Language,
    CommitTimes,
    Running,
}

impl FieldGroup {
    /// Groups filled by background probes, in launch order.
    pub const PROBED: [FieldGroup; 5] = [
        FieldGroup::Git,
        FieldGroup::CommitTimes,
        FieldGroup::Language,
        FieldGroup::Deploy,
        FieldGroup::Hosting,
    ];
}

/// A value for exactly one field group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Git(GitStatus),
    Hosting(HostingStatus),
    Deploy(DeployState),
    Language(LanguageInfo),
    CommitTimes(CommitTimes),
    Running(bool),
}

impl StatusUpdate {
    pub fn group(&self) -> FieldGroup {
        match self {
            StatusUpdate::Git(_) => FieldGroup::Git,
            StatusUpdate::Hosting(_) => FieldGroup::Hosting,
            StatusUpdate::Deploy(_) => FieldGroup::Deploy,
            StatusUpdate::Language(_) => FieldGroup::Language,
            StatusUpdate::CommitTimes(_) => FieldGroup::CommitTimes,
            StatusUpdate::Running(_) => FieldGroup::Running,
        }
    }
}

/// One portfolio entry. Every status group is `None` until its probe
/// reports, which keeps "not yet known" distinct from a real zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub path: String,
    pub discovered_kind: ProjectKind,
    pub kind: ProjectKind,
    pub git: Option<GitStatus>,
    pub hosting: Option<HostingStatus>,
    pub deploy: Option<DeployState>,
    pub language: Option<LanguageInfo>,
    pub commits: Option<CommitTimes>,
    pub running: bool,
    pub(crate) classification_stale: bool,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: ProjectKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            discovered_kind: kind,
            kind,
            git: None,
            hosting: None,
            deploy: None,
            language: None,
            commits: None,
            running: false,
            classification_stale: false,
        }
    }

    pub fn primary_language(&self) -> Option<&str> {
        self.language.as_ref().and_then(|info| info.language.as_deref())
    }

    /// Overwrites only the fields of the update's group.
    pub(crate) fn apply(&mut self, update: StatusUpdate) {
        match update {
            StatusUpdate::Git(status) => self.git = Some(status),
            StatusUpdate::Hosting(status) => self.hosting = Some(status),
            StatusUpdate::Deploy(state) => self.deploy = Some(state),
            StatusUpdate::Language(info) => {
                self.language = Some(info);
                self.classification_stale = true;
            }
            StatusUpdate::CommitTimes(times) => self.commits = Some(times),
            StatusUpdate::Running(running) => self.running = running,
        }
    }

    pub(crate) fn reclassify(&mut self) {
        self.kind = match &self.language {
            Some(info) => classify(&self.name, info),
            None => self.discovered_kind,
        };
        self.classification_stale = false;
    }
}

/// Pure classification from name, markers and primary language. Anything
/// left unmatched is a plain git project; the discovery hint no longer
/// applies once the language probe has answered.
pub fn classify(name: &str, info: &LanguageInfo) -> ProjectKind {
    let name = name.to_lowercase();
    let markers = info.markers;

    if markers.vercel {
        return ProjectKind::Vercel;
    }
    if markers.swift_package {
        return ProjectKind::Swift;
    }
    if name.contains("wordpress") || name.contains("wp-") || markers.wp_config {
        return ProjectKind::WordPress;
    }
    if name.contains("extension") || name.contains("chrome") || markers.manifest_json {
        return ProjectKind::Chrome;
    }
    if name == "dotfiles" || name.starts_with('.') || name.contains("zsh") || name.contains("bash")
    {
        return ProjectKind::Terminal;
    }
    if markers.dockerfile {
        return ProjectKind::Docker;
    }

    info.language
        .as_deref()
        .and_then(kind_for_language)
        .unwrap_or(ProjectKind::Git)
}

fn kind_for_language(language: &str) -> Option<ProjectKind> {
    let language = language.trim().to_lowercase();
    let kind = match language.as_str() {
        "go" => ProjectKind::Go,
        "c" | "c header" => ProjectKind::C,
        "python" => ProjectKind::Python,
        "ruby" => ProjectKind::Ruby,
        "rust" => ProjectKind::Rust,
        "lua" => ProjectKind::Lua,
        "html" => ProjectKind::Html,
        "css" | "scss" | "sass" | "less" => ProjectKind::Css,
        "php" => ProjectKind::Php,
        "java" => ProjectKind::Java,
        "markdown" => ProjectKind::Markdown,
        "json" => ProjectKind::Json,
        "tsx" | "jsx" | "typescript" | "javascript" => ProjectKind::Vercel,
        "swift" => ProjectKind::Swift,
        "shell" | "bash" | "zsh" => ProjectKind::Terminal,
        "dockerfile" => ProjectKind::Docker,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(language: &str) -> LanguageInfo {
        LanguageInfo {
            language: Some(language.to_string()),
            markers: ProjectMarkers::default(),
        }
    }

    #[test]
    fn deploy_state_normalises_raw_strings() {
        assert_eq!(DeployState::from_raw("READY"), Some(DeployState::Ready));
        assert_eq!(DeployState::from_raw("error"), Some(DeployState::Failed));
        assert_eq!(DeployState::from_raw(" "), None);
        assert_eq!(DeployState::from_raw("unknown"), None);
        assert_eq!(
            DeployState::from_raw("Canceled"),
            Some(DeployState::Other("canceled".to_string()))
        );
    }

    #[test]
    fn markers_take_precedence_over_language() {
        let info = LanguageInfo {
            language: Some("Rust".to_string()),
            markers: ProjectMarkers {
                dockerfile: true,
                ..ProjectMarkers::default()
            },
        };
        assert_eq!(classify("api", &info), ProjectKind::Docker);

        let info = LanguageInfo {
            language: Some("Rust".to_string()),
            markers: ProjectMarkers {
                vercel: true,
                dockerfile: true,
                ..ProjectMarkers::default()
            },
        };
        assert_eq!(classify("api", &info), ProjectKind::Vercel);
    }

    #[test]
    fn name_hints_classify_before_language() {
        assert_eq!(classify("wp-shop", &lang("PHP")), ProjectKind::WordPress);
        assert_eq!(classify("dotfiles", &lang("Lua")), ProjectKind::Terminal);
        assert_eq!(classify("tab-extension", &lang("JavaScript")), ProjectKind::Chrome);
    }

    #[test]
    fn language_drives_classification() {
        assert_eq!(classify("a", &lang("Go")), ProjectKind::Go);
        assert_eq!(classify("a", &lang("C")), ProjectKind::C);
        assert_eq!(classify("a", &lang("TypeScript")), ProjectKind::Vercel);
        assert_eq!(classify("a", &lang("Java")), ProjectKind::Java);
        assert_eq!(classify("a", &lang("JavaScript")), ProjectKind::Vercel);
    }

    #[test]
    fn unmatched_language_falls_back_to_git() {
        assert_eq!(classify("app", &lang("Objective-C")), ProjectKind::Git);
        assert_eq!(classify("app", &lang("Fortran")), ProjectKind::Git);
        assert_eq!(classify("app", &LanguageInfo::default()), ProjectKind::Git);
    }

    #[test]
    fn enrichment_replaces_discovery_hint() {
        let mut project = Project::new("site", "~/Projects/site", ProjectKind::Vercel);
        assert_eq!(project.kind, ProjectKind::Vercel);
        project.apply(StatusUpdate::Language(LanguageInfo::default()));
        project.reclassify();
        assert_eq!(project.kind, ProjectKind::Git);

        let mut project = Project::new("app", "~/Projects/app", ProjectKind::Swift);
        project.apply(StatusUpdate::Language(lang("Objective-C")));
        project.reclassify();
        assert_eq!(project.kind, ProjectKind::Git);
    }

    #[test]
    fn language_update_marks_classification_stale() {
        let mut project = Project::new("svc", "~/Projects/svc", ProjectKind::Git);
        project.apply(StatusUpdate::Git(GitStatus::default()));
        assert!(!project.classification_stale);
        project.apply(StatusUpdate::Language(lang("Rust")));
        assert!(project.classification_stale);
        assert_eq!(project.kind, ProjectKind::Git);
        project.reclassify();
        assert_eq!(project.kind, ProjectKind::Rust);
        assert!(!project.classification_stale);
    }
}
