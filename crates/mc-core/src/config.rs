use crate::paths::expand_home_with;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROBE_CONCURRENCY: usize = 8;
const DEFAULT_TICK_MS: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub projects_root: PathBuf,
    pub cache_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub editor: String,
    pub git_tui: String,
    pub url_opener: String,
    pub probe_timeout: Duration,
    pub probe_concurrency: usize,
    pub tick: Duration,
    pub gateway_config: PathBuf,
    pub chat_tool: String,
}

/// On-disk shape; every field optional so partial files are fine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    projects_root: Option<String>,
    cache_dir: Option<String>,
    bin_dir: Option<String>,
    editor: Option<String>,
    git_tui: Option<String>,
    url_opener: Option<String>,
    probe_timeout_secs: Option<u64>,
    probe_concurrency: Option<usize>,
    tick_ms: Option<u64>,
    gateway_config: Option<String>,
    chat_tool: Option<String>,
}

impl Config {
    pub fn defaults(home: Option<&Path>) -> Self {
        let home_dir = home.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        let projects_root = home_dir.join("Projects");
        Self {
            bin_dir: projects_root.join("mission-control").join("bin"),
            projects_root,
            cache_dir: home_dir.join(".hustlemc"),
            editor: "nvim".to_string(),
            git_tui: "lazygit".to_string(),
            url_opener: default_url_opener().to_string(),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            gateway_config: home_dir.join(".openclaw").join("openclaw.json"),
            chat_tool: "session_status".to_string(),
        }
    }

    /// Default location of the TOML config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mission-control").join("config.toml"))
    }

    /// Defaults, then the TOML file if it exists, then environment overrides.
    pub fn load(path: Option<&Path>, home: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::defaults(home);
        if let Some(path) = path {
            if path.exists() {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                config.merge_toml(&contents, home).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        config.apply_env(|key| std::env::var(key).ok(), home);
        Ok(config)
    }

    pub fn merge_toml(
        &mut self,
        contents: &str,
        home: Option<&Path>,
    ) -> Result<(), toml::de::Error> {
        let file: FileConfig = toml::from_str(contents)?;
        let path = |raw: String| expand_home_with(raw.trim(), home);
        if let Some(value) = file.projects_root {
            self.projects_root = path(value);
        }
        if let Some(value) = file.cache_dir {
            self.cache_dir = path(value);
        }
        if let Some(value) = file.bin_dir {
            self.bin_dir = path(value);
        }
        if let Some(value) = non_empty(file.editor) {
            self.editor = value;
        }
        if let Some(value) = non_empty(file.git_tui) {
            self.git_tui = value;
        }
        if let Some(value) = non_empty(file.url_opener) {
            self.url_opener = value;
        }
        if let Some(secs) = file.probe_timeout_secs {
            self.probe_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(limit) = file.probe_concurrency {
            self.probe_concurrency = limit.max(1);
        }
        if let Some(ms) = file.tick_ms {
            self.tick = Duration::from_millis(ms.max(100));
        }
        if let Some(value) = file.gateway_config {
            self.gateway_config = path(value);
        }
        if let Some(value) = non_empty(file.chat_tool) {
            self.chat_tool = value;
        }
        Ok(())
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>, home: Option<&Path>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = get("MC_PROJECTS_ROOT") {
            self.projects_root = expand_home_with(value.trim(), home);
        }
        if let Some(value) = get("MC_CACHE_DIR") {
            self.cache_dir = expand_home_with(value.trim(), home);
        }
        if let Some(value) = get("MC_BIN_DIR") {
            self.bin_dir = expand_home_with(value.trim(), home);
        }
        if let Some(value) = get("MC_EDITOR").or_else(|| get("EDITOR")) {
            self.editor = value.trim().to_string();
        }
        if let Some(secs) =
            get("MC_PROBE_TIMEOUT_SECS").and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.probe_timeout = Duration::from_secs(secs.max(1));
        }
    }

    pub fn projects_cache(&self) -> PathBuf {
        self.cache_dir.join("projects.json")
    }

    pub fn helper(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_url_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn home() -> PathBuf {
        PathBuf::from("/home/dev")
    }

    #[test]
    fn defaults_hang_off_home() {
        let config = Config::defaults(Some(&home()));
        assert_eq!(config.projects_root, PathBuf::from("/home/dev/Projects"));
        assert_eq!(
            config.projects_cache(),
            PathBuf::from("/home/dev/.hustlemc/projects.json")
        );
        assert_eq!(
            config.helper("mc-push"),
            PathBuf::from("/home/dev/Projects/mission-control/bin/mc-push")
        );
        assert_eq!(config.probe_concurrency, DEFAULT_PROBE_CONCURRENCY);
    }

    #[test]
    fn toml_overrides_and_expands_paths() {
        let mut config = Config::defaults(Some(&home()));
        config
            .merge_toml(
                r#"
projects_root = "~/code"
editor = "hx"
probe_timeout_secs = 0
probe_concurrency = 3
"#,
                Some(&home()),
            )
            .unwrap();
        assert_eq!(config.projects_root, PathBuf::from("/home/dev/code"));
        assert_eq!(config.editor, "hx");
        assert_eq!(config.probe_timeout, Duration::from_secs(1));
        assert_eq!(config.probe_concurrency, 3);
        assert_eq!(config.git_tui, "lazygit");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = Config::defaults(Some(&home()));
        assert!(config.merge_toml("colour = \"red\"", Some(&home())).is_err());
    }

    #[test]
    fn env_beats_file_and_editor_falls_back() {
        let env: HashMap<&str, &str> = [
            ("MC_PROJECTS_ROOT", "~/work"),
            ("EDITOR", "vim"),
            ("MC_PROBE_TIMEOUT_SECS", "3"),
            ("MC_BIN_DIR", "  "),
        ]
        .into_iter()
        .collect();
        let mut config = Config::defaults(Some(&home()));
        config.apply_env(|key| env.get(key).map(|v| v.to_string()), Some(&home()));
        assert_eq!(config.projects_root, PathBuf::from("/home/dev/work"));
        assert_eq!(config.editor, "vim");
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert_eq!(
            config.bin_dir,
            PathBuf::from("/home/dev/Projects/mission-control/bin")
        );
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "editor = [").unwrap();
        let err = Config::load(Some(&path), Some(&home())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let config = Config::load(Some(&path), Some(&home())).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/home/dev/.hustlemc"));
    }
}
