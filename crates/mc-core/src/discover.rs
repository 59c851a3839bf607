use crate::config::Config;
use crate::project::{Project, ProjectKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("failed to run discovery helper {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("discovery helper exited with {status}")]
    HelperFailed { status: std::process::ExitStatus },
    #[error("failed to read project cache {path}: {source}")]
    ReadCache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse project cache {path}: {source}")]
    ParseCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One record of the discovery cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredProject {
    pub name: String,
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl From<DiscoveredProject> for Project {
    fn from(record: DiscoveredProject) -> Self {
        let kind = ProjectKind::from_discovery(&record.kind);
        Project::new(record.name, record.path, kind)
    }
}

pub fn read_cache(path: &Path) -> Result<Vec<DiscoveredProject>, DiscoverError> {
    let contents = std::fs::read_to_string(path).map_err(|source| DiscoverError::ReadCache {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cache(&contents).map_err(|source| DiscoverError::ParseCache {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses the cache body. Blank files count as an empty portfolio.
pub fn parse_cache(contents: &str) -> Result<Vec<DiscoveredProject>, serde_json::Error> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let records: Vec<DiscoveredProject> = serde_json::from_str(contents)?;
    Ok(records
        .into_iter()
        .filter(|record| !record.name.trim().is_empty())
        .collect())
}

/// Runs `mc-discover <projects_root> --json`, which rewrites the cache.
pub fn run_discovery(config: &Config) -> Result<(), DiscoverError> {
    let helper = config.helper("mc-discover");
    info!(
        helper = %helper.display(),
        root = %config.projects_root.display(),
        "running project discovery"
    );
    let status = Command::new(&helper)
        .arg(&config.projects_root)
        .arg("--json")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| DiscoverError::Spawn {
            path: helper.clone(),
            source,
        })?;
    if !status.success() {
        return Err(DiscoverError::HelperFailed { status });
    }
    Ok(())
}

/// Reads the cached portfolio, running discovery first when the cache is
/// missing or a rediscovery was requested.
pub fn load_projects(config: &Config, rediscover: bool) -> Result<Vec<Project>, DiscoverError> {
    let cache = config.projects_cache();
    if rediscover || !cache.exists() {
        run_discovery(config)?;
    }
    let records = read_cache(&cache)?;
    debug!(count = records.len(), cache = %cache.display(), "loaded project cache");
    Ok(records.into_iter().map(Project::from).collect())
}
