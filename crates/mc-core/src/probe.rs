//! Status probes: one external fact per field group, best effort.
//!
//! Every probe returns `None` on any failure. Callers treat that as "leave
//! the field unknown" and never retry.

use crate::config::Config;
use crate::project::{
    CommitTimes, DeployState, FieldGroup, GitStatus, HostingStatus, LanguageInfo, ProjectKind,
    ProjectMarkers, StatusUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

#[async_trait]
pub trait StatusProbes: Send + Sync {
    async fn git(&self, path: &Path) -> Option<GitStatus>;
    async fn hosting(&self, path: &Path) -> Option<HostingStatus>;
    async fn deploy(&self, path: &Path) -> Option<DeployState>;
    async fn language(&self, path: &Path) -> Option<LanguageInfo>;
    async fn commit_times(&self, path: &Path) -> Option<CommitTimes>;
}

/// Runs the probe for `group`. `Running` has no probe.
pub async fn run_probe(
    probes: &dyn StatusProbes,
    group: FieldGroup,
    path: &Path,
) -> Option<StatusUpdate> {
    match group {
        FieldGroup::Git => probes.git(path).await.map(StatusUpdate::Git),
        FieldGroup::Hosting => probes.hosting(path).await.map(StatusUpdate::Hosting),
        FieldGroup::Deploy => probes.deploy(path).await.map(StatusUpdate::Deploy),
        FieldGroup::Language => probes.language(path).await.map(StatusUpdate::Language),
        FieldGroup::CommitTimes => probes
            .commit_times(path)
            .await
            .map(StatusUpdate::CommitTimes),
        FieldGroup::Running => None,
    }
}

/// Probes scheduled for a freshly loaded project. Deployment state is only
/// asked of projects discovered as vercel sites.
pub fn groups_for(kind: ProjectKind) -> Vec<FieldGroup> {
    FieldGroup::PROBED
        .into_iter()
        .filter(|group| *group != FieldGroup::Deploy || kind == ProjectKind::Vercel)
        .collect()
}

/// Probes backed by the helper scripts in `bin_dir`, falling back to the
/// underlying CLIs.
#[derive(Debug, Clone)]
pub struct ShellProbes {
    bin_dir: PathBuf,
    timeout: Duration,
}

impl ShellProbes {
    pub fn new(bin_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin_dir: bin_dir.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.bin_dir.clone(), config.probe_timeout)
    }

    async fn helper(&self, name: &str, path: &Path, json: bool) -> Option<String> {
        let mut command = Command::new(self.bin_dir.join(name));
        command.arg(path);
        if json {
            command.arg("--json");
        }
        run_with_timeout(command, self.timeout).await
    }

    async fn git_cmd(&self, path: &Path, args: &[&str]) -> Option<String> {
        let mut command = Command::new("git");
        command.arg("-C").arg(path).args(args);
        run_with_timeout(command, self.timeout).await
    }

    async fn gh_count(&self, path: &Path, what: &str) -> Option<u32> {
        let mut command = Command::new("gh");
        command
            .args([what, "list", "--state", "open", "--json", "number", "-q", "length"])
            .current_dir(path);
        run_with_timeout(command, self.timeout)
            .await
            .and_then(|out| parse_count(&out))
    }
}

#[async_trait]
impl StatusProbes for ShellProbes {
    async fn git(&self, path: &Path) -> Option<GitStatus> {
        if !path.join(".git").exists() {
            return None;
        }
        if let Some(status) = self
            .helper("mc-git-status", path, true)
            .await
            .and_then(|out| parse_git_json(&out))
        {
            return Some(status);
        }
        self.git_cmd(path, &["status", "--porcelain", "-b"])
            .await
            .map(|out| parse_porcelain(&out))
    }

    async fn hosting(&self, path: &Path) -> Option<HostingStatus> {
        if let Some(status) = self
            .helper("mc-gh-status", path, true)
            .await
            .and_then(|out| parse_hosting_json(&out))
        {
            return Some(status);
        }
        let issues = self.gh_count(path, "issue").await;
        let pull_requests = self.gh_count(path, "pr").await;
        if issues.is_none() && pull_requests.is_none() {
            return None;
        }
        Some(HostingStatus {
            issues: issues.unwrap_or(0),
            pull_requests: pull_requests.unwrap_or(0),
        })
    }

    async fn deploy(&self, path: &Path) -> Option<DeployState> {
        if !path.join(".vercel").exists() {
            return None;
        }
        if let Some(state) = self
            .helper("mc-vl-status", path, true)
            .await
            .and_then(|out| parse_deploy_json(&out))
        {
            return Some(state);
        }
        let mut command = Command::new("vercel");
        command.args(["ls", "--json", "-n", "1"]).current_dir(path);
        run_with_timeout(command, self.timeout)
            .await
            .and_then(|out| parse_deploy_json(&out))
    }

    async fn language(&self, path: &Path) -> Option<LanguageInfo> {
        if !path.is_dir() {
            return None;
        }
        let language = self
            .helper("mc-tokei-lang-perc", path, false)
            .await
            .and_then(|out| parse_language_line(&out));
        Some(LanguageInfo {
            language,
            markers: scan_markers(path),
        })
    }

    async fn commit_times(&self, path: &Path) -> Option<CommitTimes> {
        if !path.join(".git").exists() {
            return None;
        }
        let first = self
            .git_cmd(path, &["log", "--reverse", "--format=%ct"])
            .await
            .and_then(|out| out.lines().next().and_then(parse_epoch));
        let last = self
            .git_cmd(path, &["log", "-1", "--format=%ct"])
            .await
            .and_then(|out| parse_epoch(&out));
        if first.is_none() && last.is_none() {
            return None;
        }
        Some(CommitTimes { first, last })
    }
}

/// Runs `command` and returns its stdout if it exits successfully within
/// `timeout`. The deadline covers reading stdout to EOF, so a forked
/// grandchild that keeps the pipe open cannot hold the caller past it.
/// An overdue child is killed when its future is dropped.
pub async fn run_with_timeout(mut command: Command, timeout: Duration) -> Option<String> {
    let program = command.as_std().get_program().to_owned();
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| debug!(?err, ?program, "probe spawn failed"))
        .ok()?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(Ok(output)) => {
            debug!(?program, status = %output.status, "probe exited with failure");
            None
        }
        Ok(Err(err)) => {
            debug!(?err, ?program, "probe wait failed");
            None
        }
        Err(_) => {
            debug!(?program, ?timeout, "probe timed out; killed");
            None
        }
    }
}

fn scan_markers(path: &Path) -> ProjectMarkers {
    ProjectMarkers {
        vercel: path.join(".vercel").exists(),
        swift_package: path.join("Package.swift").exists(),
        wp_config: path.join("wp-config.php").exists(),
        manifest_json: path.join("manifest.json").exists(),
        dockerfile: path.join("Dockerfile").exists(),
    }
}

#[derive(Debug, Deserialize)]
struct GitHelperOutput {
    #[serde(default)]
    branch: String,
    #[serde(default)]
    untracked: u32,
    #[serde(default)]
    modified: u32,
    #[serde(default)]
    staged: u32,
    #[serde(default)]
    ahead: u32,
    #[serde(default)]
    behind: u32,
}

pub fn parse_git_json(output: &str) -> Option<GitStatus> {
    let raw: GitHelperOutput = serde_json::from_str(output.trim()).ok()?;
    Some(GitStatus {
        staged: raw.staged,
        untracked: raw.untracked,
        modified: raw.modified,
        branch: raw.branch,
        ahead: raw.ahead,
        behind: raw.behind,
    })
}

/// Parses `git status --porcelain -b`.
pub fn parse_porcelain(output: &str) -> GitStatus {
    let mut status = GitStatus::default();
    for line in output.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            parse_branch_header(header, &mut status);
            continue;
        }
        let mut chars = line.chars();
        let (Some(x), Some(y)) = (chars.next(), chars.next()) else {
            continue;
        };
        if x == '?' && y == '?' {
            status.untracked += 1;
        } else if x != ' ' && x != '?' {
            status.staged += 1;
            if y != ' ' {
                status.modified += 1;
            }
        } else if y != ' ' && y != '?' {
            status.modified += 1;
        }
    }
    status
}

fn parse_branch_header(header: &str, status: &mut GitStatus) {
    let header = header
        .strip_prefix("No commits yet on ")
        .or_else(|| header.strip_prefix("Initial commit on "))
        .unwrap_or(header);
    let (refs, tracking) = match header.split_once(" [") {
        Some((refs, rest)) => (refs, rest.trim_end_matches(']')),
        None => (header, ""),
    };
    status.branch = refs.split("...").next().unwrap_or(refs).trim().to_string();
    for part in tracking.split(',').map(str::trim) {
        if let Some(n) = part.strip_prefix("ahead ") {
            status.ahead = n.parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            status.behind = n.parse().unwrap_or(0);
        }
    }
}

#[derive(Debug, Deserialize)]
struct HostingHelperOutput {
    #[serde(default)]
    issues: u32,
    #[serde(default)]
    prs: u32,
}

pub fn parse_hosting_json(output: &str) -> Option<HostingStatus> {
    let raw: HostingHelperOutput = serde_json::from_str(output.trim()).ok()?;
    Some(HostingStatus {
        issues: raw.issues,
        pull_requests: raw.prs,
    })
}

pub fn parse_count(output: &str) -> Option<u32> {
    output.trim().parse().ok()
}

#[derive(Debug, Deserialize)]
struct DeploymentRecord {
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeployOutput {
    Single(DeploymentRecord),
    Listing(Vec<DeploymentRecord>),
}

/// Accepts either the helper's `{"state": ..}` or `vercel ls --json`'s
/// array, newest first. An empty listing is no result.
pub fn parse_deploy_json(output: &str) -> Option<DeployState> {
    let parsed: DeployOutput = serde_json::from_str(output.trim()).ok()?;
    let record = match parsed {
        DeployOutput::Single(record) => record,
        DeployOutput::Listing(records) => records.into_iter().next()?,
    };
    DeployState::from_raw(&record.state)
}

/// Parses `Language: NN%`. `null: null%` means nothing was counted.
pub fn parse_language_line(output: &str) -> Option<String> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    let (name, _) = line.split_once(':').unwrap_or((line, ""));
    let name = name.trim();
    if name.is_empty() || name.eq_ignore_ascii_case("null") {
        return None;
    }
    Some(name.to_string())
}

pub fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    let secs = raw.trim().parse::<i64>().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}
