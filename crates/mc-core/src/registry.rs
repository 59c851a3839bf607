use crate::project::{DeployState, Project, StatusUpdate};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Aggregate counters for the status bar. Always equal to a full fold of the
/// registry's projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_projects: usize,
    pub deploy_ready: usize,
    pub deploy_building: usize,
    pub deploy_queued: usize,
    pub deploy_failed: usize,
    pub running: usize,
    pub total_staged: u64,
    pub total_untracked: u64,
    pub total_modified: u64,
    pub total_issues: u64,
    pub total_prs: u64,
}

impl Stats {
    pub fn fold(projects: &[Project]) -> Self {
        let mut stats = Stats {
            total_projects: projects.len(),
            ..Stats::default()
        };
        for project in projects {
            if let Some(git) = &project.git {
                stats.total_staged += u64::from(git.staged);
                stats.total_untracked += u64::from(git.untracked);
                stats.total_modified += u64::from(git.modified);
            }
            if let Some(hosting) = &project.hosting {
                stats.total_issues += u64::from(hosting.issues);
                stats.total_prs += u64::from(hosting.pull_requests);
            }
            match project.deploy {
                Some(DeployState::Ready) => stats.deploy_ready += 1,
                Some(DeployState::Building) => stats.deploy_building += 1,
                Some(DeployState::Queued) => stats.deploy_queued += 1,
                Some(DeployState::Failed) => stats.deploy_failed += 1,
                Some(DeployState::Other(_)) | None => {}
            }
            if project.running {
                stats.running += 1;
            }
        }
        stats
    }
}

/// Authoritative project list with per-project mutable status.
///
/// Projects are addressed by name; indices are only stable between two
/// `load` calls and are never handed to probe results.
#[derive(Debug, Default)]
pub struct Registry {
    projects: Vec<Project>,
    by_name: HashMap<String, usize>,
    stats: Stats,
    generation: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole project set and resets every status field to
    /// unknown. Returns the new load generation.
    pub fn load(&mut self, initial: Vec<Project>) -> u64 {
        self.projects.clear();
        self.by_name.clear();
        for project in initial {
            if self.by_name.contains_key(&project.name) {
                warn!(
                    name = %project.name,
                    "duplicate project name in discovery result; keeping first"
                );
                continue;
            }
            let fresh = Project::new(project.name, project.path, project.discovered_kind);
            self.by_name.insert(fresh.name.clone(), self.projects.len());
            self.projects.push(fresh);
        }
        self.generation += 1;
        self.stats = Stats::fold(&self.projects);
        self.generation
    }

    /// Merges one field group into the named project. Unknown names are
    /// ignored and `false` is returned.
    pub fn apply_status_update(&mut self, name: &str, update: StatusUpdate) -> bool {
        let Some(&idx) = self.by_name.get(name) else {
            debug!(name, group = ?update.group(), "status update for unknown project dropped");
            return false;
        };
        self.projects[idx].apply(update);
        true
    }

    /// Reclassifies projects whose language changed and refolds stats.
    pub fn recompute_derived(&mut self) {
        for project in self.projects.iter_mut().filter(|p| p.classification_stale) {
            project.reclassify();
        }
        self.stats = Stats::fold(&self.projects);
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, name: &str) -> Option<&Project> {
        self.by_name.get(name).map(|&idx| &self.projects[idx])
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{GitStatus, HostingStatus, LanguageInfo, ProjectKind};
    use pretty_assertions::assert_eq;

    fn names(registry: &Registry) -> Vec<&str> {
        registry.projects().iter().map(|p| p.name.as_str()).collect()
    }

    fn sample() -> Vec<Project> {
        vec![
            Project::new("bestwnc.com", "~/Projects/bestwnc.com", ProjectKind::Vercel),
            Project::new("ileague.golf", "~/Projects/ileague.golf", ProjectKind::Vercel),
            Project::new("whisper-app", "~/Projects/whisper-app", ProjectKind::Swift),
            Project::new("nfglyph", "~/Projects/nfglyph", ProjectKind::Git),
        ]
    }

    fn git(staged: u32, untracked: u32, modified: u32) -> StatusUpdate {
        StatusUpdate::Git(GitStatus {
            staged,
            untracked,
            modified,
            ..GitStatus::default()
        })
    }

    #[test]
    fn load_keeps_order_and_resets_status() {
        let mut seeded = sample();
        seeded[0].running = true;
        seeded[0].git = Some(GitStatus::default());

        let mut registry = Registry::new();
        let generation = registry.load(seeded);
        assert_eq!(generation, 1);
        assert_eq!(
            names(&registry),
            vec!["bestwnc.com", "ileague.golf", "whisper-app", "nfglyph"]
        );
        let first = registry.get("bestwnc.com").unwrap();
        assert!(!first.running);
        assert!(first.git.is_none());
    }

    #[test]
    fn load_skips_duplicate_names() {
        let mut registry = Registry::new();
        registry.load(vec![
            Project::new("a", "/one", ProjectKind::Git),
            Project::new("a", "/two", ProjectKind::Git),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().path, "/one");
    }

    #[test]
    fn empty_load_is_valid() {
        let mut registry = Registry::new();
        registry.load(Vec::new());
        assert!(registry.is_empty());
        assert_eq!(registry.stats(), Stats::default());
    }

    #[test]
    fn update_to_unknown_name_is_noop() {
        let mut registry = Registry::new();
        registry.load(sample());
        let before: Vec<Project> = registry.projects().to_vec();
        assert!(!registry.apply_status_update("ghost", git(1, 2, 3)));
        registry.recompute_derived();
        assert_eq!(registry.projects(), before.as_slice());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn update_only_touches_its_group() {
        let mut registry = Registry::new();
        registry.load(sample());
        registry.apply_status_update(
            "nfglyph",
            StatusUpdate::Hosting(HostingStatus {
                issues: 3,
                pull_requests: 1,
            }),
        );
        registry.apply_status_update("nfglyph", git(0, 4, 0));
        let project = registry.get("nfglyph").unwrap();
        assert_eq!(project.hosting.unwrap().issues, 3);
        assert_eq!(project.git.as_ref().unwrap().untracked, 4);
        assert!(project.deploy.is_none());
        assert!(project.commits.is_none());
    }

    #[test]
    fn git_update_moves_untracked_total_by_exact_delta() {
        let mut registry = Registry::new();
        registry.load(sample());
        registry.apply_status_update("nfglyph", git(0, 2, 1));
        registry.recompute_derived();
        let before = registry.stats();

        registry.apply_status_update("ileague.golf", git(1, 5, 0));
        registry.recompute_derived();
        let after = registry.stats();

        assert_eq!(after.total_untracked, before.total_untracked + 5);
        assert_eq!(after.total_staged, before.total_staged + 1);
        assert_eq!(after.total_modified, before.total_modified);
        assert_eq!(
            registry.get("nfglyph").unwrap().git.as_ref().unwrap().untracked,
            2
        );
    }

    #[test]
    fn refold_is_idempotent() {
        let mut registry = Registry::new();
        registry.load(sample());
        registry.apply_status_update("bestwnc.com", StatusUpdate::Deploy(DeployState::Ready));
        registry.apply_status_update("ileague.golf", StatusUpdate::Deploy(DeployState::Failed));
        registry.apply_status_update("whisper-app", StatusUpdate::Running(true));
        registry.recompute_derived();
        let once = registry.stats();
        registry.recompute_derived();
        assert_eq!(registry.stats(), once);
        assert_eq!(once, Stats::fold(registry.projects()));
        assert_eq!(once.deploy_ready, 1);
        assert_eq!(once.deploy_failed, 1);
        assert_eq!(once.running, 1);
    }

    #[test]
    fn language_update_reclassifies_on_recompute() {
        let mut registry = Registry::new();
        registry.load(sample());
        registry.apply_status_update(
            "nfglyph",
            StatusUpdate::Language(LanguageInfo {
                language: Some("Rust".to_string()),
                ..LanguageInfo::default()
            }),
        );
        assert_eq!(registry.get("nfglyph").unwrap().kind, ProjectKind::Git);
        registry.recompute_derived();
        assert_eq!(registry.get("nfglyph").unwrap().kind, ProjectKind::Rust);
    }

    #[test]
    fn reload_bumps_generation_and_ignores_stale_names() {
        let mut registry = Registry::new();
        registry.load(sample());
        let generation = registry.load(vec![Project::new("fresh", "/fresh", ProjectKind::Git)]);
        assert_eq!(generation, 2);
        let snapshot: Vec<Project> = registry.projects().to_vec();

        assert!(!registry.apply_status_update("ileague.golf", git(9, 9, 9)));
        registry.recompute_derived();
        assert_eq!(registry.projects(), snapshot.as_slice());
        assert_eq!(registry.stats().total_untracked, 0);
    }
}
