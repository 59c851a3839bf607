use async_trait::async_trait;
use mc_core::probe::{groups_for, run_probe};
use mc_core::projection::project;
use mc_core::{
    CommitTimes, DeployState, FieldGroup, GitStatus, HostingStatus, LanguageInfo, Motion,
    ProjectKind, Registry, StatusProbes, Viewport,
};
use pretty_assertions::assert_eq;
use std::path::Path;

/// Answers from the last path component so results are easy to predict.
struct Canned;

#[async_trait]
impl StatusProbes for Canned {
    async fn git(&self, path: &Path) -> Option<GitStatus> {
        let name = path.file_name()?.to_str()?;
        Some(GitStatus {
            untracked: name.len() as u32,
            branch: "main".to_string(),
            ..GitStatus::default()
        })
    }

    async fn hosting(&self, path: &Path) -> Option<HostingStatus> {
        path.ends_with("nfglyph").then_some(HostingStatus {
            issues: 2,
            pull_requests: 1,
        })
    }

    async fn deploy(&self, _: &Path) -> Option<DeployState> {
        Some(DeployState::Ready)
    }

    async fn language(&self, path: &Path) -> Option<LanguageInfo> {
        let language = if path.ends_with("nfglyph") { "Rust" } else { "TypeScript" };
        Some(LanguageInfo {
            language: Some(language.to_string()),
            ..LanguageInfo::default()
        })
    }

    async fn commit_times(&self, _: &Path) -> Option<CommitTimes> {
        None
    }
}

fn seed() -> Vec<mc_core::Project> {
    let discovered = mc_core::discover::parse_cache(
        r#"[
            {"name": "bestwnc.com", "path": "/p/bestwnc.com", "type": "vercel"},
            {"name": "ileague.golf", "path": "/p/ileague.golf", "type": "vercel"},
            {"name": "whisper-app", "path": "/p/whisper-app", "type": "swift"},
            {"name": "nfglyph", "path": "/p/nfglyph", "type": "cli"}
        ]"#,
    )
    .unwrap();
    discovered.into_iter().map(Into::into).collect()
}

#[tokio::test]
async fn out_of_order_results_converge_to_full_fold() {
    let mut registry = Registry::new();
    registry.load(seed());

    let mut jobs = Vec::new();
    for project in registry.projects() {
        for group in groups_for(project.discovered_kind) {
            jobs.push((project.name.clone(), project.path.clone(), group));
        }
    }
    // Deliver in reverse to mimic probes finishing out of order.
    jobs.reverse();
    for (name, path, group) in jobs {
        if let Some(update) = run_probe(&Canned, group, Path::new(&path)).await {
            registry.apply_status_update(&name, update);
        }
        registry.recompute_derived();
        assert_eq!(registry.stats(), mc_core::Stats::fold(registry.projects()));
    }

    let stats = registry.stats();
    assert_eq!(stats.total_projects, 4);
    assert_eq!(stats.deploy_ready, 2);
    assert_eq!(stats.total_issues, 2);
    assert_eq!(
        stats.total_untracked,
        ("bestwnc.com".len() + "ileague.golf".len() + "whisper-app".len() + "nfglyph".len())
            as u64
    );
    assert_eq!(registry.get("nfglyph").unwrap().kind, ProjectKind::Rust);
    assert_eq!(registry.get("whisper-app").unwrap().kind, ProjectKind::Vercel);
    assert!(registry.get("whisper-app").unwrap().deploy.is_none());
    assert!(registry.get("bestwnc.com").unwrap().commits.is_none());
}

#[test]
fn viewport_stays_valid_while_filter_and_registry_change() {
    let mut registry = Registry::new();
    registry.load(seed());
    let mut viewport = Viewport::new(2);

    viewport.apply(Motion::Last, None, project("", registry.projects()).len());
    assert_eq!(viewport.selection(), 3);

    let filtered = project("i", registry.projects());
    viewport.clamp(filtered.len());
    assert_eq!(viewport.selected(filtered.len()), Some(1));
    assert_eq!(registry.projects()[filtered[1]].name, "whisper-app");

    registry.load(Vec::new());
    let filtered = project("i", registry.projects());
    viewport.clamp(filtered.len());
    assert_eq!(viewport.selected(filtered.len()), None);
    assert_eq!(registry.stats().total_projects, 0);
    assert!(!registry.apply_status_update("nfglyph", mc_core::StatusUpdate::Running(true)));
    assert_eq!(FieldGroup::PROBED.len(), 5);
}
