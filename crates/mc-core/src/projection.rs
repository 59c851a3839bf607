use crate::project::Project;

/// Indices of the projects whose name contains `filter`, case-insensitively,
/// in registry order. An empty filter selects everything.
pub fn project(filter: &str, projects: &[Project]) -> Vec<usize> {
    let needle = filter.to_lowercase();
    projects
        .iter()
        .enumerate()
        .filter(|(_, project)| needle.is_empty() || project.name.to_lowercase().contains(&needle))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectKind;
    use pretty_assertions::assert_eq;

    fn projects(names: &[&str]) -> Vec<Project> {
        names
            .iter()
            .map(|name| Project::new(*name, format!("/p/{name}"), ProjectKind::Git))
            .collect()
    }

    fn picked<'a>(all: &'a [Project], filter: &str) -> Vec<&'a str> {
        project(filter, all)
            .into_iter()
            .map(|idx| all[idx].name.as_str())
            .collect()
    }

    #[test]
    fn empty_filter_is_identity() {
        let all = projects(&["b", "a", "c"]);
        assert_eq!(project("", &all), vec![0, 1, 2]);
    }

    #[test]
    fn filter_matches_by_literal_containment() {
        let names = ["bestwnc.com", "ileague.golf", "whisper-app", "nfglyph"];
        let all = projects(&names);
        let expected: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| name.to_lowercase().contains('i'))
            .collect();
        assert_eq!(picked(&all, "i"), expected);
        assert_eq!(picked(&all, "i"), vec!["ileague.golf", "whisper-app"]);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let all = projects(&["MissionControl", "notes", "mission-site"]);
        assert_eq!(picked(&all, "MISSION"), vec!["MissionControl", "mission-site"]);
        assert_eq!(picked(&all, "zzz"), Vec::<&str>::new());
    }
}
