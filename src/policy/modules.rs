//! Module unlocking, progress and assignment difficulty

use serde::Serialize;

use crate::models::{Difficulty, Module, ModuleStatus, Session};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleState {
    #[serde(flatten)]
    pub module: Module,
    pub locked: bool,
}

/// Sort by `order` (stable) and mark locks.
///
/// The first module is always open. Any later module is locked unless it or its
/// predecessor is completed.
pub fn unlock_states(mut modules: Vec<Module>) -> Vec<ModuleState> {
    modules.sort_by_key(|m| m.order);

    let mut previous_completed = true;
    modules
        .into_iter()
        .enumerate()
        .map(|(index, module)| {
            let completed = module.status == ModuleStatus::Completed;
            let locked = index > 0 && !completed && !previous_completed;
            previous_completed = completed;
            ModuleState { module, locked }
        })
        .collect()
}

/// Rounded percentage of completed modules, 0 when there are none
pub fn progress_percent(modules: &[Module]) -> u8 {
    if modules.is_empty() {
        return 0;
    }
    let completed = modules
        .iter()
        .filter(|m| m.status == ModuleStatus::Completed)
        .count();
    ((completed as f64 * 100.0) / modules.len() as f64).round() as u8
}

pub fn difficulty(max_marks: u32) -> Difficulty {
    match max_marks {
        0..=50 => Difficulty::Easy,
        51..=100 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

/// Sessions linked to a module through `module_id`, in upstream order
pub fn sessions_for_module<'a>(sessions: &'a [Session], module_id: &str) -> Vec<&'a Session> {
    sessions
        .iter()
        .filter(|s| s.module_id.as_deref() == Some(module_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus;
    use crate::policy::fixtures::{module, session};

    fn locks(states: &[ModuleState]) -> Vec<bool> {
        states.iter().map(|s| s.locked).collect()
    }

    #[test]
    fn test_second_module_locked_until_first_completed() {
        let modules = vec![
            module("a", 0, ModuleStatus::Pending),
            module("b", 1, ModuleStatus::Pending),
        ];
        assert_eq!(locks(&unlock_states(modules)), vec![false, true]);

        let modules = vec![
            module("a", 0, ModuleStatus::Completed),
            module("b", 1, ModuleStatus::Pending),
        ];
        assert_eq!(locks(&unlock_states(modules)), vec![false, false]);
    }

    #[test]
    fn test_completed_module_is_never_locked() {
        let modules = vec![
            module("a", 0, ModuleStatus::InProgress),
            module("b", 1, ModuleStatus::Completed),
            module("c", 2, ModuleStatus::Pending),
        ];
        assert_eq!(locks(&unlock_states(modules)), vec![false, false, false]);
    }

    #[test]
    fn test_modules_sorted_by_order_before_locking() {
        let modules = vec![
            module("third", 2, ModuleStatus::Pending),
            module("first", 0, ModuleStatus::Completed),
            module("second", 1, ModuleStatus::Pending),
        ];
        let states = unlock_states(modules);
        let ids: Vec<&str> = states.iter().map(|s| s.module.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert_eq!(locks(&states), vec![false, false, true]);
    }

    #[test]
    fn test_progress() {
        assert_eq!(progress_percent(&[]), 0);

        let modules = vec![
            module("a", 0, ModuleStatus::Completed),
            module("b", 1, ModuleStatus::Completed),
            module("c", 2, ModuleStatus::Pending),
            module("d", 3, ModuleStatus::InProgress),
        ];
        assert_eq!(progress_percent(&modules), 50);

        let modules = vec![
            module("a", 0, ModuleStatus::Completed),
            module("b", 1, ModuleStatus::Pending),
            module("c", 2, ModuleStatus::Pending),
        ];
        assert_eq!(progress_percent(&modules), 33);
    }

    #[test]
    fn test_difficulty_boundaries() {
        assert_eq!(difficulty(50), Difficulty::Easy);
        assert_eq!(difficulty(51), Difficulty::Medium);
        assert_eq!(difficulty(75), Difficulty::Medium);
        assert_eq!(difficulty(100), Difficulty::Medium);
        assert_eq!(difficulty(150), Difficulty::Hard);
    }

    #[test]
    fn test_sessions_matched_by_module_id() {
        let mut linked = session("s1", SessionStatus::Scheduled, None);
        linked.module_id = Some("a".to_string());
        let unlinked = session("s2", SessionStatus::Scheduled, None);
        let sessions = vec![linked, unlinked];

        let matched = sessions_for_module(&sessions, "a");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "s1");
        assert!(sessions_for_module(&sessions, "b").is_empty());
    }
}
