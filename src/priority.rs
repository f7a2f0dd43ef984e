//! Manual priority: set or clear `Prioritas 1..3` on one project or a selection.
//!
//! Priority is a badge, not a sort key. Every path here goes through the
//! board's optimistic dispatch, so the board's stable order is untouched and
//! a failed write restores the previous values for the whole batch.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::board::Board;
use crate::error::{EngineError, Result};
use crate::model::{Priority, Project};
use crate::store::ProjectStore;

/// Result of a bulk priority change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub total_updated: usize,
}

/// Parse a priority argument: `1`..`3` (optionally `p`-prefixed) or `none`.
pub fn parse_priority(raw: &str) -> core::result::Result<Option<Priority>, String> {
    let value = raw.trim().to_lowercase();
    if matches!(value.as_str(), "none" | "clear" | "-") {
        return Ok(None);
    }
    value
        .strip_prefix('p')
        .unwrap_or(&value)
        .parse::<u8>()
        .ok()
        .and_then(Priority::from_level)
        .map(Some)
        .ok_or_else(|| format!("invalid priority '{raw}': expected 1, 2, 3, or none"))
}

/// Set or clear one project's priority.
pub fn set_priority<'b, S: ProjectStore + ?Sized>(
    board: &'b mut Board,
    store: &S,
    pid: &str,
    priority: Option<Priority>,
) -> Result<&'b Project> {
    if board.get(pid).is_none() {
        return Err(EngineError::UnknownProject(pid.to_string()));
    }
    tracing::debug!(pid, priority = ?priority, "setting priority");

    let record = board.dispatch(
        |projects| {
            if let Some(p) = projects.iter_mut().find(|p| p.pid == pid) {
                p.prioritas = priority;
            }
        },
        || store.set_priority(pid, priority),
    )?;
    board.accept(record)
}

/// Apply one priority to a selection of projects, all or nothing.
///
/// Blank identifiers and identifiers not on the board are dropped and
/// duplicates collapse. If nothing is left the call fails with
/// [`EngineError::NoSelection`] and nothing is written.
pub fn set_priority_selected<S, I>(
    board: &mut Board,
    store: &S,
    ids: I,
    priority: Option<Priority>,
) -> Result<BulkOutcome>
where
    S: ProjectStore + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let selection: BTreeSet<String> = ids
        .into_iter()
        .map(|id| id.as_ref().trim().to_string())
        .filter(|id| !id.is_empty() && board.get(id).is_some())
        .collect();
    if selection.is_empty() {
        return Err(EngineError::NoSelection);
    }

    let pids: Vec<String> = selection.iter().cloned().collect();
    tracing::debug!(count = pids.len(), priority = ?priority, "setting priority on selection");

    let total_updated = board.dispatch(
        |projects| {
            for p in projects.iter_mut().filter(|p| selection.contains(&p.pid)) {
                p.prioritas = priority;
            }
        },
        || store.set_priority_bulk(&pids, priority),
    )?;

    // The bulk write returns no records; a follow-up fetch settles any
    // concurrent edits. The write itself already succeeded.
    if let Err(e) = board.refresh(store) {
        tracing::warn!(error = %e, "refresh after bulk priority failed; keeping local values");
    }

    Ok(BulkOutcome { total_updated })
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    use crate::model::{DurationDays, ProjectRecord};
    use crate::store::StoreError;
    use crate::store::testing::ScriptedStore;

    fn seeded(pids: &[&str]) -> (ScriptedStore, Board) {
        let store = ScriptedStore::new();
        for (i, pid) in (0i64..).zip(pids) {
            let project = Project::new(
                *pid,
                "",
                DurationDays::default(),
                Timestamp::new(1_000 + i, 0).unwrap(),
            );
            store.create(&ProjectRecord::from(&project)).unwrap();
        }
        let board = Board::load(&store).unwrap();
        (store, board)
    }

    fn order(board: &Board) -> Vec<String> {
        board.projects().iter().map(|p| p.pid.clone()).collect()
    }

    fn priorities(board: &Board) -> Vec<Option<Priority>> {
        board.projects().iter().map(|p| p.prioritas).collect()
    }

    #[test]
    fn parse_priority_arguments() {
        assert_eq!(parse_priority("1"), Ok(Some(Priority::P1)));
        assert_eq!(parse_priority(" P3 "), Ok(Some(Priority::P3)));
        assert_eq!(parse_priority("none"), Ok(None));
        assert!(parse_priority("0").is_err());
        assert!(parse_priority("4").is_err());
        assert!(parse_priority("high").is_err());
    }

    #[test]
    fn set_and_clear_single_priority() {
        let (store, mut board) = seeded(&["A", "B"]);

        let project = set_priority(&mut board, &store, "A", Some(Priority::P2)).unwrap();
        assert_eq!(project.prioritas, Some(Priority::P2));
        assert_eq!(store.get("A").unwrap().prioritas, Some(2));

        let project = set_priority(&mut board, &store, "A", None).unwrap();
        assert_eq!(project.prioritas, None);
    }

    #[test]
    fn every_priority_transition_is_allowed() {
        let (store, mut board) = seeded(&["A"]);
        let states = [None, Some(Priority::P1), Some(Priority::P2), Some(Priority::P3)];
        for from in states {
            for to in states {
                set_priority(&mut board, &store, "A", from).unwrap();
                let project = set_priority(&mut board, &store, "A", to).unwrap();
                assert_eq!(project.prioritas, to);
            }
        }
    }

    #[test]
    fn priority_changes_never_reorder() {
        let (store, mut board) = seeded(&["A", "B", "C", "D", "E"]);
        let before = order(&board);

        set_priority(&mut board, &store, "C", Some(Priority::P1)).unwrap();
        set_priority(&mut board, &store, "A", Some(Priority::P3)).unwrap();
        set_priority_selected(&mut board, &store, ["E", "B"], Some(Priority::P2)).unwrap();
        set_priority_selected(&mut board, &store, ["A", "C"], None).unwrap();
        assert_eq!(order(&board), before);

        board.refresh(&store).unwrap();
        assert_eq!(order(&board), before);
    }

    #[test]
    fn bulk_sets_selected_and_leaves_others() {
        let (store, mut board) = seeded(&["A", "B", "C", "D"]);
        set_priority(&mut board, &store, "D", Some(Priority::P3)).unwrap();

        let outcome =
            set_priority_selected(&mut board, &store, ["A", "B", "C"], Some(Priority::P2)).unwrap();
        assert_eq!(outcome.total_updated, 3);

        let fetched = Board::load(&store).unwrap();
        for pid in ["A", "B", "C"] {
            assert_eq!(fetched.get(pid).unwrap().prioritas, Some(Priority::P2));
        }
        assert_eq!(fetched.get("D").unwrap().prioritas, Some(Priority::P3));
        assert_eq!(priorities(&board), priorities(&fetched));
    }

    #[test]
    fn empty_selection_is_an_error_and_writes_nothing() {
        let (store, mut board) = seeded(&["A"]);
        store.offline.set(true);

        let err = set_priority_selected(&mut board, &store, Vec::<String>::new(), Some(Priority::P2))
            .unwrap_err();
        assert!(matches!(err, EngineError::NoSelection));

        let err = set_priority_selected(&mut board, &store, ["", "  ", "ghost"], Some(Priority::P2))
            .unwrap_err();
        assert!(matches!(err, EngineError::NoSelection));
    }

    #[test]
    fn invalid_ids_are_filtered_from_selection() {
        let (store, mut board) = seeded(&["A", "B"]);
        let outcome =
            set_priority_selected(&mut board, &store, [" A ", "", "ghost", "A"], Some(Priority::P1))
                .unwrap();
        assert_eq!(outcome.total_updated, 1);
        assert_eq!(board.get("A").unwrap().prioritas, Some(Priority::P1));
        assert_eq!(board.get("B").unwrap().prioritas, None);
    }

    #[test]
    fn failed_bulk_write_rolls_back_the_whole_batch() {
        let (store, mut board) = seeded(&["A", "B", "C"]);
        set_priority(&mut board, &store, "B", Some(Priority::P3)).unwrap();
        let before = priorities(&board);

        store.offline.set(true);
        let err = set_priority_selected(&mut board, &store, ["A", "B", "C"], Some(Priority::P1))
            .unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::Io(_))));
        assert_eq!(priorities(&board), before);
    }

    #[test]
    fn failed_single_write_rolls_back() {
        let (store, mut board) = seeded(&["A"]);
        store.offline.set(true);
        assert!(set_priority(&mut board, &store, "A", Some(Priority::P1)).is_err());
        assert_eq!(board.get("A").unwrap().prioritas, None);
    }

    #[test]
    fn concurrent_priority_from_store_wins() {
        let (store, mut board) = seeded(&["A"]);
        store.concurrent_priority.set(Some(Some(Priority::P3)));

        let project = set_priority(&mut board, &store, "A", Some(Priority::P1)).unwrap();
        assert_eq!(project.prioritas, Some(Priority::P3));

        board.refresh(&store).unwrap();
        assert_eq!(board.get("A").unwrap().prioritas, Some(Priority::P3));
    }

    #[test]
    fn unknown_project_is_rejected() {
        let (store, mut board) = seeded(&["A"]);
        let err = set_priority(&mut board, &store, "Z", Some(Priority::P1)).unwrap_err();
        assert!(matches!(err, EngineError::UnknownProject(_)));
    }
}
