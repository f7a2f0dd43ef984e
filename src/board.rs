//! The project board: the in-memory list the dashboard renders.
//!
//! The board is ordered by a stable key (newest `created_at` first, PID as a
//! tie-break) that ignores priority and status, so edits never make rows jump.
//!
//! Writes are optimistic. The edited list is swapped in before the store is
//! called; the previous list is kept as the known-good snapshot and restored
//! if the store fails. Whatever the store answers replaces the optimistic
//! value, and [`Board::refresh`] replaces everything with fetched truth.

use jiff::{Timestamp, civil::Date};

use crate::classify::{CardStats, Filter};
use crate::error::{EngineError, Result};
use crate::model::{
    Checkpoint, DurationDays, ProcurementStatus, Progress, Project, ProjectPatch, ProjectRecord,
    normalize,
};
use crate::store::{self, ProjectStore};
use crate::workflow;

#[derive(Debug, Clone, Default)]
pub struct Board {
    projects: Vec<Project>,
}

impl Board {
    /// Parse fetched records into a board.
    pub fn from_records(records: Vec<ProjectRecord>) -> Result<Self> {
        let mut projects = records
            .into_iter()
            .map(Project::try_from)
            .collect::<core::result::Result<Vec<_>, _>>()?;
        sort_stable(&mut projects);
        Ok(Self { projects })
    }

    pub fn load<S: ProjectStore + ?Sized>(store: &S) -> Result<Self> {
        Self::from_records(store.list()?)
    }

    /// Projects in display order.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, pid: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.pid == pid)
    }

    fn require(&self, pid: &str) -> Result<&Project> {
        self.get(pid)
            .ok_or_else(|| EngineError::UnknownProject(pid.to_string()))
    }

    /// Projects matching a dashboard filter and an optional search term.
    ///
    /// The search matches PID or project name, ignoring case and spacing.
    pub fn view(&self, filter: Filter, search: Option<&str>) -> Vec<&Project> {
        let needle = search.map(normalize).filter(|s| !s.is_empty());
        self.projects
            .iter()
            .filter(|p| filter.matches(p))
            .filter(|p| {
                needle.as_ref().is_none_or(|n| {
                    normalize(&p.pid).contains(n.as_str())
                        || normalize(&p.nama_proyek).contains(n.as_str())
                })
            })
            .collect()
    }

    pub fn stats(&self) -> CardStats {
        CardStats::from_projects(&self.projects)
    }

    /// Replace the board with the store's current state.
    pub fn refresh<S: ProjectStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let fetched = Self::load(store)?;
        let overridden = fetched
            .projects
            .iter()
            .filter(|p| self.get(&p.pid).is_some_and(|local| local != *p))
            .count();
        if overridden > 0 {
            tracing::info!(overridden, "refresh replaced local values with fetched ones");
        }
        *self = fetched;
        Ok(())
    }

    /// Apply a partial update to one project.
    ///
    /// Gate violations are refused before anything is written.
    pub fn update<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        pid: &str,
        patch: &ProjectPatch,
    ) -> Result<&Project> {
        workflow::check_patch(self.require(pid)?, patch)?;
        tracing::debug!(pid, ?patch, "dispatching update");

        let record = self.dispatch(
            |projects| {
                if let Some(p) = projects.iter_mut().find(|p| p.pid == pid) {
                    patch.apply(p);
                }
            },
            || store.update(pid, patch),
        )?;
        self.accept(record)
    }

    pub fn set_checkpoint<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        pid: &str,
        checkpoint: Checkpoint,
        progress: Progress,
    ) -> Result<&Project> {
        self.update(store, pid, &ProjectPatch::checkpoint(checkpoint, progress))
    }

    pub fn set_procurement<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        pid: &str,
        status: ProcurementStatus,
    ) -> Result<&Project> {
        self.update(store, pid, &ProjectPatch::procurement(status))
    }

    /// Set the duration from user input. Invalid input never reaches the store.
    pub fn set_duration<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        pid: &str,
        raw: &str,
    ) -> Result<&Project> {
        let days = DurationDays::parse(raw)?;
        let patch = ProjectPatch {
            estimasi_durasi_hari: Some(days),
            ..ProjectPatch::default()
        };
        self.update(store, pid, &patch)
    }

    pub fn set_start_date<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        pid: &str,
        start: Option<Date>,
    ) -> Result<&Project> {
        let patch = ProjectPatch {
            tanggal_mulai: Some(start),
            ..ProjectPatch::default()
        };
        self.update(store, pid, &patch)
    }

    /// Mark the timer complete at `now`, or reopen it.
    pub fn set_timer_completed<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        pid: &str,
        completed: bool,
        now: Timestamp,
    ) -> Result<&Project> {
        let patch = ProjectPatch {
            timer_selesai_pada: Some(completed.then_some(now)),
            ..ProjectPatch::default()
        };
        self.update(store, pid, &patch)
    }

    /// Add a new project. It lands in its stable position straight away.
    pub fn create<S: ProjectStore + ?Sized>(
        &mut self,
        store: &S,
        project: Project,
    ) -> Result<&Project> {
        let record = ProjectRecord::from(&project);
        tracing::debug!(pid = %project.pid, "creating project");
        self.dispatch(
            |projects| {
                projects.push(project);
                sort_stable(projects);
            },
            || store.create(&record),
        )?;
        self.accept(record)
    }

    /// Swap in an optimistically edited copy, then run the store write.
    ///
    /// On failure the known-good list is restored and the error surfaces unchanged.
    pub(crate) fn dispatch<T>(
        &mut self,
        edit: impl FnOnce(&mut Vec<Project>),
        write: impl FnOnce() -> store::Result<T>,
    ) -> Result<T> {
        let mut optimistic = self.projects.clone();
        edit(&mut optimistic);
        let known_good = std::mem::replace(&mut self.projects, optimistic);

        match write() {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(error = %e, "store write failed; rolling back");
                self.projects = known_good;
                Err(e.into())
            }
        }
    }

    /// Replace one project with the store's answer.
    pub(crate) fn accept(&mut self, record: ProjectRecord) -> Result<&Project> {
        let fetched = Project::try_from(record)?;
        let pid = fetched.pid.clone();
        match self.projects.iter().position(|p| p.pid == pid) {
            Some(i) => {
                if self.projects[i] != fetched {
                    tracing::info!(pid = %pid, "store answer differs from local edit; keeping store value");
                }
                self.projects[i] = fetched;
            }
            None => {
                self.projects.push(fetched);
                sort_stable(&mut self.projects);
            }
        }
        self.require(&pid)
    }
}

/// Newest first, PID as tie-break. Priority and status never participate.
fn sort_stable(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.pid.cmp(&b.pid))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    use crate::store::StoreError;
    use crate::store::testing::ScriptedStore;

    fn seeded() -> (ScriptedStore, Board) {
        let store = ScriptedStore::new();
        for (pid, name, secs) in [("PID-A", "Gedung Alpha", 100), ("PID-B", "Jembatan", 300), ("PID-C", "Gudang", 200)] {
            let project = Project::new(
                pid,
                name,
                DurationDays::default(),
                Timestamp::new(secs, 0).unwrap(),
            );
            store.create(&ProjectRecord::from(&project)).unwrap();
        }
        let board = Board::load(&store).unwrap();
        (store, board)
    }

    fn pids(board: &Board) -> Vec<&str> {
        board.projects().iter().map(|p| p.pid.as_str()).collect()
    }

    fn complete_all(store: &ScriptedStore, board: &mut Board, pid: &str) {
        for checkpoint in Checkpoint::ALL {
            board
                .set_checkpoint(store, pid, checkpoint, Progress::Sudah)
                .unwrap();
        }
    }

    #[test]
    fn created_project_takes_its_stable_position() {
        let (store, mut board) = seeded();
        let project = Project::new(
            "PID-D",
            "",
            DurationDays::default(),
            Timestamp::new(250, 0).unwrap(),
        );
        board.create(&store, project).unwrap();
        assert_eq!(pids(&board), ["PID-B", "PID-D", "PID-C", "PID-A"]);
        assert!(store.get("PID-D").is_ok());
    }

    #[test]
    fn create_duplicate_surfaces_store_error() {
        let (store, mut board) = seeded();
        let project = Project::new("PID-A", "", DurationDays::default(), Timestamp::UNIX_EPOCH);
        let err = board.create(&store, project).unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::AlreadyExists(_))));
        assert_eq!(board.projects().len(), 3);
    }

    #[test]
    fn board_is_newest_first() {
        let (_store, board) = seeded();
        assert_eq!(pids(&board), ["PID-B", "PID-C", "PID-A"]);
    }

    #[test]
    fn unknown_status_in_fetched_record_is_an_error() {
        let mut project = Project::new("X", "", DurationDays::default(), Timestamp::UNIX_EPOCH);
        project.status_ct = Progress::Sudah;
        let mut record = ProjectRecord::from(&project);
        record.status_ct = "Hampir CT".into();

        let err = Board::from_records(vec![record]).unwrap_err();
        assert!(matches!(err, EngineError::Status(_)));
    }

    #[test]
    fn status_edits_do_not_reorder() {
        let (store, mut board) = seeded();
        complete_all(&store, &mut board, "PID-A");
        board
            .set_procurement(&store, "PID-A", ProcurementStatus::OtwReg)
            .unwrap();
        board
            .set_procurement(&store, "PID-C", ProcurementStatus::RevisiMitra)
            .unwrap();

        assert_eq!(pids(&board), ["PID-B", "PID-C", "PID-A"]);
        board.refresh(&store).unwrap();
        assert_eq!(pids(&board), ["PID-B", "PID-C", "PID-A"]);
    }

    #[test]
    fn gated_transition_is_refused_locally() {
        let (store, mut board) = seeded();
        let err = board
            .set_procurement(&store, "PID-A", ProcurementStatus::SekulerTtd)
            .unwrap_err();
        assert!(matches!(err, EngineError::GatedTransition { .. }));
        assert_eq!(
            store.get("PID-A").unwrap().status_procurement,
            "Antri Periv"
        );
    }

    #[test]
    fn stale_local_state_gets_store_rejection_unchanged() {
        let (store, mut board) = seeded();
        complete_all(&store, &mut board, "PID-A");

        // Someone else reverts CT behind this board's back.
        store
            .inner
            .update("PID-A", &ProjectPatch::checkpoint(Checkpoint::Ct, Progress::Belum))
            .unwrap();

        let err = board
            .set_procurement(&store, "PID-A", ProcurementStatus::OtwReg)
            .unwrap_err();
        assert!(matches!(err, EngineError::Store(StoreError::Rejected(_))));
        // Rolled back to the last known-good value.
        assert_eq!(
            board.get("PID-A").unwrap().status_procurement,
            ProcurementStatus::AntriPeriv
        );
    }

    #[test]
    fn reverting_a_checkpoint_keeps_gated_procurement() {
        let (store, mut board) = seeded();
        complete_all(&store, &mut board, "PID-A");
        board
            .set_procurement(&store, "PID-A", ProcurementStatus::ScanDokumenMitra)
            .unwrap();

        let project = board
            .set_checkpoint(&store, "PID-A", Checkpoint::RekonMaterial, Progress::Belum)
            .unwrap();
        assert_eq!(project.status_procurement, ProcurementStatus::ScanDokumenMitra);
    }

    #[test]
    fn transport_failure_rolls_back() {
        let (store, mut board) = seeded();
        let before = board.projects().to_vec();

        store.offline.set(true);
        let err = board
            .set_checkpoint(&store, "PID-B", Checkpoint::Ut, Progress::Sudah)
            .unwrap_err();

        assert!(matches!(err, EngineError::Store(StoreError::Io(_))));
        assert_eq!(board.projects(), before.as_slice());
    }

    #[test]
    fn refresh_failure_leaves_board_untouched() {
        let (store, mut board) = seeded();
        let before = board.projects().to_vec();
        store.offline.set(true);
        assert!(board.refresh(&store).is_err());
        assert_eq!(board.projects(), before.as_slice());
    }

    #[test]
    fn refresh_prefers_fetched_values() {
        let (store, mut board) = seeded();
        board
            .set_checkpoint(&store, "PID-C", Checkpoint::Ct, Progress::Sudah)
            .unwrap();

        // Another client changes the same field.
        store
            .inner
            .update("PID-C", &ProjectPatch::checkpoint(Checkpoint::Ct, Progress::Belum))
            .unwrap();

        board.refresh(&store).unwrap();
        assert_eq!(board.get("PID-C").unwrap().status_ct, Progress::Belum);
    }

    #[test]
    fn invalid_duration_is_rejected_before_the_store() {
        let (store, mut board) = seeded();
        store.offline.set(true);
        for raw in ["0", "-5", "366", "abc"] {
            let err = board.set_duration(&store, "PID-A", raw).unwrap_err();
            assert!(matches!(err, EngineError::InvalidDuration(_)), "{raw}");
        }
    }

    #[test]
    fn duration_and_start_feed_the_countdown() {
        let (store, mut board) = seeded();
        board
            .set_start_date(&store, "PID-A", Some(date(2025, 6, 1)))
            .unwrap();
        let project = board.set_duration(&store, "PID-A", "365").unwrap();
        assert_eq!(project.estimasi_durasi_hari, 365);

        let now = date(2025, 6, 2)
            .at(0, 0, 0, 0)
            .to_zoned(jiff::tz::TimeZone::UTC)
            .unwrap();
        assert_eq!(project.countdown(&now).days, 364);
    }

    #[test]
    fn timer_completion_toggles_without_touching_countdown_inputs() {
        let (store, mut board) = seeded();
        let at = Timestamp::new(9_000, 0).unwrap();

        let project = board
            .set_timer_completed(&store, "PID-B", true, at)
            .unwrap();
        assert_eq!(project.timer_selesai_pada, Some(at));
        assert_eq!(project.estimasi_durasi_hari, 7);

        let project = board
            .set_timer_completed(&store, "PID-B", false, at)
            .unwrap();
        assert_eq!(project.timer_selesai_pada, None);
    }

    #[test]
    fn update_unknown_project_fails() {
        let (store, mut board) = seeded();
        let err = board
            .set_checkpoint(&store, "PID-Z", Checkpoint::Ct, Progress::Sudah)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownProject(_)));
    }

    #[test]
    fn view_filters_and_searches() {
        let (store, mut board) = seeded();
        board
            .set_procurement(&store, "PID-C", ProcurementStatus::RevisiMitra)
            .unwrap();

        let delayed: Vec<_> = board
            .view(Filter::Delayed, None)
            .into_iter()
            .map(|p| p.pid.as_str())
            .collect();
        assert_eq!(delayed, ["PID-C"]);

        let found: Vec<_> = board
            .view(Filter::All, Some("  gedung  ALPHA"))
            .into_iter()
            .map(|p| p.pid.as_str())
            .collect();
        assert_eq!(found, ["PID-A"]);

        assert_eq!(board.view(Filter::Ongoing, Some("")).len(), 2);
    }

    #[test]
    fn board_stats_match_store_stats() {
        let (store, mut board) = seeded();
        complete_all(&store, &mut board, "PID-B");
        board
            .set_procurement(&store, "PID-B", ProcurementStatus::OtwReg)
            .unwrap();
        board
            .set_procurement(&store, "PID-A", ProcurementStatus::RevisiMitra)
            .unwrap();

        let stats = board.stats();
        assert_eq!(stats, store.card_stats().unwrap());
        assert_eq!((stats.completed, stats.delayed, stats.ongoing), (1, 1, 1));
        assert_eq!(stats.not_recon, 2);
    }
}
