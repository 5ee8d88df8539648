use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::{PrioError, Result};
use crate::model::{Counter, Priority, Sequence, Task};
use crate::store::config::Config;
use crate::store::debounce::DebouncedWriter;
use crate::store::slot::{SlotStore, Snapshot, SnapshotTask};
use crate::store::tasks::TaskStore;
use crate::task_id::TaskId;

/// A live editing session: the reconciliation layer between user gestures
/// and the task store.
///
/// Opening a session loads the persisted snapshot once; if the slot store is
/// unusable the session silently runs memory-only. After every mutating
/// action the store has already re-sorted itself, then the session schedules
/// a debounced persistence write and recomputes the counter, in that order.
/// The in-memory store is authoritative throughout; the persisted snapshot
/// may lag by the quiescence window until `flush`.
pub struct Session {
    store: TaskStore,
    writer: Option<DebouncedWriter>,
    counter: Counter,
}

impl Session {
    pub fn open(dir_root: &Path) -> Result<Self> {
        let slot = SlotStore::open(dir_root)?;
        let config = Config::load(slot.root());

        let mut store = TaskStore::new();
        let mut writer = None;
        if slot.is_available() {
            populate(&mut store, &slot.load_tasks())?;
            writer = Some(DebouncedWriter::spawn(
                slot,
                Duration::from_millis(config.debounce_ms),
            ));
        }

        let counter = store.counter();
        Ok(Self {
            store,
            writer,
            counter,
        })
    }

    /// A session with no backing store at all. State lives and dies with the
    /// value.
    pub fn ephemeral() -> Self {
        Self {
            store: TaskStore::new(),
            writer: None,
            counter: Counter::default(),
        }
    }

    pub fn pending(&self) -> &[Task] {
        self.store.pending()
    }

    pub fn completed(&self) -> &[Task] {
        self.store.completed()
    }

    pub fn sequence(&self, seq: Sequence) -> &[Task] {
        self.store.sequence(seq)
    }

    pub fn counter(&self) -> Counter {
        self.counter
    }

    pub fn locate(&self, id: &TaskId) -> Option<(Sequence, usize)> {
        self.store.locate(id)
    }

    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.store.find(id)
    }

    /// Resolve a 1-based list position (as printed by `list`) to a record
    /// reference. Positions are stable between invocations because the
    /// sequences are deterministically sorted.
    pub fn resolve(&self, seq: Sequence, position: usize) -> Result<TaskId> {
        position
            .checked_sub(1)
            .and_then(|idx| self.store.sequence(seq).get(idx))
            .map(|task| task.id.clone())
            .ok_or(PrioError::NoSuchPosition(seq, position))
    }

    pub fn add(
        &mut self,
        text: &str,
        priority: Priority,
        due_date: Option<NaiveDate>,
    ) -> Result<TaskId> {
        let id = self.store.add(text, priority, due_date, Sequence::Pending)?;
        self.committed();
        Ok(id)
    }

    pub fn complete(&mut self, id: &TaskId) -> bool {
        let changed = self.store.set_completed(id, true);
        if changed {
            self.committed();
        }
        changed
    }

    pub fn restore(&mut self, id: &TaskId) -> bool {
        let changed = self.store.set_completed(id, false);
        if changed {
            self.committed();
        }
        changed
    }

    pub fn remove(&mut self, id: &TaskId) -> bool {
        let changed = self.store.remove(id);
        if changed {
            self.committed();
        }
        changed
    }

    pub fn edit_text(&mut self, id: &TaskId, new_text: &str) -> Result<bool> {
        let changed = self.store.edit_text(id, new_text)?;
        if changed {
            self.committed();
        }
        Ok(changed)
    }

    pub fn edit_due_date(&mut self, id: &TaskId, due_date: Option<NaiveDate>) -> bool {
        let changed = self.store.edit_due_date(id, due_date);
        if changed {
            self.committed();
        }
        changed
    }

    pub fn reorder(&mut self, id: &TaskId, before: Option<&TaskId>, target: Sequence) -> bool {
        let changed = self.store.reorder(id, before, target);
        if changed {
            self.committed();
        }
        changed
    }

    pub fn clear_completed(&mut self) -> usize {
        let n = self.store.clear_completed();
        if n > 0 {
            self.committed();
        }
        n
    }

    /// Current store state in the persisted wire shape.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pending: self.store.pending().iter().map(SnapshotTask::from_task).collect(),
            completed: self
                .store
                .completed()
                .iter()
                .map(SnapshotTask::from_task)
                .collect(),
        }
    }

    /// Force any pending debounced write to disk before returning.
    pub fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush();
        }
    }

    /// Slot writes committed by this session so far.
    pub fn writes_committed(&self) -> u64 {
        self.writer.as_ref().map_or(0, DebouncedWriter::commits)
    }

    /// The sort already ran inside the store; schedule the write, then
    /// refresh the derived counter.
    fn committed(&mut self) {
        if let Some(writer) = &self.writer {
            writer.schedule(self.snapshot());
        }
        self.counter = self.store.counter();
    }
}

fn populate(store: &mut TaskStore, snapshot: &Snapshot) -> Result<()> {
    for (seq, entries) in [
        (Sequence::Pending, &snapshot.pending),
        (Sequence::Completed, &snapshot.completed),
    ] {
        for entry in entries {
            // A blank-text entry is unrepresentable in the store; skip it
            // rather than refusing the whole snapshot.
            if entry.task_text.trim().is_empty() {
                continue;
            }
            store.add(&entry.task_text, entry.priority, entry.due(), seq)?;
        }
    }
    Ok(())
}

/// Walk up from the current directory to the nearest `.prio` root.
pub fn find_root() -> Result<PathBuf> {
    let mut dir = std::env::current_dir().map_err(PrioError::Io)?;
    loop {
        if dir.join(".prio").exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(PrioError::NotInitialized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::slot::SlotStore;
    use std::fs;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn open_on_a_fresh_directory_starts_empty() {
        let dir = tempdir().unwrap();
        SlotStore::init(dir.path()).unwrap();
        let session = Session::open(dir.path()).unwrap();
        assert!(session.pending().is_empty());
        assert!(session.completed().is_empty());
        assert_eq!(session.counter(), Counter::default());
    }

    #[test]
    fn open_restores_both_sequences_with_fresh_ids() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();
        fs::write(
            slot.root().join("tasks.json"),
            br#"{
                "pending": [
                    {"taskText": "walk the dog", "priority": "high", "dueDate": "2024-02-01"},
                    {"taskText": "idle", "priority": "low", "dueDate": ""}
                ],
                "completed": [
                    {"taskText": "done already", "priority": "medium", "dueDate": ""}
                ]
            }"#,
        )
        .unwrap();

        let session = Session::open(dir.path()).unwrap();
        assert_eq!(session.pending().len(), 2);
        assert_eq!(session.pending()[0].text, "walk the dog");
        assert_eq!(session.pending()[0].due_date, Some(date("2024-02-01")));
        assert_eq!(session.completed()[0].text, "done already");
        assert_eq!(session.counter().total, 3);
    }

    #[test]
    fn malformed_snapshot_opens_as_empty_not_error() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();
        fs::write(slot.root().join("tasks.json"), b"]]][[").unwrap();
        let session = Session::open(dir.path()).unwrap();
        assert_eq!(session.counter().total, 0);
    }

    #[test]
    fn blank_snapshot_entries_are_skipped() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();
        fs::write(
            slot.root().join("tasks.json"),
            br#"{"pending": [
                {"taskText": "   ", "priority": "high", "dueDate": ""},
                {"taskText": "kept", "priority": "low", "dueDate": ""}
            ], "completed": []}"#,
        )
        .unwrap();
        let session = Session::open(dir.path()).unwrap();
        assert_eq!(session.pending().len(), 1);
        assert_eq!(session.pending()[0].text, "kept");
    }

    #[test]
    fn mutations_flow_to_the_slot_after_flush() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();

        let mut session = Session::open(dir.path()).unwrap();
        session.add("persist me", Priority::High, None).unwrap();
        session.flush();

        let written = slot.load_tasks();
        assert_eq!(written.pending.len(), 1);
        assert_eq!(written.pending[0].task_text, "persist me");
    }

    #[test]
    fn counter_is_recomputed_after_every_action() {
        let mut session = Session::ephemeral();
        session.add("a", Priority::High, None).unwrap();
        session.add("b", Priority::Low, None).unwrap();
        assert_eq!(session.counter().total, 2);

        let id = session.resolve(Sequence::Pending, 1).unwrap();
        session.complete(&id);
        assert_eq!(session.counter().completed, 1);
        assert_eq!(session.counter().percentage, 50);

        session.clear_completed();
        assert_eq!(session.counter().total, 1);
        assert_eq!(session.counter().percentage, 0);
    }

    #[test]
    fn resolve_maps_positions_and_rejects_bad_ones() {
        let mut session = Session::ephemeral();
        session.add("only", Priority::Medium, None).unwrap();

        let id = session.resolve(Sequence::Pending, 1).unwrap();
        assert_eq!(session.find(&id).unwrap().text, "only");

        assert!(matches!(
            session.resolve(Sequence::Pending, 0),
            Err(PrioError::NoSuchPosition(Sequence::Pending, 0))
        ));
        assert!(matches!(
            session.resolve(Sequence::Pending, 2),
            Err(PrioError::NoSuchPosition(Sequence::Pending, 2))
        ));
        assert!(matches!(
            session.resolve(Sequence::Completed, 1),
            Err(PrioError::NoSuchPosition(Sequence::Completed, 1))
        ));
    }

    #[test]
    fn noop_actions_do_not_schedule_writes() {
        let dir = tempdir().unwrap();
        SlotStore::init(dir.path()).unwrap();
        let mut session = Session::open(dir.path()).unwrap();

        let ghost = crate::task_id::TaskId::from(1_u64);
        assert!(!session.complete(&ghost));
        assert!(!session.remove(&ghost));
        assert_eq!(session.clear_completed(), 0);
        session.flush();

        assert_eq!(session.writes_committed(), 0);
    }

    #[test]
    fn ephemeral_session_never_writes() {
        let mut session = Session::ephemeral();
        session.add("ram only", Priority::Low, None).unwrap();
        session.flush();
        assert_eq!(session.writes_committed(), 0);
        assert_eq!(session.pending().len(), 1);
    }
}
