use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::store::slot::{SlotStore, Snapshot};

enum Msg {
    Save(Snapshot),
    Flush(Sender<()>),
}

/// Coalesces rapid snapshot saves into a single slot write.
///
/// Each `schedule` supersedes the previous unwritten snapshot and restarts
/// the quiescence window; the write commits once no newer snapshot arrives
/// for a full window. This is coalescing, not cancellation of effect: the
/// final state always lands. Write failures are swallowed — the in-memory
/// store is authoritative and the next successful write catches up.
pub struct DebouncedWriter {
    tx: Option<Sender<Msg>>,
    worker: Option<JoinHandle<()>>,
    commits: Arc<AtomicU64>,
}

impl DebouncedWriter {
    pub fn spawn(slot: SlotStore, window: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let commits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&commits);
        let worker = thread::spawn(move || {
            let mut held: Option<Snapshot> = None;
            loop {
                let msg = if held.is_some() {
                    // Quiescence window: a newer message restarts the wait.
                    match rx.recv_timeout(window) {
                        Ok(msg) => Some(msg),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                } else {
                    match rx.recv() {
                        Ok(msg) => Some(msg),
                        Err(_) => break,
                    }
                };
                match msg {
                    Some(Msg::Save(snapshot)) => held = Some(snapshot),
                    Some(Msg::Flush(ack)) => {
                        commit(&slot, &mut held, &counter);
                        let _ = ack.send(());
                    }
                    // Window elapsed with nothing newer.
                    None => commit(&slot, &mut held, &counter),
                }
            }
            // Channel gone: write whatever is still held.
            commit(&slot, &mut held, &counter);
        });
        Self {
            tx: Some(tx),
            worker: Some(worker),
            commits,
        }
    }

    /// Queue a snapshot to be written after the quiescence window.
    pub fn schedule(&self, snapshot: Snapshot) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Msg::Save(snapshot));
        }
    }

    /// Write any held snapshot now and wait until it has hit the slot.
    pub fn flush(&self) {
        if let Some(tx) = &self.tx {
            let (ack_tx, ack_rx) = mpsc::channel();
            if tx.send(Msg::Flush(ack_tx)).is_ok() {
                let _ = ack_rx.recv();
            }
        }
    }

    /// Number of slot writes committed so far.
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }
}

fn commit(slot: &SlotStore, held: &mut Option<Snapshot>, commits: &AtomicU64) {
    if let Some(snapshot) = held.take()
        && slot.save_tasks(&snapshot).is_ok()
    {
        commits.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        // Disconnect the channel; the worker flushes anything held and exits.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::store::slot::SnapshotTask;
    use tempfile::tempdir;

    const WINDOW: Duration = Duration::from_millis(60);

    fn snapshot_with(text: &str) -> Snapshot {
        Snapshot {
            pending: vec![SnapshotTask {
                task_text: text.into(),
                priority: Priority::Medium,
                due_date: String::new(),
            }],
            completed: vec![],
        }
    }

    #[test]
    fn rapid_saves_coalesce_into_one_write_with_the_final_state() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();
        let writer = DebouncedWriter::spawn(slot.clone(), WINDOW);

        for i in 1..=5 {
            writer.schedule(snapshot_with(&format!("edit {i}")));
        }
        thread::sleep(WINDOW * 4);

        assert_eq!(writer.commits(), 1);
        assert_eq!(slot.load_tasks(), snapshot_with("edit 5"));
    }

    #[test]
    fn nothing_is_written_inside_the_quiescence_window() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();
        let writer = DebouncedWriter::spawn(slot.clone(), Duration::from_secs(5));

        writer.schedule(snapshot_with("held"));
        thread::sleep(Duration::from_millis(50));

        assert_eq!(writer.commits(), 0);
        assert_eq!(slot.load_tasks(), Snapshot::default());
    }

    #[test]
    fn flush_commits_immediately() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();
        let writer = DebouncedWriter::spawn(slot.clone(), Duration::from_secs(5));

        writer.schedule(snapshot_with("now"));
        writer.flush();

        assert_eq!(writer.commits(), 1);
        assert_eq!(slot.load_tasks(), snapshot_with("now"));
    }

    #[test]
    fn flush_with_nothing_held_is_a_noop() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();
        let writer = DebouncedWriter::spawn(slot, Duration::from_secs(5));

        writer.flush();
        assert_eq!(writer.commits(), 0);
    }

    #[test]
    fn drop_flushes_the_held_snapshot() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();
        let writer = DebouncedWriter::spawn(slot.clone(), Duration::from_secs(5));

        writer.schedule(snapshot_with("last words"));
        drop(writer);

        assert_eq!(slot.load_tasks(), snapshot_with("last words"));
    }

    #[test]
    fn later_writes_still_land_after_an_earlier_commit() {
        let dir = tempdir().unwrap();
        let slot = SlotStore::init(dir.path()).unwrap();
        let writer = DebouncedWriter::spawn(slot.clone(), WINDOW);

        writer.schedule(snapshot_with("first"));
        thread::sleep(WINDOW * 4);
        writer.schedule(snapshot_with("second"));
        thread::sleep(WINDOW * 4);

        assert_eq!(writer.commits(), 2);
        assert_eq!(slot.load_tasks(), snapshot_with("second"));
    }
}
