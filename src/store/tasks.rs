use chrono::NaiveDate;

use crate::error::{PrioError, Result};
use crate::model::{Counter, Priority, Sequence, Task, task_order};
use crate::task_id::TaskId;

/// The in-memory task store: the authoritative state for a session.
///
/// Every record lives in exactly one of the two sequences, and both are
/// re-sorted before any mutating call returns, so callers can never observe
/// an unsorted list. Operations addressing an id that is no longer present
/// are no-ops, not errors.
#[derive(Debug, Default)]
pub struct TaskStore {
    pending: Vec<Task>,
    completed: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[Task] {
        &self.pending
    }

    pub fn completed(&self) -> &[Task] {
        &self.completed
    }

    pub fn sequence(&self, seq: Sequence) -> &[Task] {
        match seq {
            Sequence::Pending => &self.pending,
            Sequence::Completed => &self.completed,
        }
    }

    pub fn counter(&self) -> Counter {
        Counter::new(self.pending.len(), self.completed.len())
    }

    /// Insert a new record. Text is trimmed; an empty result is rejected
    /// without mutating anything. New tasks enter the pending sequence;
    /// inserting into `Completed` exists for re-creating records from a
    /// snapshot.
    pub fn add(
        &mut self,
        text: &str,
        priority: Priority,
        due_date: Option<NaiveDate>,
        seq: Sequence,
    ) -> Result<TaskId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PrioError::EmptyText);
        }
        let id = TaskId::generate()?;
        self.sequence_mut(seq).push(Task {
            id: id.clone(),
            text: text.to_string(),
            priority,
            due_date,
        });
        self.sort(seq);
        Ok(id)
    }

    /// Move a record between sequences; the only way completion state
    /// changes. The record is removed from its current sequence and inserted
    /// into the other, never flagged in place. Returns false when the id is
    /// absent or already on the requested side.
    pub fn set_completed(&mut self, id: &TaskId, completed: bool) -> bool {
        let (from, to) = if completed {
            (Sequence::Pending, Sequence::Completed)
        } else {
            (Sequence::Completed, Sequence::Pending)
        };
        let Some(pos) = self.position(from, id) else {
            return false;
        };
        let task = self.sequence_mut(from).remove(pos);
        self.sequence_mut(to).push(task);
        self.sort(to);
        true
    }

    /// Delete a record from whichever sequence holds it. Idempotent: a
    /// second call with the same id is a no-op returning false.
    pub fn remove(&mut self, id: &TaskId) -> bool {
        let Some((seq, pos)) = self.locate(id) else {
            return false;
        };
        self.sequence_mut(seq).remove(pos);
        true
    }

    /// In-place text edit. No membership change and no re-sort; text is not
    /// a sort key.
    pub fn edit_text(&mut self, id: &TaskId, new_text: &str) -> Result<bool> {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return Err(PrioError::EmptyText);
        }
        let Some((seq, pos)) = self.locate(id) else {
            return Ok(false);
        };
        self.sequence_mut(seq)[pos].text = new_text.to_string();
        Ok(true)
    }

    /// In-place due date edit; the affected sequence is re-sorted since the
    /// due date is a sort key.
    pub fn edit_due_date(&mut self, id: &TaskId, due_date: Option<NaiveDate>) -> bool {
        let Some((seq, pos)) = self.locate(id) else {
            return false;
        };
        self.sequence_mut(seq)[pos].due_date = due_date;
        self.sort(seq);
        true
    }

    /// Move a record to the slot immediately preceding `before` in `target`,
    /// appending when `before` is absent. A cross-sequence move doubles as
    /// the completed/pending transition. Both touched sequences are
    /// re-sorted immediately, so manual placement only survives against
    /// records that compare equal; a drop that fights the comparator snaps
    /// back. This mirrors the drop behavior of the original UI and is
    /// intentional (see DESIGN.md).
    pub fn reorder(&mut self, id: &TaskId, before: Option<&TaskId>, target: Sequence) -> bool {
        let Some((source, pos)) = self.locate(id) else {
            return false;
        };
        let task = self.sequence_mut(source).remove(pos);
        let dest = self.sequence_mut(target);
        let insert_at = before
            .and_then(|b| dest.iter().position(|t| &t.id == b))
            .unwrap_or(dest.len());
        dest.insert(insert_at, task);
        self.sort(source);
        self.sort(target);
        true
    }

    /// Empty the completed sequence unconditionally; any confirmation prompt
    /// belongs to the view layer. Returns the number of records dropped.
    pub fn clear_completed(&mut self) -> usize {
        let n = self.completed.len();
        self.completed.clear();
        n
    }

    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        let (seq, pos) = self.locate(id)?;
        Some(&self.sequence(seq)[pos])
    }

    pub fn locate(&self, id: &TaskId) -> Option<(Sequence, usize)> {
        for seq in [Sequence::Pending, Sequence::Completed] {
            if let Some(pos) = self.position(seq, id) {
                return Some((seq, pos));
            }
        }
        None
    }

    fn position(&self, seq: Sequence, id: &TaskId) -> Option<usize> {
        self.sequence(seq).iter().position(|t| &t.id == id)
    }

    fn sequence_mut(&mut self, seq: Sequence) -> &mut Vec<Task> {
        match seq {
            Sequence::Pending => &mut self.pending,
            Sequence::Completed => &mut self.completed,
        }
    }

    fn sort(&mut self, seq: Sequence) {
        self.sequence_mut(seq).sort_by(task_order);
    }
}
