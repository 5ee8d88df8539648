use std::path::Path;

use crate::error::Result;
use crate::model::Sequence;
use crate::output::{self, Format};
use crate::session::Session;

/// Mark the task at `position` in the pending list as completed.
pub fn complete(dir_root: &Path, position: usize, format: Format) -> Result<()> {
    transition(dir_root, position, Sequence::Pending, format)
}

/// Move the task at `position` in the completed list back to pending.
pub fn restore(dir_root: &Path, position: usize, format: Format) -> Result<()> {
    transition(dir_root, position, Sequence::Completed, format)
}

fn transition(dir_root: &Path, position: usize, from: Sequence, format: Format) -> Result<()> {
    let mut session = Session::open(dir_root)?;
    let id = session.resolve(from, position)?;
    match from {
        Sequence::Pending => session.complete(&id),
        Sequence::Completed => session.restore(&id),
    };
    session.flush();

    if let Some((seq, idx)) = session.locate(&id) {
        output::print_task(&session.sequence(seq)[idx], idx + 1, format)?;
    }
    Ok(())
}
