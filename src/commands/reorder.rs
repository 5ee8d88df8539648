use std::path::Path;

use crate::error::Result;
use crate::model::Sequence;
use crate::output::{self, Format};
use crate::session::Session;

/// The drag-and-drop gesture: move a task before a position in the target
/// list (appending when no anchor is given). The store re-sorts immediately
/// after the drop, so placement only sticks between tasks that compare
/// equal.
pub fn run(
    dir_root: &Path,
    position: usize,
    from: Sequence,
    to: Sequence,
    before: Option<usize>,
    format: Format,
) -> Result<()> {
    let mut session = Session::open(dir_root)?;
    let id = session.resolve(from, position)?;
    // Resolve the anchor before the move; ids are immune to the index
    // shuffling the move causes.
    let anchor = match before {
        Some(pos) => Some(session.resolve(to, pos)?),
        None => None,
    };
    session.reorder(&id, anchor.as_ref(), to);
    session.flush();

    if let Some((seq, idx)) = session.locate(&id) {
        output::print_task(&session.sequence(seq)[idx], idx + 1, format)?;
    }
    Ok(())
}
