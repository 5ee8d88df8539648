use std::path::Path;

use chrono::NaiveDate;

use crate::error::Result;
use crate::model::Sequence;
use crate::output::{self, Format};
use crate::session::Session;

#[allow(clippy::too_many_arguments)]
pub fn run(
    dir_root: &Path,
    position: usize,
    seq: Sequence,
    text: Option<String>,
    due: Option<NaiveDate>,
    clear_due: bool,
    format: Format,
) -> Result<()> {
    let mut session = Session::open(dir_root)?;
    let id = session.resolve(seq, position)?;

    if let Some(text) = text {
        session.edit_text(&id, &text)?;
    }
    if clear_due {
        session.edit_due_date(&id, None);
    } else if due.is_some() {
        session.edit_due_date(&id, due);
    }
    session.flush();

    if let Some((seq, idx)) = session.locate(&id) {
        output::print_task(&session.sequence(seq)[idx], idx + 1, format)?;
    }
    Ok(())
}
