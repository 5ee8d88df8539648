use std::path::Path;

use chrono::NaiveDate;

use crate::error::Result;
use crate::model::Priority;
use crate::output::{self, Format};
use crate::session::Session;

pub fn run(
    dir_root: &Path,
    text: String,
    priority: Priority,
    due: Option<NaiveDate>,
    format: Format,
) -> Result<()> {
    let mut session = Session::open(dir_root)?;
    let id = session.add(&text, priority, due)?;
    session.flush();

    if let Some((seq, idx)) = session.locate(&id) {
        output::print_task(&session.sequence(seq)[idx], idx + 1, format)?;
    }
    Ok(())
}
