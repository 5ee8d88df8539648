use std::path::Path;

use clap::ValueEnum;

use crate::error::Result;
use crate::output::{self, Format};
use crate::session::Session;

/// Which sequences the view shows; the counter always covers both.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Pending,
    Completed,
}

pub fn run(dir_root: &Path, filter: Filter, format: Format) -> Result<()> {
    let session = Session::open(dir_root)?;
    let pending = matches!(filter, Filter::All | Filter::Pending).then(|| session.pending());
    let completed = matches!(filter, Filter::All | Filter::Completed).then(|| session.completed());
    output::print_board(pending, completed, session.counter(), format)
}
