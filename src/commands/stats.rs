use std::path::Path;

use crate::error::Result;
use crate::output::{self, Format};
use crate::session::Session;

pub fn run(dir_root: &Path, format: Format) -> Result<()> {
    let session = Session::open(dir_root)?;
    output::print_counter(session.counter(), format)
}
