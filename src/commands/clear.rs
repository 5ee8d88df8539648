use std::path::Path;

use crate::error::Result;
use crate::output::Format;
use crate::session::Session;

pub fn run(dir_root: &Path, format: Format) -> Result<()> {
    let mut session = Session::open(dir_root)?;
    let cleared = session.clear_completed();
    session.flush();

    match format {
        Format::Json => println!("{}", serde_json::json!({ "cleared": cleared })),
        _ => println!("cleared {cleared} completed task(s)"),
    }
    Ok(())
}
