use std::path::Path;

use crate::error::Result;
use crate::model::Sequence;
use crate::output::Format;
use crate::session::Session;

pub fn run(dir_root: &Path, position: usize, seq: Sequence, format: Format) -> Result<()> {
    let mut session = Session::open(dir_root)?;
    let id = session.resolve(seq, position)?;
    let text = session.find(&id).map(|t| t.text.clone()).unwrap_or_default();
    session.remove(&id);
    session.flush();

    match format {
        Format::Json => println!("{}", serde_json::json!({ "removed": text })),
        _ => println!("removed: {text}"),
    }
    Ok(())
}
