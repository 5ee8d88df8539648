use std::path::Path;

use crate::error::Result;
use crate::output::Format;
use crate::store::slot::SlotStore;

pub fn run(dir_root: &Path, format: Format) -> Result<()> {
    let store = SlotStore::init(dir_root)?;
    match format {
        Format::Json => println!(
            "{}",
            serde_json::json!({ "initialized": store.root().display().to_string() })
        ),
        _ => println!("initialized {}", store.root().display()),
    }
    Ok(())
}
