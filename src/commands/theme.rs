use std::path::Path;

use crate::error::Result;
use crate::output::Format;
use crate::store::slot::{SlotStore, Theme};

/// Read or set the color theme slot. The theme belongs to the view layer;
/// it never touches the task session.
pub fn run(dir_root: &Path, set: Option<Theme>, format: Format) -> Result<()> {
    let slot = SlotStore::open(dir_root)?;
    let theme = match set {
        Some(theme) => {
            slot.set_theme(theme)?;
            theme
        }
        None => slot.theme(),
    };
    match format {
        Format::Json => println!("{}", serde_json::json!({ "theme": theme.to_string() })),
        _ => println!("{theme}"),
    }
    Ok(())
}
