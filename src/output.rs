//! JSON output writer

use crate::error::{PricerError, Result};
use crate::types::PricedItem;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `items` as a JSON array to `path`, replacing any existing file
pub fn write_output(path: &Path, items: &[PricedItem]) -> Result<()> {
    let wrap = |e: &dyn std::fmt::Display| {
        PricerError::OutputWrite(format!("Failed to write {}: {}", path.display(), e))
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| wrap(&e))?;
        }
    }

    let file = File::create(path).map_err(|e| wrap(&e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, items).map_err(|e| wrap(&e))?;
    writer.write_all(b"\n").map_err(|e| wrap(&e))?;
    writer.flush().map_err(|e| wrap(&e))?;

    log::info!("Data saved to {}", path.display());
    Ok(())
}
