use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::StoreError;
use crate::structs::{DataDocument, UrlEntry};

/// Reads the data file. A missing file is an empty document; anything that
/// fails to parse is returned as an error.
pub fn load_document(path: &Path) -> Result<DataDocument, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DataDocument::default()),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Overwrites the data file with `doc`, indented by four spaces.
pub fn write_document(path: &Path, doc: &DataDocument) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    doc.serialize(&mut ser)?;

    let mut file = File::create(path)?;
    file.write_all(&buf)?;
    Ok(())
}

/// Replaces only the `urls` array, keeping credentials and any other keys
/// currently on disk.
pub fn save_rows(path: &Path, rows: &[UrlEntry]) -> Result<(), StoreError> {
    let mut doc = load_document(path)?;
    doc.urls = rows.to_vec();
    write_document(path, &doc)?;
    log::info!("Saved {} row(s) to {}", rows.len(), path.display());
    Ok(())
}
