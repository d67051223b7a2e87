// The corpus written back out with one label per counted record.

use crate::worker::AnnotatedRow;
use crate::{Error, Result};
use std::path::Path;
use tracing::info;

pub const LABEL_COLUMN: &str = "sentiment";

/// Header plus [`LABEL_COLUMN`], then one line per row. Fields are quoted
/// only where they need it.
pub fn encode(header: &[String], rows: &[AnnotatedRow]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(header.iter().map(String::as_str).chain([LABEL_COLUMN]))?;
    for row in rows {
        writer.write_record(row.fields.iter().map(String::as_str).chain([row.label.as_str()]))?;
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

pub async fn write(path: &Path, header: &[String], rows: &[AnnotatedRow]) -> Result<()> {
    let content = encode(header, rows)?;
    tokio::fs::write(path, &content)
        .await
        .map_err(|source| Error::Output {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), rows = rows.len(), "wrote labelled corpus");
    Ok(())
}
