mod record;

pub use record::{ColumnLayout, Columns, Malformed, Record, parse_record, split_fields};

use crate::partition::ByteRange;
use crate::{Error, Result};
use bytes::Bytes;
use std::path::Path;
use tracing::info;

/// The whole input held in one shared, read-only buffer.
#[derive(Debug, Clone)]
pub struct Corpus {
    buffer: Bytes,
    data_start: usize,
    header: Vec<String>,
}

impl Corpus {
    pub async fn open(path: &Path) -> Result<Corpus> {
        let content = tokio::fs::read(path).await.map_err(|source| Error::Input {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            mib = format!("{:.2}", content.len() as f64 / (1024.0 * 1024.0)),
            "loaded corpus"
        );
        Ok(Corpus::from_bytes(content))
    }

    /// The first line is the header; everything after it is record data.
    /// Input without any line terminator is a header with no records.
    pub fn from_bytes(content: impl Into<Bytes>) -> Corpus {
        let buffer = content.into();
        let data_start = buffer
            .iter()
            .position(|&b| b == b'\n')
            .map_or(buffer.len(), |newline| newline + 1);
        let header_line = trim_line_end(&buffer[..data_start]);
        let header = split_fields(header_line).unwrap_or_default();
        Corpus {
            buffer,
            data_start,
            header,
        }
    }

    pub fn buffer(&self) -> &Bytes {
        &self.buffer
    }

    pub fn data_start(&self) -> usize {
        self.data_start
    }

    pub fn data_len(&self) -> usize {
        self.buffer.len() - self.data_start
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn columns(&self, layout: &ColumnLayout) -> Result<Columns> {
        layout.resolve(&self.header)
    }

    /// Zero-copy view of one range.
    pub fn slice(&self, range: &ByteRange) -> Bytes {
        self.buffer.slice(range.as_range())
    }
}

/// Strip a trailing `\n` and then a trailing `\r`.
pub(crate) fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
