use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Column positions of the two fields the tally needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Columns {
    pub category: usize,
    pub text: usize,
}

impl Columns {
    /// Fewest fields a line must have to be considered at all.
    pub fn min_fields(&self) -> usize {
        self.category + 1
    }
}

impl Default for Columns {
    /// `artist,song,link,text`
    fn default() -> Self {
        Self {
            category: 0,
            text: 3,
        }
    }
}

/// How the category and text columns are located in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnLayout {
    Fixed(Columns),
    /// Looked up once in the header, ignoring ASCII case.
    Named { category: String, text: String },
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout::Fixed(Columns::default())
    }
}

impl ColumnLayout {
    pub fn named(category: impl Into<String>, text: impl Into<String>) -> Self {
        ColumnLayout::Named {
            category: category.into(),
            text: text.into(),
        }
    }

    pub fn resolve(&self, header: &[String]) -> Result<Columns> {
        match self {
            ColumnLayout::Fixed(columns) => Ok(*columns),
            ColumnLayout::Named { category, text } => Ok(Columns {
                category: find_column(header, category)?,
                text: find_column(header, text)?,
            }),
        }
    }
}

fn find_column(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|field| field.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::MissingColumn(name.to_string()))
}

/// One corpus line reduced to the fields the tally reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub category: String,
    pub text: String,
}

/// Why a line contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    UnterminatedQuote,
    TooFewFields,
    EmptyCategory,
}

/// Split one line into its fields. Quoted fields may contain delimiters and
/// `""` escapes; a `"` inside an unquoted field is an ordinary character.
pub fn split_fields(line: &[u8]) -> core::result::Result<Vec<String>, Malformed> {
    // the csv reader would run an open quote to the end of input instead of
    // rejecting the line
    if has_open_quote(line) {
        return Err(Malformed::UnterminatedQuote);
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line);
    let mut record = csv::ByteRecord::new();
    match reader.read_byte_record(&mut record) {
        Ok(true) => Ok(record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect()),
        Ok(false) => Ok(Vec::new()),
        Err(_) => Err(Malformed::UnterminatedQuote),
    }
}

/// True when a field that starts with `"` is still open at the end of `line`.
fn has_open_quote(line: &[u8]) -> bool {
    let mut bytes = line.iter().copied().peekable();
    let mut field_start = true;
    let mut quoted = false;
    while let Some(b) = bytes.next() {
        if quoted {
            if b == b'"' {
                if bytes.peek() == Some(&b'"') {
                    bytes.next();
                } else {
                    quoted = false;
                }
            }
            continue;
        }
        match b {
            b'"' if field_start => quoted = true,
            b',' => {
                field_start = true;
                continue;
            }
            _ => {}
        }
        field_start = false;
    }
    quoted
}

/// Parse a line into a [`Record`]. A missing text column yields an empty text.
pub fn parse_record(line: &[u8], columns: &Columns) -> core::result::Result<Record, Malformed> {
    let mut fields = split_fields(line)?;
    if fields.len() < columns.min_fields() {
        return Err(Malformed::TooFewFields);
    }
    let text = if columns.text < fields.len() {
        std::mem::take(&mut fields[columns.text])
    } else {
        String::new()
    };
    let category = std::mem::take(&mut fields[columns.category]);
    if category.is_empty() {
        return Err(Malformed::EmptyCategory);
    }
    Ok(Record { category, text })
}
