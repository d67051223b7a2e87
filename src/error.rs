use crate::cluster::WorkerId;
use std::path::PathBuf;
use std::time::Duration;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    General(String),
    Io(std::io::Error),
    Input { path: PathBuf, source: std::io::Error },
    Output { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
    Serde(serde_json::Error),
    Encode(bincode::error::EncodeError),
    Decode(bincode::error::DecodeError),
    Http(reqwest::Error),
    Join(tokio::task::JoinError),
    MissingColumn(String),
    InvalidWorkerCount,
    RecordTooLong { offset: usize, limit: usize },
    InvalidPhase { from: &'static str, to: &'static str },
    WorkerFailed { worker: WorkerId, reason: String },
    WorkerTimeout { worker: WorkerId, waited: Duration },
    LinkClosed(WorkerId),
    UnexpectedMessage { worker: WorkerId, kind: &'static str },
}

impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Error::General(msg) => write!(fmt, "{msg}"),
            Error::Io(e) => write!(fmt, "io error: {e}"),
            Error::Input { path, source } => {
                write!(fmt, "cannot read input {}: {source}", path.display())
            }
            Error::Output { path, source } => {
                write!(fmt, "cannot write output {}: {source}", path.display())
            }
            Error::Csv(e) => write!(fmt, "csv error: {e}"),
            Error::Serde(e) => write!(fmt, "json error: {e}"),
            Error::Encode(e) => write!(fmt, "frame encode error: {e}"),
            Error::Decode(e) => write!(fmt, "frame decode error: {e}"),
            Error::Http(e) => write!(fmt, "http error: {e}"),
            Error::Join(e) => write!(fmt, "worker task failed: {e}"),
            Error::MissingColumn(name) => write!(fmt, "column '{name}' not found in header"),
            Error::InvalidWorkerCount => write!(fmt, "worker count must be greater than 0"),
            Error::RecordTooLong { offset, limit } => write!(
                fmt,
                "record starting near byte {offset} exceeds {limit} bytes without a line terminator"
            ),
            Error::InvalidPhase { from, to } => {
                write!(fmt, "coordinator cannot move from {from} to {to}")
            }
            Error::WorkerFailed { worker, reason } => write!(fmt, "{worker} failed: {reason}"),
            Error::WorkerTimeout { worker, waited } => {
                write!(fmt, "{worker} did not report within {}s", waited.as_secs())
            }
            Error::LinkClosed(worker) => write!(fmt, "link to {worker} closed unexpectedly"),
            Error::UnexpectedMessage { worker, kind } => {
                write!(fmt, "unexpected {kind} message from {worker}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

impl From<bincode::error::EncodeError> for Error {
    fn from(value: bincode::error::EncodeError) -> Self {
        Self::Encode(value)
    }
}

impl From<bincode::error::DecodeError> for Error {
    fn from(value: bincode::error::DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Join(value)
    }
}
