use crate::corpus::Columns;
use crate::partition::ByteRange;
use crate::worker::PartialTally;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(
    derive_more::Display,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[display("worker {_0}")]
pub struct WorkerId(pub usize);

impl WorkerId {
    /// The coordinator also scans a range, always the first one.
    pub const COORDINATOR: WorkerId = WorkerId(0);
}

/// One range of work, self-contained: a worker needs nothing else to run it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub worker: WorkerId,
    pub columns: Columns,
    pub range: ByteRange,
    pub chunk: Bytes,
    pub classify: bool,
    /// Return every counted record with its label, for the annotated output.
    pub keep_rows: bool,
}

/// Everything exchanged between the coordinator and a worker.
///
/// The coordinator sends `Assign` once and `Abort` when the run fails; a
/// worker answers with exactly one `Partial` or `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Assign(Assignment),
    Partial { worker: WorkerId, tally: PartialTally },
    Failed { worker: WorkerId, reason: String },
    Abort,
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Assign(_) => "assign",
            Message::Partial { .. } => "partial",
            Message::Failed { .. } => "failed",
            Message::Abort => "abort",
        }
    }
}
