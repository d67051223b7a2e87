pub mod annotated;
pub mod classify;
pub mod cluster;
pub mod config;
pub mod corpus;
mod error;
pub mod partition;
pub mod report;
pub mod tally;
pub mod tracer;
pub mod worker;

pub use error::{Error, Result};
