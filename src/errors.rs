use std::{io, result};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("parse error at line {line} ({reason})")]
    Parse { line: usize, reason: String },
    #[error("duplicate {kind} id {id:?}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("unknown {kind} id {id:?} referenced by {context}")]
    UnknownId {
        kind: &'static str,
        id: String,
        context: String,
    },
    #[error("instance declared {declared} {kind} but the {kind} section has {actual}")]
    SectionCountMismatch {
        kind: &'static str,
        declared: usize,
        actual: usize,
    },
    #[error("missing header field {field:?}")]
    MissingHeaderField { field: &'static str },
}

pub type Result<T> = result::Result<T, Box<Error>>;

impl Error {
    pub fn parse(line: usize, reason: impl Into<String>) -> Box<Error> {
        Box::new(Error::Parse {
            line,
            reason: reason.into(),
        })
    }
}
