//! Error types for the retrieval engine.
//!
//! Only a handful of conditions are fatal for a batch run: an empty corpus,
//! an empty query set and I/O failures on the files the run writes. Everything
//! else (missing optional files, malformed records) is logged and skipped by the
//! readers themselves and never surfaces here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("index snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    /// Nothing could be indexed: the corpus file is missing or every record was skipped.
    #[error("no documents indexed from corpus {}; check the path and that records carry an `_id`", .path.display())]
    EmptyCorpus { path: PathBuf },

    /// Nothing to score: the queries file is missing or no query survived filtering.
    #[error("no queries loaded from {}; check the path and the query subset option", .path.display())]
    NoQueries { path: PathBuf },

    #[error("document has no id")]
    MissingDocId,

    #[error("duplicate document id: {0}")]
    DuplicateDocId(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
