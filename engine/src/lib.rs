//! Vector-space retrieval: inverted index, max-tf normalized tf-idf weights,
//! cosine ranking restricted to shared terms, TREC-style run files and MAP.

pub mod config;
pub mod corpus;
pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod pipeline;
pub mod rank;
pub mod scorer;
pub mod tokenizer;
pub mod weights;

pub use config::{QueryMode, QuerySubset, RunConfig, ZeroRelevantPolicy};
pub use error::{EngineError, Result};
pub use index::{DocId, DocMeta, IndexBuilder, InvertedIndex, Posting, TermId};
pub use rank::{QueryId, RankedDoc, Rankings};
pub use scorer::{ScoreMap, VectorModel};
