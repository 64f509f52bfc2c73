use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which query fields form the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Title only, falling back to the text when the title is blank.
    Title,
    TitleText,
}

/// Which queries are scored. `Odd` keeps only odd numeric ids, the test
/// split convention of the SciFact collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySubset {
    All,
    Odd,
}

impl QuerySubset {
    pub fn accepts(self, qid: u64) -> bool {
        match self {
            QuerySubset::All => true,
            QuerySubset::Odd => qid % 2 == 1,
        }
    }
}

/// How MAP treats a judged query that has no relevant document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroRelevantPolicy {
    /// AP = 0 and the query counts towards the mean.
    CountAsZero,
    /// The query is left out of the mean.
    Exclude,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub corpus: PathBuf,
    /// Load a snapshot written by `persist::save_snapshot` instead of indexing `corpus`.
    pub index_dir: Option<PathBuf>,
    pub queries: PathBuf,
    pub stopwords: PathBuf,
    pub qrels: Option<PathBuf>,
    pub query_mode: QueryMode,
    pub query_subset: QuerySubset,
    pub output: PathBuf,
    pub run_name: String,
    pub top_k: usize,
    pub min_token_len: usize,
    pub zero_relevant: ZeroRelevantPolicy,
    /// Where to write the first vocabulary terms, if anywhere.
    pub vocab_sample: Option<PathBuf>,
    pub parallel: bool,
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(EngineError::InvalidConfig("top_k must be at least 1".into()));
        }
        if self.run_name.trim().is_empty() || self.run_name.chars().any(char::is_whitespace) {
            return Err(EngineError::InvalidConfig(format!(
                "run name {:?} must be a single non-empty word",
                self.run_name
            )));
        }
        Ok(())
    }
}
