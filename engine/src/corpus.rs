//! JSON-lines readers for the corpus and the query set.
//!
//! A missing file yields an empty collection and a warning; whether that is
//! fatal is decided by the pipeline. Lines that are not valid JSON objects, or
//! that carry no usable id, are skipped.

use crate::config::{QueryMode, QuerySubset};
use crate::error::Result;
use crate::rank::QueryId;
use crate::tokenizer::Tokenizer;
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Text(s) => f.write_str(s.trim()),
            RawId::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputRecord {
    #[serde(rename = "_id")]
    underscore_id: Option<RawId>,
    doc_id: Option<RawId>,
    query_id: Option<RawId>,
    id: Option<RawId>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

impl InputRecord {
    fn title(&self) -> &str { self.title.as_deref().unwrap_or("").trim() }

    fn text(&self) -> &str { self.text.as_deref().unwrap_or("").trim() }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorpusDoc {
    pub id: String,
    pub title: String,
    pub text: String,
}

impl CorpusDoc {
    pub fn full_text(&self) -> String { format!("{} {}", self.title, self.text) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub id: QueryId,
    pub tokens: Vec<String>,
}

/// Every line parsed as a JSON object; blank lines are ignored and bad ones counted.
fn read_records<R: BufRead>(reader: R, kind: &str) -> Result<Vec<InputRecord>> {
    let mut records = Vec::new();
    let mut malformed = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<InputRecord>(&line) {
            Ok(rec) => records.push(rec),
            Err(err) => {
                malformed += 1;
                tracing::warn!(kind, line = lineno + 1, %err, "skipping malformed record");
            }
        }
    }
    if malformed > 0 {
        tracing::warn!(kind, malformed, "malformed records skipped");
    }
    Ok(records)
}

fn open(path: &Path, kind: &str) -> Option<BufReader<File>> {
    match File::open(path) {
        Ok(f) => Some(BufReader::new(f)),
        Err(err) => {
            tracing::warn!(kind, path = %path.display(), %err, "file not readable, continuing with no records");
            None
        }
    }
}

pub fn parse_corpus<R: BufRead>(reader: R) -> Result<Vec<CorpusDoc>> {
    let mut docs = Vec::new();
    for rec in read_records(reader, "corpus")? {
        let id = rec.underscore_id.as_ref().or(rec.doc_id.as_ref()).or(rec.id.as_ref()).map(|id| id.to_string());
        match id {
            // the run file is whitespace-delimited, so ids must be a single field
            Some(id) if id.chars().any(char::is_whitespace) => {
                tracing::warn!(id = %id, "skipping corpus record whose id contains whitespace")
            }
            Some(id) if !id.is_empty() => docs.push(CorpusDoc { title: rec.title().to_string(), text: rec.text().to_string(), id }),
            _ => tracing::warn!(title = rec.title(), "skipping corpus record without an id"),
        }
    }
    Ok(docs)
}

pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusDoc>> {
    let path = path.as_ref();
    let docs = match open(path, "corpus") {
        Some(reader) => parse_corpus(reader)?,
        None => Vec::new(),
    };
    tracing::info!(num_docs = docs.len(), path = %path.display(), "read corpus");
    Ok(docs)
}

/// Title and text are tokenized together.
pub fn tokenize_corpus(docs: &[CorpusDoc], tokenizer: &Tokenizer, parallel: bool) -> Vec<(String, Vec<String>)> {
    let tokenize = |d: &CorpusDoc| (d.id.clone(), tokenizer.tokenize(&d.full_text()));
    if parallel {
        docs.par_iter().map(tokenize).collect()
    } else {
        docs.iter().map(tokenize).collect()
    }
}

/// Queries that pass `subset`, tokenized per `mode`, in ascending id order.
/// Ids that are not non-negative integers are skipped, and a repeated id keeps
/// its first record.
pub fn parse_queries<R: BufRead>(reader: R, tokenizer: &Tokenizer, mode: QueryMode, subset: QuerySubset) -> Result<Vec<Query>> {
    let mut queries = Vec::new();
    let mut seen: HashSet<QueryId> = HashSet::new();
    for rec in read_records(reader, "queries")? {
        let Some(raw) = rec.underscore_id.as_ref().or(rec.id.as_ref()).or(rec.query_id.as_ref()) else {
            tracing::warn!("skipping query without an id");
            continue;
        };
        let Ok(id) = raw.to_string().parse::<QueryId>() else {
            tracing::warn!(id = %raw, "skipping query whose id is not a non-negative integer");
            continue;
        };
        if !subset.accepts(id) {
            continue;
        }
        if !seen.insert(id) {
            tracing::warn!(id, "skipping duplicate query id");
            continue;
        }
        let text = match mode {
            QueryMode::Title if !rec.title().is_empty() => rec.title().to_string(),
            QueryMode::Title => rec.text().to_string(),
            QueryMode::TitleText => format!("{} {}", rec.title(), rec.text()).trim().to_string(),
        };
        queries.push(Query { id, tokens: tokenizer.tokenize(&text) });
    }
    queries.sort_by_key(|q| q.id);
    Ok(queries)
}

pub fn read_queries<P: AsRef<Path>>(path: P, tokenizer: &Tokenizer, mode: QueryMode, subset: QuerySubset) -> Result<Vec<Query>> {
    let path = path.as_ref();
    let queries = match open(path, "queries") {
        Some(reader) => parse_queries(reader, tokenizer, mode, subset)?,
        None => Vec::new(),
    };
    tracing::info!(num_queries = queries.len(), ?subset, ?mode, "read queries");
    Ok(queries)
}
