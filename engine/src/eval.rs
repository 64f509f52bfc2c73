//! Relevance judgments, average precision and MAP.

use crate::config::ZeroRelevantPolicy;
use crate::error::Result;
use crate::rank::{QueryId, RankedDoc, Rankings};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Query id to the set of documents judged relevant (score > 0). A query whose
/// rows all carry score <= 0 is kept with an empty set.
#[derive(Debug, Clone, Default)]
pub struct Qrels {
    relevant: HashMap<QueryId, HashSet<String>>,
}

impl Qrels {
    /// Accepts `qid docid score` or `qid <ignored> docid score ...` rows
    /// separated by any whitespace. A leading `query-id` header is skipped, as
    /// is any row with a non-numeric query id or score.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut relevant: HashMap<QueryId, HashSet<String>> = HashMap::new();
        let mut skipped = 0usize;
        for line in reader.lines() {
            let line = line?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() || parts[0] == "query-id" {
                continue;
            }
            let (qid, did, score) = match parts.len() {
                3 => (parts[0], parts[1], parts[2]),
                n if n >= 4 => (parts[0], parts[2], parts[3]),
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let (Ok(qid), Ok(score)) = (qid.parse::<QueryId>(), score.parse::<f64>()) else {
                skipped += 1;
                continue;
            };
            let docs = relevant.entry(qid).or_default();
            if score > 0.0 {
                docs.insert(did.to_string());
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "skipped malformed judgment rows");
        }
        Ok(Self { relevant })
    }

    /// `Ok(None)` when the file cannot be opened: evaluation is then unavailable.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "judgments file not readable, MAP unavailable");
                return Ok(None);
            }
        };
        let qrels = Self::parse(BufReader::new(file))?;
        tracing::info!(queries = qrels.len(), "loaded relevance judgments");
        Ok(Some(qrels))
    }

    pub fn relevant(&self, qid: QueryId) -> Option<&HashSet<String>> { self.relevant.get(&qid) }

    pub fn len(&self) -> usize { self.relevant.len() }

    pub fn is_empty(&self) -> bool { self.relevant.is_empty() }
}

impl FromIterator<(QueryId, String)> for Qrels {
    fn from_iter<I: IntoIterator<Item = (QueryId, String)>>(iter: I) -> Self {
        let mut relevant: HashMap<QueryId, HashSet<String>> = HashMap::new();
        for (qid, doc) in iter {
            relevant.entry(qid).or_default().insert(doc);
        }
        Self { relevant }
    }
}

/// Mean of precision@rank over every rank holding a relevant document,
/// divided by the number of relevant documents. 0 when `relevant` is empty.
pub fn average_precision(ranked: &[RankedDoc], relevant: &HashSet<String>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, doc) in ranked.iter().enumerate() {
        if relevant.contains(&doc.doc_id) {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    sum / relevant.len() as f64
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub per_query: BTreeMap<QueryId, f64>,
    /// 0 when no ranked query has judgments.
    pub map: f64,
}

impl Evaluation {
    pub fn evaluated(&self) -> usize { self.per_query.len() }
}

/// MAP over queries with at least one ranked document and a judgment row.
/// A query that retrieved nothing writes no run-file line, so it is left out
/// here as well; evaluating in memory and from the written file agree.
/// Judged queries with no relevant document follow `policy`.
pub fn evaluate(rankings: &Rankings, qrels: &Qrels, policy: ZeroRelevantPolicy) -> Evaluation {
    let mut per_query = BTreeMap::new();
    for (qid, ranked) in rankings {
        if ranked.is_empty() {
            continue;
        }
        let Some(relevant) = qrels.relevant(*qid) else { continue };
        if relevant.is_empty() && policy == ZeroRelevantPolicy::Exclude {
            continue;
        }
        let ap = average_precision(ranked, relevant);
        tracing::debug!(qid, ap, relevant = relevant.len(), "average precision");
        per_query.insert(*qid, ap);
    }
    let map = if per_query.is_empty() { 0.0 } else { per_query.values().sum::<f64>() / per_query.len() as f64 };
    Evaluation { per_query, map }
}
