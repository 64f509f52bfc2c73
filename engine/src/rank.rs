//! Top-K selection and the run file format:
//!
//! ```text
//! <query-id> Q0 <document-id> <rank> <score:.6> <run-name>
//! ```

use crate::error::Result;
use crate::index::InvertedIndex;
use crate::scorer::ScoreMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub type QueryId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedDoc {
    pub doc_id: String,
    pub score: f64,
}

/// Per-query rankings, iterated in ascending query id.
pub type Rankings = BTreeMap<QueryId, Vec<RankedDoc>>;

/// Descending score; exact ties fall back to ascending document id.
fn by_score_then_id(a: &RankedDoc, b: &RankedDoc) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.doc_id.cmp(&b.doc_id))
}

pub fn top_k(scores: ScoreMap, index: &InvertedIndex, k: usize) -> Vec<RankedDoc> {
    let mut ranked: Vec<RankedDoc> = scores
        .into_iter()
        .map(|(doc_id, score)| RankedDoc { doc_id: index.doc(doc_id).external_id.clone(), score })
        .collect();
    if ranked.len() > k {
        ranked.select_nth_unstable_by(k, by_score_then_id);
        ranked.truncate(k);
    }
    ranked.sort_by(by_score_then_id);
    ranked
}

pub fn write_results<W: Write>(out: &mut W, rankings: &Rankings, run_name: &str) -> Result<()> {
    for (qid, ranked) in rankings {
        for (i, doc) in ranked.iter().enumerate() {
            writeln!(out, "{} Q0 {} {} {:.6} {}", qid, doc.doc_id, i + 1, doc.score, run_name)?;
        }
    }
    Ok(())
}

pub fn write_results_file<P: AsRef<Path>>(path: P, rankings: &Rankings, run_name: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    write_results(&mut out, rankings, run_name)?;
    out.flush()?;
    let lines: usize = rankings.values().map(Vec::len).sum();
    tracing::info!(path = %path.display(), queries = rankings.len(), lines, "wrote results");
    Ok(())
}

/// Parse a run file back into rankings ordered by rank. Lines that do not
/// have six fields with numeric query id, rank and score are skipped.
pub fn read_results<R: BufRead>(reader: R) -> Result<Rankings> {
    let mut by_query: BTreeMap<QueryId, Vec<(usize, RankedDoc)>> = BTreeMap::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_result_line(&line) {
            Some((qid, rank, doc)) => by_query.entry(qid).or_default().push((rank, doc)),
            None => tracing::warn!(line = lineno + 1, "skipping malformed result line"),
        }
    }
    Ok(by_query
        .into_iter()
        .map(|(qid, mut docs)| {
            docs.sort_by_key(|(rank, _)| *rank);
            (qid, docs.into_iter().map(|(_, d)| d).collect())
        })
        .collect())
}

pub fn read_results_file<P: AsRef<Path>>(path: P) -> Result<Rankings> {
    read_results(BufReader::new(File::open(path)?))
}

fn parse_result_line(line: &str) -> Option<(QueryId, usize, RankedDoc)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 6 {
        return None;
    }
    let qid = parts[0].parse().ok()?;
    let rank = parts[3].parse().ok()?;
    let score = parts[4].parse().ok()?;
    Some((qid, rank, RankedDoc { doc_id: parts[2].to_string(), score }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;

    fn index(ids: &[&str]) -> InvertedIndex {
        let mut b = IndexBuilder::new();
        for id in ids {
            b.add_document(id, &["term"][..]).unwrap();
        }
        b.finish()
    }

    #[test]
    fn ties_break_by_document_id() {
        let idx = index(&["c", "a", "b", "d"]);
        let scores: ScoreMap = [(0, 0.5), (1, 0.5), (2, 0.9), (3, 0.1)].into_iter().collect();
        let ranked = top_k(scores, &idx, 3);
        let ids: Vec<&str> = ranked.iter().map(|d| d.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn truncation_is_stable_across_runs() {
        let ids: Vec<String> = (0..50).map(|i| format!("doc{i:02}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let idx = index(&refs);
        let scores = || -> ScoreMap { (0..50).map(|d| (d, if d % 3 == 0 { 0.7 } else { 0.2 })).collect() };
        let first = top_k(scores(), &idx, 10);
        for _ in 0..5 {
            assert_eq!(top_k(scores(), &idx, 10), first);
        }
        assert_eq!(first[0].doc_id, "doc00");
        assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn writes_fixed_format() {
        let mut rankings = Rankings::new();
        rankings.insert(3, vec![RankedDoc { doc_id: "x".into(), score: 0.25 }]);
        rankings.insert(1, vec![
            RankedDoc { doc_id: "a".into(), score: 1.0 },
            RankedDoc { doc_id: "b".into(), score: 1.0 / 3.0 },
        ]);
        let mut out = Vec::new();
        write_results(&mut out, &rankings, "run").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1 Q0 a 1 1.000000 run\n1 Q0 b 2 0.333333 run\n3 Q0 x 1 0.250000 run\n"
        );
    }

    #[test]
    fn reads_back_in_rank_order_and_skips_garbage() {
        let text = "1 Q0 b 2 0.5 run\nnot a line\n1 Q0 a 1 0.9 run\n2 Q0 c x 0.1 run\n";
        let r = read_results(text.as_bytes()).unwrap();
        assert_eq!(r.len(), 1);
        let ids: Vec<&str> = r[&1].iter().map(|d| d.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
