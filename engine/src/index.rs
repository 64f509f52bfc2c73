use crate::error::{EngineError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    pub external_id: String,
    /// Highest raw count of any single term; 1 for a document without tokens.
    pub max_tf: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Term counts of a single document, in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocTermCounts {
    pub counts: Vec<(String, u32)>,
    pub max_tf: u32,
}

pub fn count_terms<S: AsRef<str>>(tokens: &[S]) -> DocTermCounts {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, u32)> = Vec::new();
    let mut max_tf = 0;
    for token in tokens {
        let token = token.as_ref();
        let slot = *slots.entry(token).or_insert_with(|| {
            counts.push((token.to_string(), 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
        max_tf = max_tf.max(counts[slot].1);
    }
    DocTermCounts { counts, max_tf: max_tf.max(1) }
}

/// Frozen inverted index. Only [`IndexBuilder`] (or a snapshot load) creates one.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub(crate) dictionary: HashMap<String, TermId>,
    pub(crate) terms: Vec<String>,
    pub(crate) postings: Vec<Vec<Posting>>, // by term id, each sorted by doc_id
    pub(crate) docs: Vec<DocMeta>,
}

impl InvertedIndex {
    pub fn num_docs(&self) -> usize { self.docs.len() }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    pub fn term(&self, term_id: TermId) -> &str { &self.terms[term_id as usize] }

    pub fn postings(&self, term_id: TermId) -> &[Posting] { &self.postings[term_id as usize] }

    pub fn postings_for(&self, term: &str) -> Option<&[Posting]> {
        self.term_id(term).map(|tid| self.postings(tid))
    }

    pub fn doc(&self, doc_id: DocId) -> &DocMeta { &self.docs[doc_id as usize] }

    pub fn docs(&self) -> &[DocMeta] { &self.docs }

    /// (term id, postings) in term id order, i.e. first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &[Posting])> + '_ {
        self.postings.iter().enumerate().map(|(tid, p)| (tid as TermId, p.as_slice()))
    }

    /// Vocabulary in first-seen order.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.iter().map(String::as_str)
    }
}

/// Owns the index exclusively while documents are being added; [`finish`]
/// hands out the read-only [`InvertedIndex`].
///
/// [`finish`]: IndexBuilder::finish
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: InvertedIndex,
    seen: HashSet<String>,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn add_document<S: AsRef<str>>(&mut self, external_id: &str, tokens: &[S]) -> Result<DocId> {
        self.add_counts(external_id, count_terms(tokens))
    }

    /// Merge one document's local counts. Ids must be non-blank and unique.
    pub fn add_counts(&mut self, external_id: &str, counts: DocTermCounts) -> Result<DocId> {
        if external_id.trim().is_empty() {
            return Err(EngineError::MissingDocId);
        }
        if !self.seen.insert(external_id.to_string()) {
            return Err(EngineError::DuplicateDocId(external_id.to_string()));
        }
        let idx = &mut self.index;
        let doc_id = idx.docs.len() as DocId;
        idx.docs.push(DocMeta { external_id: external_id.to_string(), max_tf: counts.max_tf.max(1) });

        for (term, tf) in counts.counts {
            let tid = match idx.dictionary.get(&term) {
                Some(&tid) => tid,
                None => {
                    let tid = idx.terms.len() as TermId;
                    idx.dictionary.insert(term.clone(), tid);
                    idx.terms.push(term);
                    idx.postings.push(Vec::new());
                    tid
                }
            };
            idx.postings[tid as usize].push(Posting { doc_id, tf });
        }
        Ok(doc_id)
    }

    pub fn num_docs(&self) -> usize { self.index.docs.len() }

    pub fn finish(self) -> InvertedIndex { self.index }
}

/// Build an index from (id, tokens) pairs, counting terms in parallel and
/// merging in input order so the result does not depend on scheduling.
/// Documents with a blank or repeated id are skipped with a warning.
pub fn build_index<S>(documents: &[(String, Vec<S>)], parallel: bool) -> InvertedIndex
where
    S: AsRef<str> + Sync,
{
    let counts: Vec<DocTermCounts> = if parallel {
        documents.par_iter().map(|(_, tokens)| count_terms(tokens)).collect()
    } else {
        documents.iter().map(|(_, tokens)| count_terms(tokens)).collect()
    };

    let mut builder = IndexBuilder::new();
    for ((external_id, _), local) in documents.iter().zip(counts) {
        if let Err(err) = builder.add_counts(external_id, local) {
            tracing::warn!(doc = %external_id, %err, "skipping document");
        }
    }
    let index = builder.finish();
    tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "built inverted index");
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> { s.split_whitespace().map(str::to_string).collect() }

    #[test]
    fn counts_accumulate_per_document() {
        let c = count_terms(&toks("rust go rust rust go c"));
        assert_eq!(c.counts, vec![("rust".into(), 3), ("go".into(), 2), ("c".into(), 1)]);
        assert_eq!(c.max_tf, 3);
    }

    #[test]
    fn empty_document_has_unit_max_tf_and_no_postings() {
        let mut b = IndexBuilder::new();
        let empty: Vec<String> = Vec::new();
        let d = b.add_document("empty", &empty).unwrap();
        let idx = b.finish();
        assert_eq!(idx.doc(d).max_tf, 1);
        assert_eq!(idx.num_terms(), 0);
        assert_eq!(idx.num_docs(), 1);
    }

    #[test]
    fn one_posting_per_document_and_term() {
        let mut b = IndexBuilder::new();
        b.add_document("a", &toks("x x y")).unwrap();
        b.add_document("b", &toks("x")).unwrap();
        let idx = b.finish();
        assert_eq!(idx.postings_for("x").unwrap(), &[Posting { doc_id: 0, tf: 2 }, Posting { doc_id: 1, tf: 1 }]);
        assert_eq!(idx.postings_for("y").unwrap(), &[Posting { doc_id: 0, tf: 1 }]);
        assert!(idx.postings_for("z").is_none());
    }

    #[test]
    fn rejects_blank_and_duplicate_ids() {
        let mut b = IndexBuilder::new();
        assert!(matches!(b.add_document("  ", &toks("x")), Err(EngineError::MissingDocId)));
        b.add_document("a", &toks("x")).unwrap();
        assert!(matches!(b.add_document("a", &toks("y")), Err(EngineError::DuplicateDocId(_))));
        let idx = b.finish();
        assert_eq!(idx.num_docs(), 1);
        assert!(idx.postings_for("y").is_none());
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let docs: Vec<(String, Vec<String>)> = (0..200)
            .map(|i| (format!("d{i}"), toks(&format!("t{} t{} common t{}", i % 7, i % 11, i % 7))))
            .collect();
        let a = build_index(&docs, true);
        let b = build_index(&docs, false);
        assert_eq!(a.terms, b.terms);
        assert_eq!(a.postings, b.postings);
        assert_eq!(a.docs, b.docs);
    }
}
