//! Cosine similarity between a query and the documents it shares terms with.
//!
//! The model is frozen after construction: the index, idf table and document
//! norms are only ever read, so a `&VectorModel` can be shared across threads
//! scoring different queries.

use crate::index::{DocId, InvertedIndex, TermId};
use crate::weights::{normalized_tf, DocNorms, TermWeights};
use std::collections::HashMap;

pub type ScoreMap = HashMap<DocId, f64>;

#[derive(Debug, Clone)]
pub struct VectorModel {
    index: InvertedIndex,
    weights: TermWeights,
    norms: DocNorms,
}

impl VectorModel {
    pub fn new(index: InvertedIndex) -> Self {
        let weights = TermWeights::compute(&index);
        let norms = DocNorms::compute(&index, &weights);
        tracing::info!(
            num_docs = index.num_docs(),
            num_terms = index.num_terms(),
            unscoreable = norms.unscoreable(),
            "computed term weights and document norms"
        );
        Self { index, weights, norms }
    }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn weights(&self) -> &TermWeights { &self.weights }

    pub fn norms(&self) -> &DocNorms { &self.norms }

    /// Query term weights: (c / max c) * idf over the tokens present in the index.
    /// Returns an empty vector when no token is indexed.
    pub fn query_weights<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<(TermId, f64)> {
        let mut counts: Vec<(TermId, u32)> = Vec::new();
        let mut slots: HashMap<TermId, usize> = HashMap::new();
        for token in tokens {
            let Some(tid) = self.index.term_id(token.as_ref()) else { continue };
            let slot = *slots.entry(tid).or_insert_with(|| {
                counts.push((tid, 0));
                counts.len() - 1
            });
            counts[slot].1 += 1;
        }
        let max_qtf = counts.iter().map(|(_, c)| *c).max().unwrap_or(0);
        if max_qtf == 0 {
            return Vec::new();
        }
        counts
            .into_iter()
            .map(|(tid, c)| (tid, normalized_tf(c, max_qtf) * self.weights.idf(tid)))
            .collect()
    }

    pub fn score<S: AsRef<str>>(&self, tokens: &[S]) -> ScoreMap {
        let q_weights = self.query_weights(tokens);
        let q_norm = q_weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if q_norm == 0.0 {
            return ScoreMap::new();
        }

        // Only documents reached through a shared term enter the accumulator.
        let mut dot: HashMap<DocId, f64> = HashMap::new();
        for (tid, q_w) in q_weights {
            if q_w == 0.0 {
                continue;
            }
            let idf = self.weights.idf(tid);
            for p in self.index.postings(tid) {
                let d_w = normalized_tf(p.tf, self.index.doc(p.doc_id).max_tf) * idf;
                *dot.entry(p.doc_id).or_insert(0.0) += d_w * q_w;
            }
        }

        let mut scores = ScoreMap::with_capacity(dot.len());
        for (doc_id, dp) in dot {
            let d_norm = self.norms.get(doc_id);
            if dp <= 0.0 || d_norm <= 0.0 {
                continue;
            }
            scores.insert(doc_id, dp / (d_norm * q_norm));
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;

    fn model(docs: &[(&str, &str)]) -> VectorModel {
        let mut b = IndexBuilder::new();
        for (id, text) in docs {
            let tokens: Vec<&str> = text.split_whitespace().collect();
            b.add_document(id, &tokens).unwrap();
        }
        VectorModel::new(b.finish())
    }

    fn score(m: &VectorModel, q: &str) -> HashMap<String, f64> {
        let tokens: Vec<&str> = q.split_whitespace().collect();
        m.score(&tokens)
            .into_iter()
            .map(|(d, s)| (m.index().doc(d).external_id.clone(), s))
            .collect()
    }

    #[test]
    fn zero_idf_term_contributes_nothing() {
        let m = model(&[("1", "cat sat mat"), ("2", "dog sat log")]);
        let s = score(&m, "cat sat");
        assert!(s["1"] > 0.0);
        assert!(!s.contains_key("2"));
    }

    #[test]
    fn out_of_vocabulary_query_is_empty() {
        let m = model(&[("1", "cat sat mat")]);
        assert!(score(&m, "zebra unicorn").is_empty());
        assert!(score(&m, "").is_empty());
    }

    #[test]
    fn all_zero_idf_query_is_empty() {
        let m = model(&[("1", "sat cat"), ("2", "sat dog")]);
        assert!(score(&m, "sat sat").is_empty());
    }

    #[test]
    fn identical_vectors_score_one() {
        let m = model(&[("1", "apple banana"), ("2", "cherry"), ("3", "durian")]);
        let s = score(&m, "banana apple");
        assert!((s["1"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn scores_are_bounded() {
        let m = model(&[
            ("1", "alpha beta beta gamma"),
            ("2", "beta delta"),
            ("3", "gamma gamma gamma alpha"),
            ("4", "epsilon"),
        ]);
        for (_, s) in score(&m, "alpha beta gamma gamma zeta") {
            assert!(s > 0.0 && s <= 1.0 + 1e-9, "score {s} out of range");
        }
    }

    #[test]
    fn query_weights_use_max_query_tf() {
        let m = model(&[("1", "x y"), ("2", "z")]);
        let w = m.query_weights(&["x", "x", "y", "unknown"][..]);
        let idf = (2.0f64).log2();
        assert_eq!(w.len(), 2);
        assert!((w[0].1 - idf).abs() < 1e-12);
        assert!((w[1].1 - 0.5 * idf).abs() < 1e-12);
    }
}
