use crate::index::{DocId, InvertedIndex, TermId};

/// Document frequency and idf = log2(N / df) per term, indexed by term id.
#[derive(Debug, Clone, Default)]
pub struct TermWeights {
    df: Vec<u32>,
    idf: Vec<f64>,
}

impl TermWeights {
    pub fn compute(index: &InvertedIndex) -> Self {
        let n = index.num_docs() as f64;
        let df: Vec<u32> = index.iter().map(|(_, postings)| postings.len() as u32).collect();
        // df >= 1 for every indexed term
        let idf = df.iter().map(|&d| (n / d as f64).log2()).collect();
        Self { df, idf }
    }

    pub fn df(&self, term_id: TermId) -> u32 { self.df[term_id as usize] }

    pub fn idf(&self, term_id: TermId) -> f64 { self.idf[term_id as usize] }

    pub fn len(&self) -> usize { self.idf.len() }

    pub fn is_empty(&self) -> bool { self.idf.is_empty() }
}

/// Normalized term frequency: raw count over the document's max term frequency.
#[inline]
pub fn normalized_tf(tf: u32, max_tf: u32) -> f64 {
    tf as f64 / max_tf.max(1) as f64
}

/// Euclidean norm of each document's max-tf normalized tf-idf vector.
#[derive(Debug, Clone, Default)]
pub struct DocNorms(Vec<f64>);

impl DocNorms {
    pub fn compute(index: &InvertedIndex, weights: &TermWeights) -> Self {
        let mut sum_sq = vec![0.0f64; index.num_docs()];
        for (tid, postings) in index.iter() {
            let idf = weights.idf(tid);
            if idf == 0.0 {
                continue;
            }
            for p in postings {
                let w = normalized_tf(p.tf, index.doc(p.doc_id).max_tf) * idf;
                sum_sq[p.doc_id as usize] += w * w;
            }
        }
        Self(sum_sq.into_iter().map(f64::sqrt).collect())
    }

    pub fn get(&self, doc_id: DocId) -> f64 { self.0[doc_id as usize] }

    /// Documents whose vector is all zeros can never be scored.
    pub fn unscoreable(&self) -> usize { self.0.iter().filter(|n| **n == 0.0).count() }
}
