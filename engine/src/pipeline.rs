//! The batch run: index → weights → per-query scores → top-K → run file → MAP.

use crate::config::RunConfig;
use crate::corpus::{read_corpus, read_queries, tokenize_corpus, Query};
use crate::error::{EngineError, Result};
use crate::eval::{evaluate, Evaluation, Qrels};
use crate::index::{build_index, InvertedIndex};
use crate::persist::{load_snapshot, write_vocab_sample, VOCAB_SAMPLE_SIZE};
use crate::rank::{top_k, write_results_file, Rankings};
use crate::scorer::VectorModel;
use crate::tokenizer::Tokenizer;
use rayon::prelude::*;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub num_docs: usize,
    pub vocab_size: usize,
    pub num_queries: usize,
    /// Queries that produced no scored document.
    pub empty_queries: usize,
    /// `None` when no judgments were configured or readable.
    pub evaluation: Option<Evaluation>,
}

/// Read, tokenize and index a corpus file. An empty result is fatal.
pub fn index_corpus(corpus: &Path, tokenizer: &Tokenizer, parallel: bool) -> Result<InvertedIndex> {
    let docs = read_corpus(corpus)?;
    let tokenized = tokenize_corpus(&docs, tokenizer, parallel);
    let index = build_index(&tokenized, parallel);
    if index.num_docs() == 0 {
        return Err(EngineError::EmptyCorpus { path: corpus.to_path_buf() });
    }
    Ok(index)
}

/// Index the corpus named by `config`, or load the configured snapshot.
pub fn load_or_build_index(config: &RunConfig, tokenizer: &Tokenizer) -> Result<InvertedIndex> {
    let index = match &config.index_dir {
        Some(dir) => {
            let index = load_snapshot(dir)?;
            if index.num_docs() == 0 {
                return Err(EngineError::EmptyCorpus { path: dir.clone() });
            }
            index
        }
        None => index_corpus(&config.corpus, tokenizer, config.parallel)?,
    };
    tracing::info!(vocab_size = index.num_terms(), "vocabulary");
    Ok(index)
}

/// Score and truncate every query. Queries are independent, so they run in
/// parallel over the shared read-only model when `parallel` is set.
pub fn rank_queries(model: &VectorModel, queries: &[Query], k: usize, parallel: bool) -> Rankings {
    let rank_one = |q: &Query| (q.id, top_k(model.score(&q.tokens), model.index(), k));
    if parallel {
        queries.par_iter().map(rank_one).collect()
    } else {
        queries.iter().map(rank_one).collect()
    }
}

pub fn run(config: &RunConfig) -> Result<RunReport> {
    config.validate()?;
    let tokenizer = Tokenizer::from_stopwords_file(&config.stopwords, config.min_token_len);

    let index = load_or_build_index(config, &tokenizer)?;
    if let Some(path) = &config.vocab_sample {
        write_vocab_sample(path, &index, VOCAB_SAMPLE_SIZE)?;
    }
    let model = VectorModel::new(index);

    let queries = read_queries(&config.queries, &tokenizer, config.query_mode, config.query_subset)?;
    if queries.is_empty() {
        return Err(EngineError::NoQueries { path: config.queries.clone() });
    }

    let rankings = rank_queries(&model, &queries, config.top_k, config.parallel);
    let empty_queries = rankings.values().filter(|r| r.is_empty()).count();
    if empty_queries > 0 {
        tracing::info!(empty_queries, "queries with no matching document");
    }
    write_results_file(&config.output, &rankings, &config.run_name)?;

    let evaluation = match &config.qrels {
        Some(path) => Qrels::load(path)?.map(|qrels| evaluate(&rankings, &qrels, config.zero_relevant)),
        None => None,
    };
    match &evaluation {
        Some(e) => tracing::info!(map = %format!("{:.4}", e.map), evaluated = e.evaluated(), "mean average precision"),
        None => tracing::info!("MAP unavailable"),
    }

    Ok(RunReport {
        num_docs: model.index().num_docs(),
        vocab_size: model.index().num_terms(),
        num_queries: queries.len(),
        empty_queries,
        evaluation,
    })
}
