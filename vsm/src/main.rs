use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::eval::{evaluate, Qrels};
use engine::persist::save_snapshot;
use engine::pipeline::{index_corpus, run};
use engine::rank::read_results_file;
use engine::tokenizer::Tokenizer;
use engine::{QueryMode, QuerySubset, RunConfig, ZeroRelevantPolicy};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "vsm")]
#[command(about = "TF-IDF cosine retrieval over a JSONL corpus, with MAP evaluation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a corpus and save the snapshot for later runs
    Build {
        #[arg(long, default_value = "scifact/corpus.jsonl")]
        corpus: PathBuf,
        #[arg(long, default_value = "stop_words.txt")]
        stopwords: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 3)]
        min_token_len: usize,
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Rank every query, write the run file and report MAP when judgments are given
    Run(RunArgs),
    /// Compute MAP for an existing run file
    Eval {
        #[arg(long)]
        results: PathBuf,
        #[arg(long)]
        qrels: PathBuf,
        #[arg(long, value_enum, default_value_t = ZeroRelevant::Zero)]
        zero_relevant: ZeroRelevant,
    },
}

#[derive(Args)]
struct RunArgs {
    #[arg(long, default_value = "scifact/corpus.jsonl")]
    corpus: PathBuf,
    /// Use an index built by `vsm build` instead of indexing the corpus
    #[arg(long)]
    index: Option<PathBuf>,
    #[arg(long, default_value = "scifact/queries.jsonl")]
    queries: PathBuf,
    #[arg(long, default_value = "stop_words.txt")]
    stopwords: PathBuf,
    /// Relevance judgments (TSV or TREC qrels)
    #[arg(long)]
    qrels: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Mode::Title)]
    mode: Mode,
    #[arg(long, value_enum, default_value_t = Subset::Odd)]
    query_subset: Subset,
    #[arg(long, default_value = "Results")]
    output: PathBuf,
    #[arg(long, default_value = "tfidf_cosine")]
    run_name: String,
    #[arg(long, default_value_t = 100)]
    top_k: usize,
    #[arg(long, default_value_t = 3)]
    min_token_len: usize,
    #[arg(long, value_enum, default_value_t = ZeroRelevant::Zero)]
    zero_relevant: ZeroRelevant,
    /// Write the first 100 vocabulary terms here
    #[arg(long)]
    vocab_sample: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Title,
    Titletext,
}

#[derive(Clone, Copy, ValueEnum)]
enum Subset {
    All,
    Odd,
}

#[derive(Clone, Copy, ValueEnum)]
enum ZeroRelevant {
    /// Judged queries without relevant documents count as AP = 0
    Zero,
    /// Judged queries without relevant documents are left out of the mean
    Exclude,
}

impl From<ZeroRelevant> for ZeroRelevantPolicy {
    fn from(z: ZeroRelevant) -> Self {
        match z {
            ZeroRelevant::Zero => ZeroRelevantPolicy::CountAsZero,
            ZeroRelevant::Exclude => ZeroRelevantPolicy::Exclude,
        }
    }
}

impl From<RunArgs> for RunConfig {
    fn from(a: RunArgs) -> Self {
        RunConfig {
            corpus: a.corpus,
            index_dir: a.index,
            queries: a.queries,
            stopwords: a.stopwords,
            qrels: a.qrels,
            query_mode: match a.mode {
                Mode::Title => QueryMode::Title,
                Mode::Titletext => QueryMode::TitleText,
            },
            query_subset: match a.query_subset {
                Subset::All => QuerySubset::All,
                Subset::Odd => QuerySubset::Odd,
            },
            output: a.output,
            run_name: a.run_name,
            top_k: a.top_k,
            min_token_len: a.min_token_len,
            zero_relevant: a.zero_relevant.into(),
            vocab_sample: a.vocab_sample,
            parallel: !a.sequential,
        }
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { corpus, stopwords, output, min_token_len, sequential } => {
            build(corpus, stopwords, output, min_token_len, !sequential)
        }
        Commands::Run(args) => run_pipeline(args.into()),
        Commands::Eval { results, qrels, zero_relevant } => eval(results, qrels, zero_relevant.into()),
    }
}

fn build(corpus: PathBuf, stopwords: PathBuf, output: PathBuf, min_token_len: usize, parallel: bool) -> Result<()> {
    let tokenizer = Tokenizer::from_stopwords_file(&stopwords, min_token_len);
    let index = index_corpus(&corpus, &tokenizer, parallel)?;
    let meta = save_snapshot(&output, &index)
        .with_context(|| format!("writing index to {}", output.display()))?;
    tracing::info!(output = %output.display(), num_docs = meta.num_docs, vocab_size = meta.num_terms, "index build complete");
    Ok(())
}

fn run_pipeline(config: RunConfig) -> Result<()> {
    tracing::debug!(config = %serde_json::to_string(&config)?, "run configuration");
    let report = run(&config)?;
    tracing::info!(
        num_docs = report.num_docs,
        vocab_size = report.vocab_size,
        num_queries = report.num_queries,
        "run complete"
    );

    let f = File::open(&config.output).with_context(|| format!("reading back {}", config.output.display()))?;
    for line in BufReader::new(f).lines().take(10) {
        tracing::debug!(line = %line?, "result");
    }
    if let Some(e) = report.evaluation {
        println!("MAP: {:.4} over {} queries", e.map, e.evaluated());
    }
    Ok(())
}

fn eval(results: PathBuf, qrels_path: PathBuf, policy: ZeroRelevantPolicy) -> Result<()> {
    let rankings = read_results_file(&results).with_context(|| format!("reading {}", results.display()))?;
    let Some(qrels) = Qrels::load(&qrels_path)? else {
        anyhow::bail!("judgments file {} not readable", qrels_path.display());
    };
    let e = evaluate(&rankings, &qrels, policy);
    for (qid, ap) in &e.per_query {
        println!("{qid}\t{ap:.4}");
    }
    println!("MAP: {:.4} over {} queries", e.map, e.evaluated());
    Ok(())
}
