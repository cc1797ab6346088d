mod corpus;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ranking::eval::Qrels;
use ranking::knn::KnnClassifier;
use ranking::params::{load_params, save_params};
use ranking::query::read_queries;
use ranking::search::search_top;
use ranking::tokenizer::Vocabulary;
use ranking::tune::{Objective, ParameterGrid, TsvLog, Tuner, TuningOptions, TuningSummary};
use ranking::{ModelKind, Query, ScoringFunction};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "tuner")]
#[command(about = "Tune, evaluate and apply text ranking models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grid-search a model's parameters against judged queries
    Tune {
        /// Corpus file or directory (.json / .jsonl)
        #[arg(long)]
        corpus: PathBuf,
        /// One query per line; ids are line numbers from 0
        #[arg(long)]
        queries: PathBuf,
        /// Relevance judgments: `query_id doc_id relevance` per line
        #[arg(long)]
        qrels: PathBuf,
        #[arg(long, default_value = "bm25")]
        model: ModelKind,
        /// JSON parameter grid; the model's default sweep when absent
        #[arg(long, conflicts_with = "rows")]
        grid: Option<PathBuf>,
        /// Whitespace-separated cells, one per line, over --names
        #[arg(long, requires = "names")]
        rows: Option<PathBuf>,
        /// Comma-separated parameter names for --rows
        #[arg(long, value_delimiter = ',')]
        names: Vec<String>,
        /// Directory for the result log and the winning parameters
        #[arg(long, default_value = "results")]
        output: PathBuf,
        #[arg(long, default_value_t = 5)]
        cutoff: usize,
        /// Also compute NDCG for every cell
        #[arg(long, default_value_t = false)]
        ndcg: bool,
        /// Pick the best cell by NDCG instead of MAP
        #[arg(long, default_value_t = false)]
        by_ndcg: bool,
        #[arg(long, default_value_t = 1000)]
        max_queries: usize,
        /// Evaluate cells on all cores
        #[arg(long, default_value_t = false)]
        parallel: bool,
    },
    /// Label test documents by k-NN over one or more training corpora
    Classify {
        /// Training corpus; repeat to build a weighted ensemble
        #[arg(long, required = true)]
        train: Vec<PathBuf>,
        /// One interpolation weight per --train, in the same order
        #[arg(long)]
        weight: Vec<f64>,
        /// Labelled documents to classify
        #[arg(long)]
        test: PathBuf,
        #[arg(long, default_value = "bm25")]
        model: ModelKind,
        /// Saved parameters; overrides --model
        #[arg(long)]
        params: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Rank a corpus against a single query
    Search {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        query: String,
        #[arg(long, default_value = "bm25")]
        model: ModelKind,
        /// Saved parameters; overrides --model
        #[arg(long)]
        params: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tune {
            corpus,
            queries,
            qrels,
            model,
            grid,
            rows,
            names,
            output,
            cutoff,
            ndcg,
            by_ndcg,
            max_queries,
            parallel,
        } => {
            let grid = load_grid(model, grid.as_deref(), rows.as_deref(), names)?;
            let options = TuningOptions {
                cutoff,
                with_ndcg: ndcg,
                objective: if by_ndcg { Objective::Ndcg } else { Objective::Map },
            };
            let inputs = TuneInputs { corpus: &corpus, queries: &queries, qrels: &qrels, max_queries };
            tune(model, grid, options, &inputs, &output, parallel)
        }
        Commands::Classify { train, weight, test, model, params, k } => {
            classify(&train, weight, &test, scorer(model, params.as_deref())?.as_ref(), k)
        }
        Commands::Search { corpus, query, model, params, top } => {
            run_search(&corpus, &query, scorer(model, params.as_deref())?.as_ref(), top)
        }
    }
}

fn scorer(model: ModelKind, params: Option<&Path>) -> Result<Box<dyn ScoringFunction>> {
    match params {
        Some(path) => load_params(path).with_context(|| format!("loading parameters from {}", path.display())),
        None => Ok(model.build()),
    }
}

fn load_grid(model: ModelKind, grid: Option<&Path>, rows: Option<&Path>, names: Vec<String>) -> Result<ParameterGrid> {
    if let Some(path) = grid {
        let reader = BufReader::new(File::open(path).with_context(|| format!("opening {}", path.display()))?);
        return serde_json::from_reader(reader).with_context(|| format!("parsing grid {}", path.display()));
    }
    if let Some(path) = rows {
        let reader = BufReader::new(File::open(path).with_context(|| format!("opening {}", path.display()))?);
        return Ok(ParameterGrid::read_rows(names, reader)?);
    }
    Ok(ParameterGrid::default_for(model))
}

struct TuneInputs<'a> {
    corpus: &'a Path,
    queries: &'a Path,
    qrels: &'a Path,
    max_queries: usize,
}

#[derive(Serialize)]
struct BestReport<'a> {
    generated_at: String,
    #[serde(flatten)]
    summary: &'a TuningSummary,
}

fn tune(
    model: ModelKind,
    grid: ParameterGrid,
    options: TuningOptions,
    inputs: &TuneInputs<'_>,
    output: &Path,
    parallel: bool,
) -> Result<()> {
    let tuner = Tuner::new(model, grid, options)?;

    let mut vocab = Vocabulary::new();
    let index = corpus::build_index(inputs.corpus, &mut vocab)?;
    let query_file = File::open(inputs.queries).with_context(|| format!("opening {}", inputs.queries.display()))?;
    let queries = read_queries(BufReader::new(query_file), inputs.max_queries, &vocab)?;
    let qrels_file = File::open(inputs.qrels).with_context(|| format!("opening {}", inputs.qrels.display()))?;
    let qrels = Qrels::read(BufReader::new(qrels_file))?;
    let unjudged = queries.iter().filter(|q| qrels.judgments(q.id).is_err()).count();
    if unjudged > 0 {
        tracing::warn!(unjudged, "queries without judgments count as zero in every cell");
    }
    tracing::info!(model = model.id(), cells = tuner.grid().len(), queries = queries.len(), "starting sweep");

    fs::create_dir_all(output)?;
    let mut log = TsvLog::for_model(output, model)?;
    let summary = if parallel {
        tuner.run_parallel(&index, &queries, &qrels, &mut log)?
    } else {
        tuner.run(&index, &queries, &qrels, &mut log)?
    };

    let Some(best) = summary.best_scorer() else {
        bail!("no cell of the {model} grid could be evaluated ({} skipped)", summary.skipped);
    };
    let best = best?;
    let params_path = output.join(format!("{}_best.params", model.id()));
    save_params(&params_path, best.as_ref())?;

    let report = BestReport {
        generated_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        summary: &summary,
    };
    let json_path = output.join(format!("{}_best.json", model.id()));
    fs::write(&json_path, serde_json::to_string_pretty(&report)?)?;

    if let Some(row) = &summary.best {
        println!("{model}\t{}", row.to_tsv());
    }
    tracing::info!(log = %log.path().display(), params = %params_path.display(), "wrote tuning results");
    Ok(())
}

fn classify(train: &[PathBuf], weights: Vec<f64>, test: &Path, scorer: &dyn ScoringFunction, k: usize) -> Result<()> {
    let weights = if weights.is_empty() { vec![1.0; train.len()] } else { weights };

    let mut vocab = Vocabulary::new();
    let indexes = train
        .iter()
        .map(|path| corpus::build_index(path, &mut vocab))
        .collect::<Result<Vec<_>>>()?;
    let classifier = KnnClassifier::ensemble(indexes.iter().collect(), weights, scorer, k)?;

    let labelled: Vec<(Query, String)> = corpus::read_documents(test)?
        .into_iter()
        .enumerate()
        .map(|(i, doc)| (Query::from_text(i as u32, &doc.body, &vocab), doc.category))
        .collect();
    let accuracy = classifier.accuracy(labelled.iter().map(|(query, label)| (query, label.as_str())))?;
    for p in &accuracy.predictions {
        println!("{}\t{}\t{}", p.query, p.expected, p.predicted);
    }
    println!("accuracy\t{}/{}\t{:.4}", accuracy.correct, accuracy.total, accuracy.ratio());
    Ok(())
}

fn run_search(corpus: &Path, text: &str, scorer: &dyn ScoringFunction, top: usize) -> Result<()> {
    let mut vocab = Vocabulary::new();
    let index = corpus::build_index(corpus, &mut vocab)?;
    let query = Query::from_text(0, text, &vocab);
    if query.frequencies.is_empty() {
        tracing::warn!(query = text, "no query term occurs in the corpus");
    }
    for (rank, entry) in search_top(&index, &query, scorer, top).iter().enumerate() {
        println!("{}\t{:.6}\t{}\t{}", rank + 1, entry.score, entry.name, entry.category);
    }
    Ok(())
}
