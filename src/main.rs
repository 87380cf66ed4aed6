mod synth;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use warpindex_search::detect::{Algorithm, Dtw1nnDetector, Interval, Signal};
use warpindex_search::{
    BuildWarning, ClassLabel, IndexConfig, SLOW_WAVE_WINDOW, SearchConfig, TreeIndex, batch,
};

use crate::synth::CorpusShape;

#[derive(Parser)]
#[command(name = "warpindex")]
#[command(about = "DTW nearest-neighbour classification over a clustered tree index")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for data generation and index construction
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel queries (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Index construction parameters shared by the subcommands.
#[derive(Args, Debug, Clone)]
struct IndexArgs {
    /// Children per internal node (K of the k-means splits)
    #[arg(long, default_value_t = 4)]
    branch_factor: usize,

    /// Nodes with at most this many sequences become leaves
    #[arg(long, default_value_t = 30)]
    leaf_size: usize,

    /// Maximum k-means iterations per split
    #[arg(long, default_value_t = 10)]
    max_kmeans_iter: usize,

    /// DBA passes per centroid update
    #[arg(long, default_value_t = 10)]
    dba_iterations: usize,

    /// Maximum number of node splits before the build stops
    #[arg(long, default_value_t = 1000)]
    split_cap: usize,
}

impl IndexArgs {
    fn config(&self, window: usize, seed: u64) -> Result<IndexConfig> {
        Ok(IndexConfig::new(self.branch_factor, window)?
            .with_leaf_size(self.leaf_size)
            .with_max_kmeans_iter(self.max_kmeans_iter)
            .with_dba_iterations(self.dba_iterations)
            .with_split_cap(self.split_cap)
            .with_seed(seed))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build an index over a synthetic corpus and score held-out queries
    Bench {
        /// Number of training sequences
        #[arg(long, default_value_t = 600)]
        train: usize,

        /// Number of query sequences
        #[arg(long, default_value_t = 200)]
        test: usize,

        /// Number of classes
        #[arg(long, default_value_t = 4)]
        classes: usize,

        /// Shortest generated sequence
        #[arg(long, default_value_t = 48)]
        min_len: usize,

        /// Longest generated sequence
        #[arg(long, default_value_t = 96)]
        max_len: usize,

        /// Step size of the per-sequence noise walk
        #[arg(long, default_value_t = 0.3)]
        noise: f64,

        /// Sakoe-Chiba warping window radius
        #[arg(long, default_value_t = 8)]
        window: usize,

        /// Neighbours per query
        #[arg(long, default_value_t = 1)]
        k: usize,

        /// Stop each query after examining this many sequences
        #[arg(long)]
        budget: Option<usize>,

        /// Write the encoded index to this path
        #[arg(long)]
        save: Option<PathBuf>,

        #[command(flatten)]
        index: IndexArgs,
    },

    /// Detect large slow waves in a synthetic recording
    Detect {
        /// Sampling rate in Hz
        #[arg(long, default_value_t = 100.0)]
        sampling_rate: f64,

        /// Recording length in seconds
        #[arg(long, default_value_t = 120.0)]
        seconds: f64,

        /// One large wave every this many waves
        #[arg(long, default_value_t = 4)]
        spacing: usize,

        /// Number of labelled reference waves
        #[arg(long, default_value_t = 200)]
        references: usize,

        /// Load a previously saved index instead of building one
        #[arg(long)]
        index_file: Option<PathBuf>,

        #[command(flatten)]
        index: IndexArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct IndexSummary {
    nodes: usize,
    leaves: usize,
    depth: usize,
    encoded_bytes: usize,
    build_seconds: f64,
    warnings: Vec<BuildWarning>,
}

#[derive(Serialize)]
struct BenchOutput {
    n_train: usize,
    n_test: usize,
    classes: usize,
    window: usize,
    k: usize,
    budget: Option<usize>,
    index: IndexSummary,
    error_rate: f64,
    unresolved: usize,
    mean_distance_computations: f64,
    query_seconds: f64,
}

#[derive(Serialize)]
struct DetectOutput {
    algorithm: String,
    sampling_rate: f64,
    samples: usize,
    candidates: usize,
    events: Vec<Interval>,
    event_seconds: Vec<(f64, f64)>,
}

fn summarize(index: &TreeIndex, build_seconds: f64) -> Result<IndexSummary> {
    let encoded_bytes = index
        .to_bytes()
        .context("failed to encode index")?
        .len();
    Ok(IndexSummary {
        nodes: index.node_count(),
        leaves: index.leaf_count(),
        depth: index.depth(),
        encoded_bytes,
        build_seconds,
        warnings: index.warnings().to_vec(),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);

    match cli.command {
        Command::Bench {
            train,
            test,
            classes,
            min_len,
            max_len,
            noise,
            window,
            k,
            budget,
            save,
            index,
        } => {
            if classes == 0 {
                bail!("--classes must be at least 1");
            }
            if min_len == 0 || min_len > max_len {
                bail!("need 1 <= --min-len <= --max-len, got {min_len}..{max_len}");
            }
            if noise.is_nan() || noise < 0.0 {
                bail!("--noise must be non-negative, got {noise}");
            }

            // 1. Generate data
            let shape = CorpusShape {
                classes,
                min_len,
                max_len,
                noise,
            };
            let prototypes = synth::prototypes(&mut rng, &shape);
            let corpus = synth::labeled_corpus(&mut rng, &prototypes, &shape, train, 0)
                .context("failed to generate training corpus")?;
            let queries = synth::labeled_corpus(&mut rng, &prototypes, &shape, test, train)
                .context("failed to generate queries")?;
            info!(n_train = corpus.len(), n_test = queries.len(), "corpus generated");

            // 2. Build
            let config = index.config(window, cli.seed)?;
            let started = Instant::now();
            let tree = config.build(&corpus).context("index build failed")?;
            let summary = summarize(&tree, started.elapsed().as_secs_f64())?;

            if let Some(path) = save {
                let bytes = tree.to_bytes()?;
                std::fs::write(&path, bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "index saved");
            }

            // 3. Query
            let mut search = SearchConfig::new(window).with_k(k);
            if let Some(budget) = budget {
                search = search.with_examine_budget(budget);
            }
            let started = Instant::now();
            let report = batch::evaluate(&tree, &queries, &search).context("evaluation failed")?;
            let query_seconds = started.elapsed().as_secs_f64();

            // 4. Print summary
            let output = BenchOutput {
                n_train: corpus.len(),
                n_test: queries.len(),
                classes,
                window,
                k,
                budget,
                index: summary,
                error_rate: report.error_rate,
                unresolved: report.unresolved,
                mean_distance_computations: report.mean_distance_computations,
                query_seconds,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Detect {
            sampling_rate,
            seconds,
            spacing,
            references,
            index_file,
            index,
        } => {
            // 1. Load or build the reference index
            let tree = match index_file {
                Some(path) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    TreeIndex::from_bytes(&bytes).context("failed to decode index")?
                }
                None => {
                    let corpus = synth::slow_wave_corpus(&mut rng, sampling_rate, references)
                        .context("failed to generate reference waves")?;
                    let config = index.config(SLOW_WAVE_WINDOW, cli.seed)?;
                    config.build(&corpus).context("index build failed")?
                }
            };
            info!(
                nodes = tree.node_count(),
                sequences = tree.corpus().len(),
                "reference index ready"
            );

            // 2. Generate the recording
            let data = synth::slow_wave_signal(&mut rng, sampling_rate, seconds, spacing);
            let signal = Signal::new(data, sampling_rate)?;

            // 3. Detect
            let detector = Dtw1nnDetector::new(tree).with_target_label(ClassLabel::new(1));
            let candidates = detector.candidates(&signal).len();
            let events = detector.compute(&signal)?;
            info!(candidates, events = events.len(), "detection complete");

            let event_seconds = events
                .iter()
                .map(|e| (e.start as f64 / sampling_rate, e.end as f64 / sampling_rate))
                .collect();
            let output = DetectOutput {
                algorithm: detector.name().to_string(),
                sampling_rate,
                samples: signal.data().len(),
                candidates,
                events,
                event_seconds,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
