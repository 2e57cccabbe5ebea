use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

mod commands;
mod utils;

#[derive(Parser)]
#[command(name = "fsindex-cmd")]
#[command(about = "Command-line utility for building and querying fsindex inverted indexes")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v for debug, -vv for trace). FSINDEX_LOG overrides it.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a file of `term<TAB>doc_id` lines
    Build {
        /// Input TSV file
        input: String,

        /// Output index directory (created if missing)
        index_dir: String,

        /// JSON file with build options
        #[arg(long)]
        config: Option<String>,

        /// Store backend (mmap, file); overrides the config file
        #[arg(long)]
        backend: Option<String>,

        /// External sorter kind (memory, spill, fjall); overrides the config file
        #[arg(long)]
        sorter: Option<String>,

        /// Drop terms occurring in fewer documents than this
        #[arg(long)]
        min_frequency: Option<usize>,
    },

    /// Run a conjunctive query against an index
    Query {
        /// Index directory
        index_dir: String,

        /// Query terms (documents must contain all of them)
        #[arg(required = true)]
        terms: Vec<String>,

        /// Intersection strategy (merge, binary-probe, gallop, adaptive)
        #[arg(long, default_value = "adaptive")]
        strategy: String,

        /// Write the matching document ids to a new store instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run one query per line of a file, in parallel, against one shared index
    QueryBatch {
        /// Index directory
        index_dir: String,

        /// File with one whitespace-separated query per line
        queries: String,

        /// Intersection strategy (merge, binary-probe, gallop, adaptive)
        #[arg(long, default_value = "adaptive")]
        strategy: String,

        /// Number of worker threads (defaults to the number of CPUs)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Inspect an index and display its manifest and store statistics
    Inspect {
        /// Index directory
        index_dir: String,

        /// Also list up to this many terms with their posting list lengths
        #[arg(long)]
        terms: Option<usize>,
    },

    /// Time every intersection strategy on generated list pairs
    Bench {
        /// Length of the shorter list
        #[arg(long, default_value_t = 10_000)]
        small_len: usize,

        /// Length ratios (long / short) to measure
        #[arg(long, value_delimiter = ',', default_value = "1,2,10,100,1000")]
        ratios: Vec<usize>,

        /// Fraction of the shorter list present in the longer one
        #[arg(long, default_value_t = 0.5)]
        overlap: f64,

        /// Repetitions per measurement
        #[arg(long, default_value_t = 5)]
        iterations: usize,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Export every posting list Elias-delta gap-coded
    ExportDelta {
        /// Index directory
        index_dir: String,

        /// Output file (defaults to postings.delta inside the index directory)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env = Env::new()
        .filter_or("FSINDEX_LOG", level)
        .write_style("FSINDEX_LOG_STYLE");
    env_logger::init_from_env(env);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            input,
            index_dir,
            config,
            backend,
            sorter,
            min_frequency,
        } => commands::build::run(input, index_dir, config, backend, sorter, min_frequency),
        Commands::Query {
            index_dir,
            terms,
            strategy,
            output,
        } => commands::query::run(index_dir, terms, strategy, output),
        Commands::QueryBatch {
            index_dir,
            queries,
            strategy,
            threads,
        } => commands::query_batch::run(index_dir, queries, strategy, threads),
        Commands::Inspect { index_dir, terms } => commands::inspect::run(index_dir, terms),
        Commands::Bench {
            small_len,
            ratios,
            overlap,
            iterations,
            seed,
        } => commands::bench::run(small_len, ratios, overlap, iterations, seed),
        Commands::ExportDelta { index_dir, output } => {
            commands::export_delta::run(index_dir, output)
        }
    }
}
