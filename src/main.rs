use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ferrous_ert::{defaults, seed_run, ErtBuilder, SeedOpt};

#[derive(Parser)]
#[command(name = "ferrous-ert")]
#[command(about = "FerrousERT - Enumerated Radix Tree seeding for DNA reads", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an ERT index for the reference genome
    Index {
        /// Input FASTA file
        #[arg(value_name = "REF.FA")]
        fasta: PathBuf,

        /// Prefix for index files (default: same as FASTA)
        #[arg(short = 'p', long, value_name = "PREFIX")]
        prefix: Option<PathBuf>,

        /// Length of the k-mer prefix table
        #[arg(short = 'k', long, value_name = "INT", default_value_t = defaults::KMER_LEN)]
        kmer_len: usize,

        /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
        #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
        verbosity: i32,
    },

    /// Find seeds (maximal exact matches) for each read
    Seed {
        /// Index prefix (built with 'index' command)
        #[arg(value_name = "INDEX")]
        index: PathBuf,

        /// Input FASTQ file
        #[arg(value_name = "READS.FQ")]
        reads: PathBuf,

        /// Minimum seed length
        #[arg(short = 'k', long, value_name = "INT", default_value_t = defaults::MIN_SEED_LEN)]
        min_seed_len: usize,

        /// Look for internal seeds inside a seed longer than {-k} * FLOAT
        #[arg(short = 'r', long, value_name = "FLOAT", default_value_t = defaults::RESEED_FACTOR)]
        reseed_factor: f32,

        /// Seed occurrence for the 3rd round seeding (0 disables it)
        #[arg(short = 'y', long, value_name = "INT", default_value_t = defaults::SEED_OCCURRENCE_3RD)]
        seed_occurrence_3rd: u32,

        /// Do not list positions of seeds with more than INT occurrences
        #[arg(short = 'c', long, value_name = "INT", default_value_t = defaults::MAX_OCCURRENCES)]
        max_occurrences: u32,

        /// Walk every seed from the tree root instead of the k-mer table
        #[arg(long)]
        no_prefix: bool,

        /// Report hit counts only, without positions
        #[arg(long)]
        no_hits: bool,

        /// Output file (default: stdout)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Number of reads per batch
        #[arg(short = 'K', long, value_name = "INT", default_value = "512")]
        batch_size: usize,

        /// Number of threads (default: all cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,

        /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
        #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY)]
        verbosity: i32,
    },
}

fn init_logging(verbosity: i32) {
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace, // 5+ = trace
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();
}

fn configure_threads(threads: Option<usize>) -> usize {
    let mut num_threads = threads.unwrap_or_else(num_cpus::get);

    if num_threads < 1 {
        log::warn!("Invalid thread count {}, using 1 thread", num_threads);
        num_threads = 1;
    }

    let max_threads = num_cpus::get() * 2;
    if num_threads > max_threads {
        log::warn!(
            "Thread count {} exceeds recommended maximum {}, capping at {}",
            num_threads,
            max_threads,
            max_threads
        );
        num_threads = max_threads;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(_) => {
            log::debug!("Built global Rayon thread pool with {} threads", num_threads);
        }
        Err(e) => {
            log::warn!("Failed to configure thread pool: {} (may already be initialized)", e);
        }
    }

    let thread_word = if num_threads == 1 { "thread" } else { "threads" };
    log::info!("Using {} {}", num_threads, thread_word);
    num_threads
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Index {
            fasta,
            prefix,
            kmer_len,
            verbosity,
        } => {
            init_logging(verbosity);

            let idx_prefix = prefix.unwrap_or_else(|| fasta.clone());

            log::info!("Building index for reference: {}", fasta.display());
            log::info!("Index prefix: {}", idx_prefix.display());

            let result = ErtBuilder::new(kmer_len)
                .build_from_fasta(&fasta)
                .and_then(|index| index.dump(&idx_prefix));
            if let Err(e) = result {
                log::error!("Index building failed: {}", e);
                std::process::exit(1);
            }

            log::info!("Index building completed successfully");
        }

        Commands::Seed {
            index,
            reads,
            min_seed_len,
            reseed_factor,
            seed_occurrence_3rd,
            max_occurrences,
            no_prefix,
            no_hits,
            output,
            batch_size,
            threads,
            verbosity,
        } => {
            init_logging(verbosity);

            let opt = SeedOpt {
                min_seed_len,
                split_factor: reseed_factor,
                max_mem_intv: seed_occurrence_3rd,
                max_occ: max_occurrences,
                use_prefix: !no_prefix,
                fetch_leaves: !no_hits,
                ..Default::default()
            };
            if let Err(e) = opt.validate() {
                log::error!("{}", e);
                std::process::exit(1);
            }
            if batch_size == 0 {
                log::error!("Batch size must be at least 1");
                std::process::exit(1);
            }

            configure_threads(threads);

            if verbosity >= 3 {
                log::info!("Seeding parameters:");
                log::info!("  Min seed length: {}", opt.min_seed_len);
                log::info!("  Re-seed factor: {} (split length {})", opt.split_factor, opt.split_len());
                log::info!("  Max seed occurrences: {}", opt.max_occ);
                log::info!("  3rd round occurrence: {}", opt.max_mem_intv);
            }

            if let Err(e) = seed_run::main_seed(&index, &reads, output.as_deref(), &opt, batch_size) {
                log::error!("{:#}", e);
                std::process::exit(1);
            }
        }
    }
}
