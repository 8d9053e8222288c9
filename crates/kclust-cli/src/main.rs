use clap::{Parser, Subcommand, ValueEnum};
use kclust_lib::{
    Alphabet, CoverageMode, FlatFileWriter, MatcherConfiguration, MemorySequenceStore,
    SequenceStore,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "kclust")]
#[command(version = "0.1.0")]
#[command(about = "Linear-time k-mer candidate clustering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlphabetKind {
    /// 20 amino acids plus X
    Aa,
    /// ACGT plus N
    Nt,
}

#[derive(Subcommand)]
enum Commands {
    /// Group similar sequences by shared k-mers
    Match {
        /// Input FASTA/FASTQ file (gzip transparent)
        input: String,

        /// Output result file
        output: String,

        /// K-mer length (0 = per-alphabet default: 10 aa, 15 nt)
        #[arg(short = 'k', long, default_value = "0")]
        kmer_size: usize,

        /// Residue alphabet
        #[arg(long, value_enum, default_value = "aa")]
        alphabet: AlphabetKind,

        /// K-mers selected per sequence (0 = per-alphabet default: 20 aa, 60 nt)
        #[arg(long, default_value = "0")]
        kmers_per_sequence: usize,

        /// Rolling hash rotation per residue, in bits
        #[arg(long, default_value = "5")]
        hash_shift: u32,

        /// Drop a sequence's k-mers after this many repeated windows (0 = off)
        #[arg(long, default_value = "0")]
        skip_repeat_kmers: usize,

        /// Coverage threshold a pair must be able to reach
        #[arg(short = 'c', long, default_value = "0.8")]
        cov: f32,

        /// Coverage mode (0 bidirectional, 1 target, 2 query, 3 length-query, 4 length-target)
        #[arg(long, default_value = "0")]
        cov_mode: u8,

        /// Keep only members whose diagonal can extend past the representative
        #[arg(long, default_value = "false")]
        include_only_extendable: bool,

        /// Memory budget in bytes for the k-mer array (0 = 90% of system memory)
        #[arg(short = 'm', long, default_value = "0")]
        memory_limit: usize,

        /// Fixed partition count (0 = derive from the memory budget)
        #[arg(long, default_value = "0")]
        splits: usize,

        /// Number of threads (0 = all available cores)
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,

        /// Directory for temporary spill files
        #[arg(long, default_value = "kclust_tmp")]
        tmp_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Match {
            input,
            output,
            kmer_size,
            alphabet,
            kmers_per_sequence,
            hash_shift,
            skip_repeat_kmers,
            cov,
            cov_mode,
            include_only_extendable,
            memory_limit,
            splits,
            threads,
            tmp_dir,
        } => {
            let cov_mode = CoverageMode::from_code(cov_mode)
                .ok_or_else(|| anyhow::anyhow!("invalid coverage mode: {}", cov_mode))?;
            let (alphabet, nucleotide) = match alphabet {
                AlphabetKind::Aa => (Alphabet::amino_acid(), false),
                AlphabetKind::Nt => (Alphabet::nucleotide(), true),
            };

            let mut config = MatcherConfiguration {
                kmer_size,
                alphabet_size: alphabet.size(),
                kmers_per_sequence,
                hash_shift,
                skip_n_repeat_kmers: skip_repeat_kmers,
                cov_threshold: cov,
                cov_mode,
                include_only_extendable,
                memory_limit_bytes: memory_limit,
                split_override: splits,
                num_threads: threads,
                tmp_dirname: tmp_dir,
                ..MatcherConfiguration::default()
            };
            config.apply_linear_filter_defaults(nucleotide);

            match_command(&input, &output, &alphabet, &config)?;
        }
    }

    Ok(())
}

fn match_command(
    input: &str,
    output: &str,
    alphabet: &Alphabet,
    config: &MatcherConfiguration,
) -> anyhow::Result<()> {
    info!("Reading sequences from {}...", input);
    let mut store = load_sequences(input, alphabet)?;
    info!("  Loaded {} sequences", store.len());

    let mut writer = FlatFileWriter::create(output)?;
    let stats = kclust_lib::run_matcher(&mut store, config, None, &mut writer)?;
    writer.finish()?;

    info!(
        "Done: {} groups, {} member pairs, {} singletons -> {}",
        stats.groups_written, stats.pairs_written, stats.singletons_written, output
    );
    Ok(())
}

/// Parse a FASTA/FASTQ file into an in-memory store. Records are keyed by
/// their position in the file.
fn load_sequences(path: &str, alphabet: &Alphabet) -> anyhow::Result<MemorySequenceStore> {
    let mut store = MemorySequenceStore::new();
    let mut reader = needletail::parse_fastx_file(path)?;
    let mut key = 0u32;
    while let Some(record) = reader.next() {
        let record = record?;
        store.push_ascii(key, alphabet, &record.seq());
        key = key
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("too many sequences in {}", path))?;
    }
    Ok(store)
}
