use clap::{Parser, ValueEnum};
use log::{LevelFilter, info};
use splitsnet::io::{read_distances_tsv, read_fasta, write_edges_tsv, write_newick, write_splits_tsv};
use splitsnet::{
    CharacterMatrix, DistanceMatrix, MinSpanningConfig, ParsimonyConfig, PhyloGraph, ProgressLog, SplitSystem, SplitsError, Taxa,
    buneman_tree, min_spanning_network, neighbor_joining, parsimony_splits, split_decomposition,
};
use std::path::PathBuf;
use std::time::Instant;

/// Compute splits, trees or networks from a distance matrix (TSV) or an
/// alignment (FASTA) and write them as TSV or Newick.
#[derive(Parser, Debug)]
#[command(name = "splitsnet", version, about = "Split systems, trees and networks for phylogenetic data")]
struct Args {
    /// Input: labelled TSV distance matrix, or FASTA alignment for `parsimony`
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output path (`.gz` for compressed output)
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Method to run
    #[arg(short = 'm', long = "method", value_enum, default_value_t = MethodArg::SplitDecomposition)]
    method: MethodArg,

    /// Parsimony: skip gap (and ambiguous nucleotide) columns like missing data
    #[arg(long = "gaps-as-missing", default_value_t = true, action = clap::ArgAction::Set)]
    gaps_as_missing: bool,

    /// Parsimony: the alignment holds nucleotides (IUPAC ambiguity codes apply)
    #[arg(long = "nucleotides", default_value_t = false)]
    nucleotides: bool,

    /// MSN: extra distance range added once the network is connected
    #[arg(long = "epsilon", default_value_t = 0.0)]
    epsilon: f64,

    /// Split methods: drop splits lighter than this weight
    #[arg(long = "threshold")]
    threshold: Option<f64>,

    /// Split methods: keep only a greedily chosen compatible subset
    #[arg(long = "greedy-compatible", default_value_t = false)]
    greedy_compatible: bool,

    /// Quiet mode: only warnings and errors are logged
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MethodArg {
    SplitDecomposition,
    Buneman,
    Parsimony,
    Nj,
    Msn,
    Mst,
}

enum Input {
    Distances(DistanceMatrix),
    Characters(CharacterMatrix),
}

enum Output {
    Splits(SplitSystem),
    Tree(PhyloGraph),
    Network(PhyloGraph),
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(if args.quiet { LevelFilter::Warn } else { LevelFilter::Info })
        .parse_default_env()
        .init();

    // Read input
    let t0 = Instant::now();
    let input = match args.method {
        MethodArg::Parsimony => {
            read_fasta(&args.input, args.nucleotides).map(|(taxa, chars)| (taxa, Input::Characters(chars)))
        }
        _ => read_distances_tsv(&args.input).map(|(taxa, d)| (taxa, Input::Distances(d))),
    };
    let (taxa, input) = match input {
        Ok(read) => read,
        Err(e) => {
            eprintln!("Failed to read {:?}: {e}", args.input);
            std::process::exit(2);
        }
    };
    info!("Read {} taxa in {:.3}s", taxa.len(), t0.elapsed().as_secs_f64());

    // Compute
    let t1 = Instant::now();
    let output = match run(&args, &taxa, input) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Failed to compute {:?}: {e}", args.method);
            std::process::exit(3);
        }
    };
    info!("Computed {:?} in {:.3}s", args.method, t1.elapsed().as_secs_f64());

    // Write
    let t2 = Instant::now();
    let written = match &output {
        Output::Splits(splits) => write_splits_tsv(&args.output, splits, &taxa),
        Output::Tree(tree) => write_newick(&args.output, tree),
        Output::Network(network) => write_edges_tsv(&args.output, network),
    };
    if let Err(e) = written {
        eprintln!("Failed to write output {:?}: {e}", args.output);
        std::process::exit(4);
    }
    info!("Writing to output {:.3}s", t2.elapsed().as_secs_f64());
}

fn run(args: &Args, taxa: &Taxa, input: Input) -> Result<Output, SplitsError> {
    let mut progress = ProgressLog::new(format!("{:?}", args.method));
    let mut splits = match (args.method, input) {
        (MethodArg::SplitDecomposition, Input::Distances(d)) => split_decomposition(&d, &mut progress)?,
        (MethodArg::Buneman, Input::Distances(d)) => buneman_tree(&d, &mut progress)?,
        (MethodArg::Parsimony, Input::Characters(chars)) => {
            let config = ParsimonyConfig {
                gaps_as_missing: args.gaps_as_missing,
            };
            parsimony_splits(&chars, &config, &mut progress)?
        }
        (MethodArg::Nj, Input::Distances(d)) => {
            return Ok(Output::Tree(neighbor_joining(&d, taxa, &mut progress)?));
        }
        (method @ (MethodArg::Msn | MethodArg::Mst), Input::Distances(d)) => {
            let config = MinSpanningConfig {
                minimum_spanning_tree: matches!(method, MethodArg::Mst),
                epsilon: args.epsilon,
            };
            return Ok(Output::Network(min_spanning_network(&d, taxa, &config, &mut progress)?));
        }
        _ => return Err(SplitsError::Internal("input kind does not match the method")),
    };

    if let Some(threshold) = args.threshold {
        splits.set_threshold(threshold);
        splits = splits.filter_by_threshold();
    }
    if args.greedy_compatible {
        splits = splits.greedy_compatible();
    }
    info!(
        "{} splits, total weight {}, {}",
        splits.len(),
        splits.total_weight(),
        splits.compatibility()
    );
    Ok(Output::Splits(splits))
}
