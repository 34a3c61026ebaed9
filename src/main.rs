use clap::Parser;
use std::path::PathBuf;

use gfa2digraph::convert;

#[derive(Parser)]
#[command(name = "gfa2digraph")]
#[command(about = "Convert a GFA sequence graph into an in-memory directed graph", long_about = None)]
#[command(version)]
struct Cli {
    /// Input GFA file (.gfa or .gfa.gz)
    #[arg(value_name = "GRAPH.GFA")]
    gfa: PathBuf,

    /// Number of threads (default: all available cores)
    #[arg(short = 't', long, value_name = "INT")]
    threads: Option<usize>,

    /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
    #[arg(short = 'v', long, value_name = "INT", default_value = "3")]
    verbosity: i32,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace, // 5+ = trace
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Configure the rayon thread pool, defaulting to all available cores
    let mut num_threads = cli.threads.unwrap_or_else(num_cpus::get);
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

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        log::warn!(
            "Failed to configure thread pool: {} (may already be initialized)",
            e
        );
    }

    let graph = match convert::gfa_to_digraph(&cli.gfa) {
        Ok(graph) => graph,
        Err(e) => {
            log::error!("Conversion failed: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "nodes\t{}\nedges\t{}\npaths\t{}\nstart_nodes\t{}\nstop_nodes\t{}",
        graph.node_count(),
        graph.edge_count(),
        graph.path_count(),
        graph.start_nodes().len(),
        graph.stop_nodes().len()
    );
}
