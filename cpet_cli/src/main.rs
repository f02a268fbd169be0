//! CPET topology sampler CLI
//!
//! Samples electric field-line topology around a charged structure.

use clap::Parser;
use cpet_cli::{write_samples, write_samples_to_file, TopologyExport};
use cpet_core::{PathSample, System};
use cpet_env::{Result, SeededEntropy};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// CPET electric field topology sampler
#[derive(Parser, Debug)]
#[command(name = "cpet")]
#[command(about = "Sample electric field-line topology around a charged structure", long_about = None)]
struct Args {
    /// Structure file with ATOM/HETATM point charges
    #[arg(short = 'p', long)]
    protein: PathBuf,

    /// Options file (center, v1, v2, volume, sample, ...)
    #[arg(short, long)]
    options: PathBuf,

    /// Number of worker threads
    #[arg(short, long, default_value = "1")]
    threads: usize,

    /// Master seed, overriding the options file
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write samples to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print a JSON run summary
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<TopologyExport> {
    let mut system = System::from_files(&args.protein, &args.options)?;
    if let Some(seed) = args.seed {
        system = system.with_entropy(SeededEntropy::new(seed));
    }

    let mut export = TopologyExport::new(
        &args.protein.display().to_string(),
        &args.options.display().to_string(),
        args.threads,
        system.seed(),
    )
    .with_frame(&system.center(), &system.basis());

    let start = Instant::now();
    let samples: Vec<PathSample> = system.calculate_topology(args.threads);
    export.finalize(&samples, start.elapsed().as_secs_f64());

    match &args.out {
        Some(path) => {
            write_samples_to_file(&samples, path)?;
            info!("Wrote {} samples to {}", samples.len(), path.display());
            export.output = Some(path.display().to_string());
        }
        None => {
            let stdout = std::io::stdout();
            write_samples(&samples, &mut stdout.lock())
                .map_err(|e| cpet_env::CpetError::io("<stdout>", e))?;
        }
    }

    Ok(export)
}

fn main() {
    let args = Args::parse();

    // Initialize logging; stdout carries the samples
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error: failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    info!("CPET topology sampler v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(export) => {
            let s = &export.summary;
            info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            info!(
                "{} samples in {:.2}s | distance {:.4} ± {:.4} | curvature {:.4} ± {:.4}",
                s.count, export.elapsed_secs, s.mean_distance, s.std_distance, s.mean_curvature, s.std_curvature
            );
            if args.json {
                // Keep stdout clean when it carries the samples
                if args.out.is_some() {
                    println!("{}", export.to_json());
                } else {
                    eprintln!("{}", export.to_json());
                }
            }
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
