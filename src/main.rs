mod classifier;
mod progress_reporter;
mod scanner;
mod shared_types;

use std::error::Error;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::{info, LevelFilter};
use scanner::{start_scan, PartitionPolicy, ScanPreferences};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Start timestamp, inclusive
    #[arg(short, long, default_value = "0")]
    start: i64,

    /// End timestamp, exclusive; defaults to the current Unix time
    #[arg(short, long)]
    end: Option<i64>,

    /// Number of chunks scanned in parallel; defaults to the CPU count
    #[arg(short, long)]
    chunks: Option<usize>,

    /// Log every all-digit match as hex, decimal and binary
    #[arg(short, long)]
    debug: bool,

    /// Skip the last value of each chunk and the tail remainder, matching
    /// totals from earlier versions of this tool
    #[arg(long)]
    drop_remainder: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let logger = simplelog::TermLogger::new(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger).try_init()?;
    log::set_max_level(level);

    let end = match args.end {
        Some(end) => end,
        None => SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64,
    };
    let chunk_count = match args.chunks {
        Some(n) => n,
        None => std::thread::available_parallelism()?.get(),
    };

    let prefs = ScanPreferences {
        start: args.start,
        end,
        chunk_count,
        debug: args.debug,
        partition: if args.drop_remainder {
            PartitionPolicy::DropRemainder
        } else {
            PartitionPolicy::Full
        },
    };
    let outcome = start_scan(prefs, multi).await?;

    if outcome.span > 0 {
        info!(
            "Total: {}/{} ({})",
            outcome.total,
            outcome.span,
            outcome.total as f64 / outcome.span as f64
        );
    } else {
        info!("Total: {}/{} (empty range)", outcome.total, outcome.span);
    }

    Ok(())
}
