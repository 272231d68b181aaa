use crate::model::{Algorithm, SessionConfig, MAX_SIZE, MIN_SIZE};
use anyhow::Result;
use clap::Parser;
use std::io::Write;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sortlab",
    version,
    about = "Sorting algorithm animator and benchmark runner with optional TUI"
)]
pub struct Cli {
    /// Algorithm to animate on launch
    #[arg(long, value_enum, default_value_t = Algorithm::Bubble)]
    pub algorithm: Algorithm,

    /// Animated array size (10-250)
    #[arg(long, default_value_t = 50)]
    pub size: usize,

    /// Animation speed, 1 (slow) to 100 (fast)
    #[arg(long, default_value_t = 70)]
    pub speed: u8,

    /// Start sorting as soon as the app launches
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub sort_on_launch: bool,

    /// Run the benchmark suite and print a text table (no TUI)
    #[arg(long)]
    pub bench: bool,

    /// Run the benchmark suite and print JSON (no TUI)
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    if !(MIN_SIZE..=MAX_SIZE).contains(&args.size) {
        return Err(anyhow::anyhow!(
            "--size must be between {MIN_SIZE} and {MAX_SIZE}"
        ));
    }
    if !(1..=100).contains(&args.speed) {
        return Err(anyhow::anyhow!("--speed must be between 1 and 100"));
    }

    if args.json {
        return run_bench(true).await;
    }
    if args.bench {
        return run_bench(false).await;
    }

    #[cfg(feature = "tui")]
    {
        return crate::tui::run(args).await;
    }
    #[cfg(not(feature = "tui"))]
    {
        // Fallback when built without TUI support.
        run_bench(false).await
    }
}

/// Build a `SessionConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> SessionConfig {
    SessionConfig {
        algorithm: args.algorithm,
        size: args.size,
        speed: args.speed,
        sort_on_launch: args.sort_on_launch,
    }
}

/// Run the benchmark suite to completion, streaming slow-trial results to
/// stderr and the final table (text or JSON) to stdout.
async fn run_bench(json: bool) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();

    // Fast cells are timed synchronously here; the rest arrive on the channel.
    let (mut table, mut update_rx, worker) = crate::bench::start();
    let _ = out_tx.send(OutputLine::Stderr(
        "Timing large arrays in the background…".into(),
    ));

    while let Some(update) = update_rx.recv().await {
        if table.apply(update) {
            let size = table.sizes().get(update.row).copied().unwrap_or(0);
            let algo = Algorithm::ALL[update.col];
            let _ = out_tx.send(OutputLine::Stderr(format!(
                "{} on {} elements: {} ms",
                algo.label(),
                crate::text_summary::group_thousands(size),
                update.value.text()
            )));
        }
    }
    // Channel closure means the worker already drained its queue.
    let _ = tokio::task::spawn_blocking(move || worker.join()).await;

    if json {
        let out = serde_json::to_string_pretty(&table.report())?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let summary = crate::text_summary::build_bench_summary(&table);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
