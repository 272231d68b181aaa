//! Benchmark scheduler and results table.
//!
//! Times the plain (uninstrumented) sorts over a fixed set of array sizes.
//! Quadratic sorts on large inputs go to a single background worker; merge and
//! heap are cheap enough to always time synchronously. Results travel back as
//! `CellUpdate` messages so only the table's owner ever writes a cell.

mod sorts;

use crate::model::Algorithm;
use anyhow::{bail, Result};
use rand::Rng;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Benchmark array sizes, one table row each.
pub const SIZES: [usize; 4] = [100, 1_000, 10_000, 100_000];

/// Quadratic sorts on sizes above this are timed on the background worker.
pub const ASYNC_THRESHOLD: usize = 10_000;

/// One (size, algorithm) timing slot.
///
/// Transitions are monotonic: Unset → Pending → {Time | Error}, never back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "ms")]
pub enum CellState {
    Unset,
    Pending,
    Time(f64),
    Error,
}

impl CellState {
    pub fn text(&self) -> String {
        match self {
            CellState::Unset => "-".into(),
            CellState::Pending => "Running...".into(),
            CellState::Time(ms) => format!("{ms:.2}"),
            CellState::Error => "Error".into(),
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, CellState::Time(_) | CellState::Error)
    }
}

/// Result hand-off from the worker; applied to the grid only by its owner.
#[derive(Debug, Clone, Copy)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: CellState,
}

/// The 2-D results grid: rows are sizes, columns are algorithms.
#[derive(Debug, Clone)]
pub struct BenchTable {
    sizes: Vec<usize>,
    cells: Vec<Vec<CellState>>,
}

/// JSON-friendly view of a finished (or in-flight) table.
#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub sizes: Vec<usize>,
    pub algorithms: Vec<&'static str>,
    pub cells: Vec<Vec<CellState>>,
}

impl BenchTable {
    pub(crate) fn new(sizes: &[usize]) -> Self {
        Self {
            sizes: sizes.to_vec(),
            cells: vec![vec![CellState::Unset; Algorithm::ALL.len()]; sizes.len()],
        }
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn cell(&self, row: usize, col: usize) -> Result<CellState> {
        if row >= self.sizes.len() || col >= Algorithm::ALL.len() {
            bail!("invalid benchmark cell ({row}, {col})");
        }
        Ok(self.cells[row][col])
    }

    /// Apply a worker result. Only a Pending cell may be finalized; anything
    /// else is ignored so a cell can never regress.
    pub fn apply(&mut self, update: CellUpdate) -> bool {
        if update.row >= self.sizes.len() || update.col >= Algorithm::ALL.len() {
            return false;
        }
        if !update.value.is_settled() {
            return false;
        }
        let cell = &mut self.cells[update.row][update.col];
        if *cell != CellState::Pending {
            return false;
        }
        *cell = update.value;
        true
    }

    pub fn all_settled(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(CellState::is_settled))
    }

    pub fn report(&self) -> BenchReport {
        BenchReport {
            sizes: self.sizes.clone(),
            algorithms: Algorithm::ALL.iter().map(|a| a.label()).collect(),
            cells: self.cells.clone(),
        }
    }
}

struct BenchJob {
    row: usize,
    col: usize,
    size: usize,
}

/// Build the table and kick off background trials.
///
/// Fast cells are timed right here on the calling thread; slow ones come back
/// through the returned update channel. The worker exits once the queued jobs
/// are drained, which closes the channel. The handle may be dropped to detach
/// the worker (quit should not wait out a long trial).
pub fn start() -> (
    BenchTable,
    UnboundedReceiver<CellUpdate>,
    std::thread::JoinHandle<()>,
) {
    start_with(&SIZES, ASYNC_THRESHOLD)
}

fn start_with(
    sizes: &[usize],
    threshold: usize,
) -> (
    BenchTable,
    UnboundedReceiver<CellUpdate>,
    std::thread::JoinHandle<()>,
) {
    let (job_tx, mut job_rx) = mpsc::unbounded_channel::<BenchJob>();
    let (update_tx, update_rx) = mpsc::unbounded_channel::<CellUpdate>();

    let mut table = BenchTable::new(sizes);
    for (row, &size) in sizes.iter().enumerate() {
        // One base sequence per size; every synchronous trial clones it.
        let base = random_values(size);
        for (col, algo) in Algorithm::ALL.iter().enumerate() {
            if algo.is_quadratic() && size > threshold {
                table.cells[row][col] = CellState::Pending;
                let _ = job_tx.send(BenchJob { row, col, size });
            } else {
                table.cells[row][col] = time_sort(base.clone(), *algo);
            }
        }
    }

    // Single-worker pool on a dedicated thread: trials run one at a time off
    // the async context and publish through the update channel.
    let worker = std::thread::spawn(move || {
        while let Some(job) = job_rx.blocking_recv() {
            let value = trial_cell(job.size, Algorithm::ALL[job.col]);
            let _ = update_tx.send(CellUpdate {
                row: job.row,
                col: job.col,
                value,
            });
        }
    });

    (table, update_rx, worker)
}

/// Re-time one cell with a freshly generated array.
///
/// Idempotent per call but not cached: re-invoking re-times and may produce a
/// different duration.
pub fn run_trial(size_index: usize, algo_index: usize) -> Result<f64> {
    if size_index >= SIZES.len() || algo_index >= Algorithm::ALL.len() {
        bail!("invalid benchmark cell ({size_index}, {algo_index})");
    }
    match trial_cell(SIZES[size_index], Algorithm::ALL[algo_index]) {
        CellState::Time(ms) => Ok(ms),
        _ => bail!(
            "benchmark trial failed for ({size_index}, {algo_index})"
        ),
    }
}

/// The one timing path: fresh random array, plain sort, wall clock. Both the
/// background worker and `run_trial` go through here.
fn trial_cell(size: usize, algo: Algorithm) -> CellState {
    time_sort(random_values(size), algo)
}

/// Random benchmark input over the full i32 range.
fn random_values(n: usize) -> Vec<i32> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| rng.gen::<i32>()).collect()
}

/// Time one plain sort. A panicking trial becomes an Error cell instead of
/// taking down the scheduler.
fn time_sort(mut values: Vec<i32>, algo: Algorithm) -> CellState {
    let timed = catch_unwind(AssertUnwindSafe(move || {
        let start = Instant::now();
        sorts::sort(algo, &mut values);
        start.elapsed().as_secs_f64() * 1000.0
    }));
    match timed {
        Ok(ms) => CellState::Time(ms),
        Err(_) => CellState::Error,
    }
}
