use serde::{Deserialize, Serialize};

/// The closed set of sorting algorithms the animator and the benchmark grid know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Algorithm {
    Bubble,
    Selection,
    Insertion,
    Merge,
    Heap,
}

impl Algorithm {
    /// All algorithms in benchmark-column order.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Bubble,
        Algorithm::Selection,
        Algorithm::Insertion,
        Algorithm::Merge,
        Algorithm::Heap,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Algorithm::Bubble => "Bubble Sort",
            Algorithm::Selection => "Selection Sort",
            Algorithm::Insertion => "Insertion Sort",
            Algorithm::Merge => "Merge Sort",
            Algorithm::Heap => "Heap Sort",
        }
    }

    /// Quadratic sorts are the ones the benchmark scheduler pushes to the
    /// background worker on large inputs; merge/heap are cheap enough to
    /// always time synchronously.
    pub fn is_quadratic(self) -> bool {
        matches!(
            self,
            Algorithm::Bubble | Algorithm::Selection | Algorithm::Insertion
        )
    }

    pub fn next(self) -> Algorithm {
        let i = Algorithm::ALL.iter().position(|a| *a == self).unwrap_or(0);
        Algorithm::ALL[(i + 1) % Algorithm::ALL.len()]
    }

    pub fn prev(self) -> Algorithm {
        let i = Algorithm::ALL.iter().position(|a| *a == self).unwrap_or(0);
        Algorithm::ALL[(i + Algorithm::ALL.len() - 1) % Algorithm::ALL.len()]
    }
}

/// Lifecycle of the single animation session owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

/// Initial session settings built from CLI arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub algorithm: Algorithm,
    pub size: usize,
    pub speed: u8,
    pub sort_on_launch: bool,
}

/// Inclusive bounds for the animated array size.
pub const MIN_SIZE: usize = 10;
pub const MAX_SIZE: usize = 250;

/// Animation values are drawn from this half-open range so bars always have
/// visible height.
pub const VALUE_RANGE: std::ops::Range<i32> = 20..300;

/// Map a 1..=100 speed setting to a per-step delay in milliseconds.
///
/// Linear below 60, quadratic falloff above it so the top of the range feels
/// much faster; never below 1 ms.
pub fn speed_to_delay_ms(speed: u8) -> u64 {
    let v = speed.clamp(1, 100) as u64;
    if v < 60 {
        100 - v
    } else {
        let factor = (100.0 - v as f64) / 40.0;
        ((factor * factor * 40.0) as u64).max(1)
    }
}

/// Cooperative cancellation signal observed at every checkpoint.
///
/// This is control flow, not a failure: a cancelled run stops cleanly and is
/// never reported as an error to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Immutable point-in-time view of the animation for the renderer.
///
/// Carries an owned copy of the values; the renderer never reads the worker's
/// live buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub values: Vec<i32>,
    pub primary: Option<usize>,
    pub secondary: Option<usize>,
}

/// Outcome of a finished (not failed) engine run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunSummary),
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub algorithm: Algorithm,
    /// Final (sorted) contents; handed back to the controller as the new
    /// current array.
    pub values: Vec<i32>,
    pub comparisons: u64,
    pub swaps: u64,
    pub elapsed_ms: f64,
}

/// Events emitted by the engine/controller and consumed by presentation layers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A fresh random array replaced the current one (startup or reset).
    ArrayReset { values: Vec<i32> },
    RunStarted { algorithm: Algorithm },
    Frame(Snapshot),
    RunCompleted {
        // Box to keep SessionEvent size small; RunSummary carries the array.
        summary: Box<RunSummary>,
    },
    RunCancelled,
    Info(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_mapping_is_linear_below_sixty() {
        assert_eq!(speed_to_delay_ms(1), 99);
        assert_eq!(speed_to_delay_ms(30), 70);
        assert_eq!(speed_to_delay_ms(59), 41);
    }

    #[test]
    fn speed_mapping_is_quadratic_above_sixty() {
        // ((100-70)/40)^2 * 40 = 22.5, truncated.
        assert_eq!(speed_to_delay_ms(70), 22);
        assert_eq!(speed_to_delay_ms(60), 40);
        assert!(speed_to_delay_ms(70) > 0);
    }

    #[test]
    fn speed_mapping_never_drops_below_one_ms() {
        for v in 1..=100u8 {
            assert!(speed_to_delay_ms(v) >= 1, "speed {v} mapped to 0");
        }
        assert_eq!(speed_to_delay_ms(100), 1);
    }

    #[test]
    fn algorithm_cycling_covers_the_whole_set() {
        let mut a = Algorithm::Bubble;
        for _ in 0..Algorithm::ALL.len() {
            a = a.next();
        }
        assert_eq!(a, Algorithm::Bubble);
        assert_eq!(Algorithm::Bubble.prev(), Algorithm::Heap);
    }
}
