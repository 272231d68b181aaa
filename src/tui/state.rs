use crate::bench::BenchTable;
use crate::model::{
    speed_to_delay_ms, Algorithm, RunSummary, SessionConfig, SessionEvent, SessionState,
};
use std::time::Instant;

/// Everything the render loop needs; owned by the UI thread only, no
/// cross-thread mutation.
pub(crate) struct UiState {
    pub tab: usize,
    pub session: SessionState,
    pub paused: bool,
    pub algorithm: Algorithm,
    pub size: usize,
    pub speed: u8,
    pub values: Vec<i32>,
    pub primary: Option<usize>,
    pub secondary: Option<usize>,
    pub run_start: Option<Instant>,
    pub last_summary: Option<RunSummary>,
    pub info: String,
    /// The UI thread is the designated publishing context for the grid: it is
    /// the only writer, applying worker updates as they drain.
    pub bench: BenchTable,
    /// Size row shown on the graph tab.
    pub graph_size: usize,
}

impl UiState {
    pub fn new(cfg: &SessionConfig, bench: BenchTable) -> Self {
        Self {
            tab: 0,
            session: SessionState::Idle,
            paused: false,
            algorithm: cfg.algorithm,
            size: cfg.size,
            speed: cfg.speed,
            values: Vec::new(),
            primary: None,
            secondary: None,
            run_start: None,
            last_summary: None,
            info: String::new(),
            bench,
            graph_size: 0,
        }
    }

    pub fn apply_event(&mut self, ev: SessionEvent) {
        match ev {
            SessionEvent::ArrayReset { values } => {
                self.size = values.len();
                self.values = values;
                self.session = SessionState::Idle;
                self.paused = false;
                self.primary = None;
                self.secondary = None;
                self.run_start = None;
                self.last_summary = None;
            }
            SessionEvent::RunStarted { algorithm } => {
                self.algorithm = algorithm;
                self.session = SessionState::Running;
                self.paused = false;
                self.run_start = Some(Instant::now());
                self.last_summary = None;
            }
            SessionEvent::Frame(snap) => {
                self.values = snap.values;
                self.primary = snap.primary;
                self.secondary = snap.secondary;
            }
            SessionEvent::RunCompleted { summary } => {
                self.values = summary.values.clone();
                self.primary = None;
                self.secondary = None;
                self.session = SessionState::Completed;
                self.paused = false;
                self.last_summary = Some(*summary);
            }
            SessionEvent::RunCancelled => {
                self.session = SessionState::Cancelled;
                self.paused = false;
                self.primary = None;
                self.secondary = None;
            }
            SessionEvent::Info(msg) => {
                self.info = msg;
            }
        }
    }

    /// Title line for the animation tab.
    pub fn status_line(&self) -> String {
        let name = self.algorithm.label();
        match self.session {
            SessionState::Running if self.paused => format!("{name} - Paused"),
            SessionState::Running => format!("{name} - Sorting in progress..."),
            SessionState::Paused => format!("{name} - Paused"),
            SessionState::Completed => match &self.last_summary {
                Some(s) => format!(
                    "{name} - Completed in {:.2} seconds ({} comparisons, {} swaps)",
                    s.elapsed_ms / 1000.0,
                    s.comparisons,
                    s.swaps
                ),
                None => format!("{name} - Completed"),
            },
            SessionState::Cancelled => format!("{name} - Cancelled"),
            SessionState::Idle => format!("{name} - Press 's' to start"),
        }
    }

    pub fn settings_line(&self) -> String {
        format!(
            "Size: {}   Speed: {} ({} ms/step)",
            self.size,
            self.speed,
            speed_to_delay_ms(self.speed)
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self.session, SessionState::Running | SessionState::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Snapshot;

    fn fresh_state() -> UiState {
        let cfg = SessionConfig {
            algorithm: Algorithm::Bubble,
            size: 10,
            speed: 70,
            sort_on_launch: false,
        };
        UiState::new(&cfg, BenchTable::new(&[100]))
    }

    #[test]
    fn lifecycle_events_drive_the_session_state() {
        let mut state = fresh_state();
        state.apply_event(SessionEvent::ArrayReset {
            values: vec![3, 1, 2],
        });
        assert_eq!(state.session, SessionState::Idle);
        assert_eq!(state.size, 3);

        state.apply_event(SessionEvent::RunStarted {
            algorithm: Algorithm::Heap,
        });
        assert_eq!(state.session, SessionState::Running);
        assert_eq!(state.algorithm, Algorithm::Heap);

        state.apply_event(SessionEvent::Frame(Snapshot {
            values: vec![1, 3, 2],
            primary: Some(1),
            secondary: Some(2),
        }));
        assert_eq!(state.primary, Some(1));

        state.apply_event(SessionEvent::RunCompleted {
            summary: Box::new(RunSummary {
                algorithm: Algorithm::Heap,
                values: vec![1, 2, 3],
                comparisons: 4,
                swaps: 2,
                elapsed_ms: 12.0,
            }),
        });
        assert_eq!(state.session, SessionState::Completed);
        assert_eq!(state.primary, None);
        assert!(state.status_line().contains("Completed in"));
    }

    #[test]
    fn reset_clears_a_finished_run() {
        let mut state = fresh_state();
        state.apply_event(SessionEvent::RunStarted {
            algorithm: Algorithm::Bubble,
        });
        state.apply_event(SessionEvent::RunCancelled);
        assert_eq!(state.session, SessionState::Cancelled);

        state.apply_event(SessionEvent::ArrayReset {
            values: vec![5, 5, 5, 5],
        });
        assert_eq!(state.session, SessionState::Idle);
        assert!(state.last_summary.is_none());
        assert_eq!(state.size, 4);
    }
}
