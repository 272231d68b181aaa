mod sorts;
mod stepper;

use crate::model::{Algorithm, RunOutcome, RunSummary, SessionEvent};
use anyhow::Result;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Instant;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum EngineControl {
    /// Pause (true) or resume (false) the running animation
    Pause(bool),
    /// Cancel the run entirely
    Cancel,
}

/// One animation run: a single worker driving one algorithm over one array.
pub struct AnimationEngine {
    algorithm: Algorithm,
    values: Vec<i32>,
    delay_ms: Arc<AtomicU64>,
}

impl AnimationEngine {
    pub fn new(algorithm: Algorithm, values: Vec<i32>, delay_ms: Arc<AtomicU64>) -> Self {
        Self {
            algorithm,
            values,
            delay_ms,
        }
    }

    pub async fn run(
        self,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
        mut control_rx: mpsc::UnboundedReceiver<EngineControl>,
    ) -> Result<RunOutcome> {
        let paused = Arc::new(AtomicBool::new(false));
        let cancel = Arc::new(AtomicBool::new(false));

        // Control listener.
        let paused2 = paused.clone();
        let cancel2 = cancel.clone();
        let control_handle = tokio::spawn(async move {
            while let Some(msg) = control_rx.recv().await {
                match msg {
                    EngineControl::Pause(p) => paused2.store(p, Ordering::Relaxed),
                    EngineControl::Cancel => {
                        cancel2.store(true, Ordering::Relaxed);
                        break;
                    }
                }
            }
        });

        let start = Instant::now();
        let mut st = stepper::Stepper::new(
            self.values,
            paused,
            cancel,
            self.delay_ms,
            event_tx.clone(),
        );
        let res = sorts::run_algorithm(self.algorithm, &mut st).await;

        // Dropping the JoinHandle would not stop the listener task; abort it so
        // it doesn't sit on control_rx forever after the run ends.
        control_handle.abort();

        match res {
            Ok(()) => {
                st.finish();
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                let (comparisons, swaps) = (st.comparisons, st.swaps);
                Ok(RunOutcome::Completed(RunSummary {
                    algorithm: self.algorithm,
                    values: st.into_values(),
                    comparisons,
                    swaps,
                    elapsed_ms,
                }))
            }
            // Cancellation is a clean exit; the partially sorted array is about
            // to be discarded by the caller.
            Err(_) => Ok(RunOutcome::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn spawn_engine(
        algorithm: Algorithm,
        values: Vec<i32>,
        delay_ms: u64,
    ) -> (
        tokio::task::JoinHandle<Result<RunOutcome>>,
        mpsc::UnboundedReceiver<SessionEvent>,
        mpsc::UnboundedSender<EngineControl>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
        let engine = AnimationEngine::new(algorithm, values, Arc::new(AtomicU64::new(delay_ms)));
        let handle = tokio::spawn(async move { engine.run(event_tx, ctrl_rx).await });
        (handle, event_rx, ctrl_tx)
    }

    #[tokio::test]
    async fn completed_run_reports_elapsed_and_sorted_values() {
        let (handle, _rx, _ctrl) = spawn_engine(Algorithm::Insertion, vec![9, 3, 7, 1], 0);
        match handle.await.unwrap().unwrap() {
            RunOutcome::Completed(summary) => {
                assert_eq!(summary.values, vec![1, 3, 7, 9]);
                assert!(summary.elapsed_ms >= 0.0);
            }
            RunOutcome::Cancelled => panic!("run should complete"),
        }
    }

    #[tokio::test]
    async fn final_frame_has_cleared_highlights() {
        let (handle, mut rx, _ctrl) = spawn_engine(Algorithm::Bubble, vec![2, 1], 0);
        handle.await.unwrap().unwrap();

        let mut last_frame = None;
        while let Ok(ev) = rx.try_recv() {
            if let SessionEvent::Frame(snap) = ev {
                last_frame = Some(snap);
            }
        }
        let snap = last_frame.expect("at least one frame");
        assert_eq!(snap.primary, None);
        assert_eq!(snap.secondary, None);
        assert_eq!(snap.values, vec![1, 2]);
    }

    #[tokio::test]
    async fn pause_then_cancel_stops_within_the_poll_bound() {
        // Long per-step delay so the run would take seconds if not cancelled.
        let values: Vec<i32> = (0..100).rev().collect();
        let (handle, _rx, ctrl) = spawn_engine(Algorithm::Bubble, values, 90);

        tokio::time::sleep(Duration::from_millis(20)).await;
        ctrl.send(EngineControl::Pause(true)).unwrap();
        ctrl.send(EngineControl::Cancel).unwrap();

        // One step delay + one pause poll interval, with headroom.
        let outcome = tokio::time::timeout(Duration::from_millis(500), handle)
            .await
            .expect("cancel must be observed within one polling interval")
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Cancelled));
    }

    #[tokio::test]
    async fn no_frames_are_emitted_after_cancellation() {
        let values: Vec<i32> = (0..50).rev().collect();
        let (handle, mut rx, ctrl) = spawn_engine(Algorithm::Selection, values, 30);

        tokio::time::sleep(Duration::from_millis(50)).await;
        ctrl.send(EngineControl::Cancel).unwrap();
        handle.await.unwrap().unwrap();

        // Drain everything the worker produced; nothing may arrive afterwards.
        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(rx.try_recv().is_err());
    }
}
