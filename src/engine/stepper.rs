use crate::model::{Cancelled, SessionEvent, Snapshot};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Pause is observed by polling; keeps pause/cancel responsiveness within one
/// interval even when the step delay is long.
pub(crate) const PAUSE_POLL_MS: u64 = 50;

/// How long a step suspends the worker after its frame is emitted.
///
/// Swaps get the full delay, pure comparisons half, tail copies a third, so
/// "busy" steps read visually slower than "passive" ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepKind {
    Swap,
    Compare,
    Copy,
}

/// Single chokepoint every instrumented algorithm runs through.
///
/// Owns the working vector and the highlight indices; algorithms mutate the
/// values directly and call `checkpoint`/`mark`/`step` at each observable
/// boundary.
pub(crate) struct Stepper {
    pub(crate) values: Vec<i32>,
    primary: Option<usize>,
    secondary: Option<usize>,
    paused: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    delay_ms: Arc<AtomicU64>,
    event_tx: UnboundedSender<SessionEvent>,
    pub(crate) comparisons: u64,
    pub(crate) swaps: u64,
}

impl Stepper {
    pub(crate) fn new(
        values: Vec<i32>,
        paused: Arc<AtomicBool>,
        cancel: Arc<AtomicBool>,
        delay_ms: Arc<AtomicU64>,
        event_tx: UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            values,
            primary: None,
            secondary: None,
            paused,
            cancel,
            delay_ms,
            event_tx,
            comparisons: 0,
            swaps: 0,
        }
    }

    /// Observe pause/cancel at a step boundary.
    ///
    /// Blocks (cooperatively) while paused, returns `Err(Cancelled)` once
    /// cancellation is requested. No mutating step happens after this errors.
    pub(crate) async fn checkpoint(&self) -> Result<(), Cancelled> {
        while self.paused.load(Ordering::Relaxed) && !self.cancel.load(Ordering::Relaxed) {
            tokio::time::sleep(Duration::from_millis(PAUSE_POLL_MS)).await;
        }
        if self.cancel.load(Ordering::Relaxed) {
            return Err(Cancelled);
        }
        Ok(())
    }

    /// Set the highlighted indices carried by the next frames.
    pub(crate) fn mark(&mut self, primary: Option<usize>, secondary: Option<usize>) {
        self.primary = primary;
        self.secondary = secondary;
    }

    pub(crate) fn swap(&mut self, i: usize, j: usize) {
        self.values.swap(i, j);
        self.swaps += 1;
    }

    /// Emit a frame for the current state, then suspend for the step-kind delay.
    ///
    /// The delay is re-read from the shared atomic on every step so live speed
    /// changes take effect immediately.
    pub(crate) async fn step(&mut self, kind: StepKind) {
        let _ = self.event_tx.send(SessionEvent::Frame(self.snapshot()));
        let delay = self.delay_ms.load(Ordering::Relaxed);
        let ms = match kind {
            StepKind::Swap => delay,
            StepKind::Compare => delay / 2,
            StepKind::Copy => delay / 3,
        };
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    /// Emit a final frame with highlights cleared.
    pub(crate) fn finish(&mut self) {
        self.mark(None, None);
        let _ = self.event_tx.send(SessionEvent::Frame(self.snapshot()));
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            values: self.values.clone(),
            primary: self.primary,
            secondary: self.secondary,
        }
    }

    pub(crate) fn into_values(self) -> Vec<i32> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_stepper(
        values: Vec<i32>,
    ) -> (
        Stepper,
        Arc<AtomicBool>,
        Arc<AtomicBool>,
        mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let paused = Arc::new(AtomicBool::new(false));
        let cancel = Arc::new(AtomicBool::new(false));
        let delay = Arc::new(AtomicU64::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let st = Stepper::new(values, paused.clone(), cancel.clone(), delay, tx);
        (st, paused, cancel, rx)
    }

    #[tokio::test]
    async fn checkpoint_passes_when_not_paused() {
        let (st, _, _, _rx) = make_stepper(vec![3, 1, 2]);
        assert!(st.checkpoint().await.is_ok());
    }

    #[tokio::test]
    async fn checkpoint_fails_after_cancel_even_while_paused() {
        let (st, paused, cancel, _rx) = make_stepper(vec![3, 1, 2]);
        paused.store(true, Ordering::Relaxed);
        cancel.store(true, Ordering::Relaxed);
        let res = tokio::time::timeout(Duration::from_millis(500), st.checkpoint()).await;
        assert_eq!(res.expect("checkpoint must return within one poll"), Err(Cancelled));
    }

    #[tokio::test]
    async fn step_emits_a_frame_with_current_marks() {
        let (mut st, _, _, mut rx) = make_stepper(vec![3, 1, 2]);
        st.mark(Some(0), Some(1));
        st.step(StepKind::Compare).await;
        match rx.recv().await {
            Some(SessionEvent::Frame(snap)) => {
                assert_eq!(snap.values, vec![3, 1, 2]);
                assert_eq!(snap.primary, Some(0));
                assert_eq!(snap.secondary, Some(1));
            }
            other => panic!("expected frame, got {other:?}"),
        }
    }
}
