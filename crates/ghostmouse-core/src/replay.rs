//! Replay scheduler: drives recorded steps through a gesture emitter.

use crate::{ActionStep, AutomationTask, CancelToken, GestureKind, Point};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Outbound boundary of the scheduler: something that can perform a click or
/// a drag. Implemented by the platform layer as fire-and-forget message
/// posting; tests substitute an in-memory recorder.
///
/// Drag receives the cancel token so its per-segment waits stay cancellable;
/// an implementation must still release the button when cut short so no
/// synthetic press outlives the current step.
pub trait GestureEmitter: Send {
    fn click(&mut self, at: Point) -> Result<(), String>;
    fn drag(
        &mut self,
        from: Point,
        to: Point,
        duration_ms: u64,
        cancel: &CancelToken,
    ) -> Result<(), String>;
}

/// How many times to run the step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Once,
    Forever,
}

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    pub repeat: Repeat,
    /// Wait between cycles when looping.
    pub loop_gap_ms: u64,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            repeat: Repeat::Once,
            loop_gap_ms: 1000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("task has no steps to run")]
    EmptyTask,
    #[error("a replay run is already active")]
    AlreadyRunning,
}

/// Progress events emitted by the replay thread.
#[derive(Debug, Clone)]
pub enum ReplayEvent {
    StepStarting { index: usize, step: ActionStep },
    /// The step's emission succeeded. A failed step reports `Error` instead.
    StepCompleted { index: usize },
    CycleCompleted { cycle: u32 },
    /// Single (non-looping) run finished normally.
    Finished,
    /// Cancellation observed; no further steps were emitted.
    Cancelled,
    /// A step's emission failed; no `StepCompleted` is reported for it and
    /// the run continues with the next step.
    Error { index: usize, message: String },
}

/// Handle to a running replay.
pub struct ReplayHandle {
    event_rx: Receiver<ReplayEvent>,
    cancel: CancelToken,
    active: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ReplayHandle {
    /// Request a cooperative stop. The current step may still complete.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Try to receive a progress event (non-blocking).
    pub fn try_recv(&self) -> Option<ReplayEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive all pending progress events.
    pub fn drain(&self) -> Vec<ReplayEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Wait for the replay thread to finish.
    pub fn join(mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// Cancel and wait for the thread to exit.
    pub fn shutdown(self) {
        self.cancel();
        self.join();
    }
}

/// Flips the shared "a run is active" flag back on every exit path,
/// panics included.
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Starts replay runs and enforces that at most one is active at a time.
#[derive(Default)]
pub struct Replayer {
    active: Arc<AtomicBool>,
}

impl Replayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start replaying `task` on a background thread.
    ///
    /// The scheduler operates on a snapshot of the step list taken here, so
    /// concurrent capture appends cannot shift a run mid-cycle. An empty
    /// task is rejected before any emission.
    pub fn start<E>(
        &self,
        task: &AutomationTask,
        options: ReplayOptions,
        emitter: E,
    ) -> Result<ReplayHandle, ReplayError>
    where
        E: GestureEmitter + 'static,
    {
        if task.is_empty() {
            return Err(ReplayError::EmptyTask);
        }
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ReplayError::AlreadyRunning);
        }

        let steps = task.steps.clone();
        let cancel = CancelToken::new();
        let (event_tx, event_rx) = bounded(256);

        info!(
            steps = steps.len(),
            repeat = ?options.repeat,
            loop_gap_ms = options.loop_gap_ms,
            "replay starting"
        );

        let guard = ActiveGuard(self.active.clone());
        let thread_cancel = cancel.clone();
        let thread = thread::spawn(move || {
            let _guard = guard;
            run_cycles(&steps, options, emitter, &thread_cancel, &event_tx);
        });

        Ok(ReplayHandle {
            event_rx,
            cancel,
            active: self.active.clone(),
            thread: Some(thread),
        })
    }
}

fn run_cycles<E: GestureEmitter>(
    steps: &[ActionStep],
    options: ReplayOptions,
    mut emitter: E,
    cancel: &CancelToken,
    event_tx: &Sender<ReplayEvent>,
) {
    let mut cycle = 0u32;

    loop {
        cycle += 1;

        for (index, step) in steps.iter().enumerate() {
            if !cancel.sleep_ms(step.delay_ms) {
                emit(event_tx, ReplayEvent::Cancelled);
                info!(cycle, index, "replay cancelled during pre-step delay");
                return;
            }

            emit(
                event_tx,
                ReplayEvent::StepStarting {
                    index,
                    step: step.clone(),
                },
            );

            let result = match step.kind {
                GestureKind::Click => emitter.click(step.start()),
                GestureKind::Drag => {
                    emitter.drag(step.start(), step.end(), step.duration_ms, cancel)
                }
            };
            match result {
                Ok(()) => emit(event_tx, ReplayEvent::StepCompleted { index }),
                Err(message) => {
                    error!(index, %message, "gesture emission failed");
                    emit(event_tx, ReplayEvent::Error { index, message });
                }
            }

            if cancel.is_cancelled() {
                emit(event_tx, ReplayEvent::Cancelled);
                info!(cycle, index, "replay cancelled after step");
                return;
            }
        }

        emit(event_tx, ReplayEvent::CycleCompleted { cycle });
        debug!(cycle, "replay cycle completed");

        match options.repeat {
            Repeat::Once => {
                emit(event_tx, ReplayEvent::Finished);
                info!("replay finished");
                return;
            }
            Repeat::Forever => {
                if !cancel.sleep_ms(options.loop_gap_ms) {
                    emit(event_tx, ReplayEvent::Cancelled);
                    info!(cycle, "replay cancelled during loop gap");
                    return;
                }
            }
        }
    }
}

fn emit(event_tx: &Sender<ReplayEvent>, event: ReplayEvent) {
    if let Err(e) = event_tx.try_send(event) {
        warn!("failed to emit replay event: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Emission {
        Click(Point),
        Drag(Point, Point),
    }

    /// Records every emission with a timestamp; no real message posting.
    #[derive(Clone, Default)]
    struct RecordingEmitter {
        log: Arc<Mutex<Vec<(Instant, Emission)>>>,
    }

    impl RecordingEmitter {
        fn emissions(&self) -> Vec<Emission> {
            self.log.lock().unwrap().iter().map(|(_, e)| *e).collect()
        }

        fn count(&self) -> usize {
            self.log.lock().unwrap().len()
        }
    }

    impl GestureEmitter for RecordingEmitter {
        fn click(&mut self, at: Point) -> Result<(), String> {
            self.log
                .lock()
                .unwrap()
                .push((Instant::now(), Emission::Click(at)));
            Ok(())
        }

        fn drag(
            &mut self,
            from: Point,
            to: Point,
            _duration_ms: u64,
            _cancel: &CancelToken,
        ) -> Result<(), String> {
            self.log
                .lock()
                .unwrap()
                .push((Instant::now(), Emission::Drag(from, to)));
            Ok(())
        }
    }

    fn click_step(delay_ms: u64, x: i32, y: i32) -> ActionStep {
        ActionStep {
            kind: GestureKind::Click,
            start_x: x,
            start_y: y,
            end_x: x,
            end_y: y,
            duration_ms: 0,
            delay_ms,
            description: "click".into(),
            timestamp: None,
        }
    }

    fn drag_step(delay_ms: u64, from: (i32, i32), to: (i32, i32), duration_ms: u64) -> ActionStep {
        ActionStep {
            kind: GestureKind::Drag,
            start_x: from.0,
            start_y: from.1,
            end_x: to.0,
            end_y: to.1,
            duration_ms,
            delay_ms,
            description: "drag".into(),
            timestamp: None,
        }
    }

    fn task_with(steps: Vec<ActionStep>) -> AutomationTask {
        AutomationTask {
            name: "test".into(),
            steps,
        }
    }

    #[test]
    fn empty_task_is_rejected_before_any_emission() {
        let replayer = Replayer::new();
        let result = replayer.start(
            &AutomationTask::default(),
            ReplayOptions::default(),
            RecordingEmitter::default(),
        );
        assert!(matches!(result, Err(ReplayError::EmptyTask)));
        assert!(!replayer.is_running());
    }

    #[test]
    fn single_run_preserves_step_order_and_delays() {
        let task = task_with(vec![
            click_step(100, 10, 10),
            drag_step(200, (10, 10), (50, 50), 120),
        ]);
        let emitter = RecordingEmitter::default();
        let probe = emitter.clone();

        let replayer = Replayer::new();
        let start = Instant::now();
        let handle = replayer
            .start(&task, ReplayOptions::default(), emitter)
            .unwrap();
        handle.join();

        let log = probe.log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].1, Emission::Click(Point::new(10, 10)));
        assert_eq!(
            log[1].1,
            Emission::Drag(Point::new(10, 10), Point::new(50, 50))
        );
        // S1 waits its own delay, S2 never starts before S1 completed plus
        // S2's delay.
        assert!(log[0].0.duration_since(start) >= Duration::from_millis(100));
        assert!(log[1].0.duration_since(log[0].0) >= Duration::from_millis(200));
        assert!(!replayer.is_running());
    }

    #[test]
    fn second_start_while_active_is_refused() {
        let task = task_with(vec![click_step(400, 0, 0)]);
        let replayer = Replayer::new();

        let handle = replayer
            .start(&task, ReplayOptions::default(), RecordingEmitter::default())
            .unwrap();
        let second = replayer.start(&task, ReplayOptions::default(), RecordingEmitter::default());
        assert!(matches!(second, Err(ReplayError::AlreadyRunning)));

        handle.join();
        // After the run drains, a new start is accepted again.
        let handle = replayer
            .start(&task, ReplayOptions::default(), RecordingEmitter::default())
            .unwrap();
        handle.join();
    }

    #[test]
    fn zero_gap_loop_repeats_full_cycles_until_cancelled() {
        let task = task_with(vec![click_step(0, 1, 1), click_step(0, 2, 2)]);
        let emitter = RecordingEmitter::default();
        let probe = emitter.clone();

        let replayer = Replayer::new();
        let handle = replayer
            .start(
                &task,
                ReplayOptions {
                    repeat: Repeat::Forever,
                    loop_gap_ms: 0,
                },
                emitter,
            )
            .unwrap();

        // Let a few cycles run, then stop.
        while probe.count() < 6 {
            thread::sleep(Duration::from_millis(5));
        }
        handle.shutdown();

        let emissions = probe.emissions();
        assert!(emissions.len() >= 6);
        // Steps alternate in order within every cycle, never skipped.
        for pair in emissions.chunks(2) {
            if pair.len() == 2 {
                assert_eq!(pair[0], Emission::Click(Point::new(1, 1)));
                assert_eq!(pair[1], Emission::Click(Point::new(2, 2)));
            }
        }
    }

    #[test]
    fn cancel_stops_before_the_next_delay_elapses() {
        let task = task_with(vec![click_step(0, 1, 1), click_step(5_000, 2, 2)]);
        let emitter = RecordingEmitter::default();
        let probe = emitter.clone();

        let replayer = Replayer::new();
        let start = Instant::now();
        let handle = replayer
            .start(&task, ReplayOptions::default(), emitter)
            .unwrap();

        while probe.count() < 1 {
            thread::sleep(Duration::from_millis(5));
        }
        handle.cancel();
        handle.join();

        // The second step's 5s delay must not have been waited out, and the
        // step itself never emitted.
        assert!(start.elapsed() < Duration::from_secs(3));
        assert_eq!(probe.count(), 1);
        assert!(!replayer.is_running());
    }

    #[test]
    fn emitter_failure_reports_an_event_and_continues() {
        struct FailingEmitter {
            inner: RecordingEmitter,
        }

        impl GestureEmitter for FailingEmitter {
            fn click(&mut self, _at: Point) -> Result<(), String> {
                Err("post failed".into())
            }

            fn drag(
                &mut self,
                from: Point,
                to: Point,
                duration_ms: u64,
                cancel: &CancelToken,
            ) -> Result<(), String> {
                self.inner.drag(from, to, duration_ms, cancel)
            }
        }

        let task = task_with(vec![
            click_step(0, 1, 1),
            drag_step(0, (0, 0), (9, 9), 0),
        ]);
        let probe = RecordingEmitter::default();
        let emitter = FailingEmitter {
            inner: probe.clone(),
        };

        let replayer = Replayer::new();
        let handle = replayer
            .start(&task, ReplayOptions::default(), emitter)
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        let events = handle.drain();
        handle.join();

        assert!(events
            .iter()
            .any(|e| matches!(e, ReplayEvent::Error { index: 0, .. })));
        // The failed step reports only the error, never a completion.
        assert!(!events
            .iter()
            .any(|e| matches!(e, ReplayEvent::StepCompleted { index: 0 })));
        assert!(events
            .iter()
            .any(|e| matches!(e, ReplayEvent::StepCompleted { index: 1 })));
        // The drag after the failing click still ran.
        assert_eq!(probe.count(), 1);
    }

    #[test]
    fn snapshot_insulates_a_run_from_later_task_mutation() {
        let mut task = task_with(vec![click_step(100, 1, 1)]);
        let emitter = RecordingEmitter::default();
        let probe = emitter.clone();

        let replayer = Replayer::new();
        let handle = replayer
            .start(&task, ReplayOptions::default(), emitter)
            .unwrap();

        // Mutating the task mid-run must not affect the active cycle.
        task.steps.push(click_step(0, 9, 9));
        task.clear();

        handle.join();
        assert_eq!(probe.emissions(), vec![Emission::Click(Point::new(1, 1))]);
    }
}
