//! Capture session: turns raw hook events into committed task steps.
//!
//! The session never touches the OS. Raw events arrive from whatever
//! listener the platform layer installs (or straight from a test), already
//! stamped with a monotonic millisecond clock; the session pairs downs with
//! ups, maps them to client space, classifies, and appends to the task.

use crate::{classify, ActionStep, AutomationTask, Point};
use tracing::{debug, info};

/// Screen-to-client conversion boundary. Implemented by the platform layer
/// for a bound input window; `None` means "discard this event".
pub trait PointMapper {
    fn screen_to_client(&self, point: Point) -> Option<Point>;
}

/// A raw mouse event from the global listener, screen coordinates.
#[derive(Debug, Clone, Copy)]
pub struct RawMouseEvent {
    /// Milliseconds since the listener was installed. Monotonic within a
    /// session.
    pub timestamp_ms: u64,
    pub kind: RawMouseKind,
}

#[derive(Debug, Clone, Copy)]
pub enum RawMouseKind {
    /// Left button pressed at a screen point.
    Down { x: i32, y: i32 },
    /// Left button released at a screen point.
    Up { x: i32, y: i32 },
}

/// State of the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No listener feeding us; events are ignored.
    #[default]
    Idle,
    /// Listener active, pairing downs with ups.
    Armed,
}

/// Notifications for an observing presentation layer.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    StateChanged {
        old: SessionState,
        new: SessionState,
    },
    /// A step was appended to the task.
    StepRecorded { index: usize, step: ActionStep },
}

#[derive(Debug, Clone, Copy)]
struct PendingDown {
    point: Point,
    timestamp_ms: u64,
}

/// Pairs raw down/up events into steps and appends them to a task.
pub struct CaptureSession<M: PointMapper> {
    mapper: M,
    state: SessionState,
    pending_down: Option<PendingDown>,
    last_action_end_ms: u64,
}

impl<M: PointMapper> CaptureSession<M> {
    pub fn new(mapper: M) -> Self {
        Self {
            mapper,
            state: SessionState::Idle,
            pending_down: None,
            last_action_end_ms: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Arm the session. `now_ms` (the listener clock at arm time) seeds the
    /// previous-action-end clock so the first step's delay is measured from
    /// here. No-op while already armed.
    pub fn arm(&mut self, now_ms: u64) -> Option<CaptureEvent> {
        if self.state == SessionState::Armed {
            return None;
        }
        let old = self.state;
        self.state = SessionState::Armed;
        self.pending_down = None;
        self.last_action_end_ms = now_ms;

        info!(now_ms, "capture session armed");
        Some(CaptureEvent::StateChanged {
            old,
            new: self.state,
        })
    }

    /// Disarm the session. Always safe, idempotent.
    pub fn disarm(&mut self) -> Option<CaptureEvent> {
        if self.state == SessionState::Idle {
            return None;
        }
        let old = self.state;
        self.state = SessionState::Idle;
        self.pending_down = None;

        info!("capture session disarmed");
        Some(CaptureEvent::StateChanged {
            old,
            new: self.state,
        })
    }

    /// Feed one raw event. Appends to `task` when a down/up pair completes;
    /// returns the resulting notification, if any.
    pub fn handle_event(
        &mut self,
        event: RawMouseEvent,
        task: &mut AutomationTask,
    ) -> Option<CaptureEvent> {
        if self.state != SessionState::Armed {
            return None;
        }

        match event.kind {
            RawMouseKind::Down { x, y } => {
                self.pending_down = Some(PendingDown {
                    point: Point::new(x, y),
                    timestamp_ms: event.timestamp_ms,
                });
                None
            }
            RawMouseKind::Up { x, y } => {
                // Up without a preceding down is spurious hardware noise.
                let down = self.pending_down.take()?;
                self.commit_pair(down, Point::new(x, y), event.timestamp_ms, task)
            }
        }
    }

    fn commit_pair(
        &mut self,
        down: PendingDown,
        up: Point,
        up_ms: u64,
        task: &mut AutomationTask,
    ) -> Option<CaptureEvent> {
        let (Some(client_down), Some(client_up)) = (
            self.mapper.screen_to_client(down.point),
            self.mapper.screen_to_client(up),
        ) else {
            debug!(down = ?down.point, up = ?up, "screen-to-client mapping failed, discarding gesture");
            return None;
        };

        let step = classify(
            client_down,
            client_up,
            down.timestamp_ms,
            up_ms,
            self.last_action_end_ms,
        );
        self.last_action_end_ms = up_ms;

        debug!(kind = ?step.kind, delay_ms = step.delay_ms, duration_ms = step.duration_ms,
               "recorded step");
        task.steps.push(step.clone());

        Some(CaptureEvent::StepRecorded {
            index: task.steps.len() - 1,
            step,
        })
    }
}
