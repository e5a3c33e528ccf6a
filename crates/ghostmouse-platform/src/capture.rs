//! Recording controller: listener lifecycle + capture session wiring.

use crate::{install_mouse_listener, ClientMapper, MouseListenerHandle, PlatformResult, WindowBinding};
use ghostmouse_core::{AutomationTask, CaptureEvent, CaptureSession};

/// An active recording over a bound window.
///
/// The hook thread enqueues raw events; [`Recording::pump`] drains them on
/// the caller's thread and appends classified steps to the task, so the
/// shared step list is only ever mutated from the controlling thread.
pub struct Recording {
    listener: MouseListenerHandle,
    session: CaptureSession<ClientMapper>,
}

impl Recording {
    /// Install the listener and arm a session against `binding`.
    ///
    /// A denied hook propagates as an error; no recording state is left
    /// behind in that case.
    pub fn start(binding: &WindowBinding) -> PlatformResult<Self> {
        let listener = install_mouse_listener()?;
        let mut session = CaptureSession::new(ClientMapper::new(binding));
        // The listener clock starts at install, which is also arm time.
        session.arm(0);
        Ok(Self { listener, session })
    }

    /// Drain pending raw events into `task`. Returns the notifications for
    /// an observing presentation layer, one per committed step.
    pub fn pump(&mut self, task: &mut AutomationTask) -> Vec<CaptureEvent> {
        self.listener
            .drain()
            .into_iter()
            .filter_map(|event| self.session.handle_event(event, task))
            .collect()
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_running()
    }

    /// Disarm and release the global hook.
    pub fn stop(mut self) {
        self.session.disarm();
        self.listener.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind_window;

    #[test]
    fn unbound_title_refuses_to_bind() {
        let result = bind_window("ghostmouse-nonexistent-window-title-20f3a");
        assert!(result.is_err());
    }

    #[test]
    fn recording_starts_and_stops_cleanly() {
        let binding = WindowBinding { target: 0, input: 0 };
        let mut recording = Recording::start(&binding).expect("recording start");
        let mut task = AutomationTask::default();
        assert!(recording.pump(&mut task).is_empty());
        recording.stop();
        assert!(task.is_empty());
    }
}
