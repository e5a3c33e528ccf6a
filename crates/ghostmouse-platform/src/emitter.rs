//! Synthetic input emission: posted window messages, never the real cursor.
//!
//! Every emission is fire-and-forget at the message level; the emitter only
//! waits out its own settle delays. Whether the receiving window honors
//! posted input is outside our control.

use crate::WindowBinding;
use ghostmouse_core::{
    drag_waypoints, segment_delay_ms, CancelToken, GestureEmitter, Point, DRAG_SEGMENTS,
    MIN_SEGMENT_DELAY_MS,
};
use std::thread;
use std::time::Duration;
use tracing::{debug, trace};

// Mouse message constants per the Win32 wire protocol.
const WM_MOUSEMOVE: u32 = 0x0200;
const WM_LBUTTONDOWN: u32 = 0x0201;
const WM_LBUTTONUP: u32 = 0x0202;
const MK_LBUTTON: usize = 0x0001;

/// Settle after the positioning move, before pressing.
pub const MOVE_SETTLE_MS: u64 = 15;
/// Settle between press and release of a click.
pub const PRESS_SETTLE_MS: u64 = 50;

/// Pack client coordinates into a mouse-message lParam: low word x, high
/// word y.
fn make_lparam(point: Point) -> isize {
    ((point.y as isize & 0xFFFF) << 16) | (point.x as isize & 0xFFFF)
}

/// Outbound sink for a single posted mouse message. The production
/// implementation is a `PostMessageW` call against the bound input window;
/// tests substitute an in-memory recorder to observe emission order.
pub trait MessagePoster: Send {
    fn post(&self, msg: u32, wparam: usize, lparam: isize);
}

/// Posts messages to a bound input window, fire-and-forget.
#[derive(Debug, Clone, Copy)]
pub struct WindowPoster {
    input: usize,
}

impl WindowPoster {
    pub fn new(binding: &WindowBinding) -> Self {
        Self {
            input: binding.input,
        }
    }
}

impl MessagePoster for WindowPoster {
    fn post(&self, msg: u32, wparam: usize, lparam: isize) {
        trace!(msg, wparam, lparam, "posting mouse message");

        #[cfg(windows)]
        unsafe {
            use windows_sys::Win32::Foundation::HWND;
            use windows_sys::Win32::UI::WindowsAndMessaging::PostMessageW;

            // Fire-and-forget: the return value is deliberately not consulted.
            PostMessageW(self.input as HWND, msg, wparam, lparam);
        }
        #[cfg(not(windows))]
        {
            let _ = (msg, wparam, lparam);
        }
    }
}

/// Emits synthetic click and drag sequences through a message sink.
#[derive(Debug, Clone, Copy)]
pub struct MessageEmitter<P: MessagePoster = WindowPoster> {
    poster: P,
}

impl MessageEmitter<WindowPoster> {
    pub fn new(binding: &WindowBinding) -> Self {
        Self {
            poster: WindowPoster::new(binding),
        }
    }
}

impl<P: MessagePoster> MessageEmitter<P> {
    pub fn with_poster(poster: P) -> Self {
        Self { poster }
    }

    fn post(&self, msg: u32, wparam: usize, at: Point) {
        self.poster.post(msg, wparam, make_lparam(at));
    }
}

impl<P: MessagePoster> GestureEmitter for MessageEmitter<P> {
    fn click(&mut self, at: Point) -> Result<(), String> {
        debug!(x = at.x, y = at.y, "emitting click");

        self.post(WM_MOUSEMOVE, 0, at);
        thread::sleep(Duration::from_millis(MOVE_SETTLE_MS));
        self.post(WM_LBUTTONDOWN, MK_LBUTTON, at);
        thread::sleep(Duration::from_millis(PRESS_SETTLE_MS));
        self.post(WM_LBUTTONUP, 0, at);
        Ok(())
    }

    fn drag(
        &mut self,
        from: Point,
        to: Point,
        duration_ms: u64,
        cancel: &CancelToken,
    ) -> Result<(), String> {
        debug!(?from, ?to, duration_ms, "emitting drag");

        self.post(WM_MOUSEMOVE, 0, from);
        thread::sleep(Duration::from_millis(MOVE_SETTLE_MS));
        self.post(WM_LBUTTONDOWN, MK_LBUTTON, from);

        let pause = segment_delay_ms(duration_ms, DRAG_SEGMENTS, MIN_SEGMENT_DELAY_MS);
        for waypoint in drag_waypoints(from, to, DRAG_SEGMENTS) {
            self.post(WM_MOUSEMOVE, MK_LBUTTON, waypoint);
            if !cancel.sleep_ms(pause) {
                // Cut short, but never leave the synthetic press dangling.
                debug!("drag cancelled mid-motion, releasing at end point");
                break;
            }
        }

        self.post(WM_LBUTTONUP, 0, to);
        Ok(())
    }
}
