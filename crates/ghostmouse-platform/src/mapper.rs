//! Screen-to-client coordinate mapping for a bound input window.

use crate::WindowBinding;
use ghostmouse_core::{Point, PointMapper};

/// Maps screen points into the input window's client area via Win32
/// `ScreenToClient`. A failed conversion yields `None`; the capture session
/// discards that event and keeps running.
#[derive(Debug, Clone, Copy)]
pub struct ClientMapper {
    input: usize,
}

impl ClientMapper {
    pub fn new(binding: &WindowBinding) -> Self {
        Self {
            input: binding.input,
        }
    }
}

impl PointMapper for ClientMapper {
    #[cfg(windows)]
    fn screen_to_client(&self, point: Point) -> Option<Point> {
        use windows_sys::Win32::Foundation::{HWND, POINT};
        use windows_sys::Win32::Graphics::Gdi::ScreenToClient;

        if self.input == 0 {
            return None;
        }

        let mut pt = POINT {
            x: point.x,
            y: point.y,
        };
        let ok = unsafe { ScreenToClient(self.input as HWND, &mut pt) };
        if ok == 0 {
            return None;
        }
        Some(Point::new(pt.x, pt.y))
    }

    #[cfg(not(windows))]
    fn screen_to_client(&self, _point: Point) -> Option<Point> {
        None
    }
}
