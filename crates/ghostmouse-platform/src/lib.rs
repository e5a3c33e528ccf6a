//! ghostmouse-platform: OS I/O boundary for ghostmouse.
//!
//! This crate provides:
//! - Window binding (title lookup + child render/input handle)
//! - Screen-to-client coordinate mapping
//! - Global low-level mouse listener for recording
//! - Synthetic input emission via posted window messages
//! - The recording controller tying listener + capture session together
//!
//! All Win32 calls are gated behind `cfg(windows)`; other targets get inert
//! fallbacks so the domain logic stays testable everywhere.

mod capture;
mod emitter;
mod error;
mod listener;
mod mapper;
mod window;

pub use capture::Recording;
pub use emitter::{MessageEmitter, MessagePoster, WindowPoster, MOVE_SETTLE_MS, PRESS_SETTLE_MS};
pub use error::{PlatformError, PlatformResult};
pub use listener::{install_mouse_listener, MouseListenerHandle};
pub use mapper::ClientMapper;
pub use window::{
    bind_window, find_window_by_title, list_windows, WindowBinding, WindowHandle, WindowInfo,
    FALLBACK_RENDER_CLASS, PRIMARY_RENDER_CLASS,
};
