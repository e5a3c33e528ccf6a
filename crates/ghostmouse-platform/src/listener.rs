//! Global low-level mouse listener for recording.
//!
//! On Windows a dedicated thread installs a WH_MOUSE_LL hook and pumps its
//! message loop; the hook callback does minimal work (timestamp + point into
//! a bounded channel) and the controller drains the channel on its own
//! thread. Other targets get an inert listener that produces no events.

use crate::{PlatformError, PlatformResult};
use crossbeam_channel::{bounded, Receiver, Sender};
use ghostmouse_core::RawMouseEvent;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::info;

/// Handle to the mouse listener. Dropping it signals the hook thread to
/// unhook and exit, so the system-wide hook is released on every exit path.
pub struct MouseListenerHandle {
    event_rx: Receiver<RawMouseEvent>,
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl MouseListenerHandle {
    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Option<RawMouseEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive all pending events.
    pub fn drain(&self) -> Vec<RawMouseEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Signal the hook thread to unhook and exit. Idempotent.
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }

    /// Check if the hook thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map_or(false, |t| !t.is_finished())
    }
}

impl Drop for MouseListenerHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// How long to wait for the hook thread to report install success.
const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Install the global mouse listener.
///
/// Blocks until the hook thread reports whether installation succeeded, so a
/// denied hook surfaces here as [`PlatformError::HookInstall`] instead of a
/// session that silently believes it is armed.
pub fn install_mouse_listener() -> PlatformResult<MouseListenerHandle> {
    let (event_tx, event_rx) = bounded(1024);
    let (stop_tx, stop_rx) = bounded(1);
    let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);

    let thread = thread::spawn(move || {
        imp::run_hook_thread(event_tx, stop_rx, ready_tx);
    });

    let thread = await_install(thread, &ready_rx, &stop_tx, READY_TIMEOUT)?;
    info!("mouse listener installed");
    Ok(MouseListenerHandle {
        event_rx,
        stop_tx,
        thread: Some(thread),
    })
}

/// Wait for the hook thread's readiness report. On any failure the thread is
/// reclaimed before the error is returned, never detached.
fn await_install(
    thread: JoinHandle<()>,
    ready_rx: &Receiver<Result<(), String>>,
    stop_tx: &Sender<()>,
    timeout: Duration,
) -> PlatformResult<JoinHandle<()>> {
    match ready_rx.recv_timeout(timeout) {
        Ok(Ok(())) => Ok(thread),
        Ok(Err(message)) => {
            let _ = thread.join();
            Err(PlatformError::HookInstall(message))
        }
        Err(_) => {
            // A late installer still sees the stop signal and unwinds.
            let _ = stop_tx.try_send(());
            let _ = thread.join();
            Err(PlatformError::HookInstall(
                "hook thread did not report readiness".into(),
            ))
        }
    }
}

#[cfg(windows)]
mod imp {
    use crossbeam_channel::{Receiver, Sender};
    use ghostmouse_core::{RawMouseEvent, RawMouseKind};
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;
    use tracing::{debug, error, info};
    use windows_sys::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
    use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows_sys::Win32::System::Threading::GetCurrentThreadId;
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, DispatchMessageW, GetMessageW, PostThreadMessageW, SetWindowsHookExW,
        TranslateMessage, UnhookWindowsHookEx, MSG, MSLLHOOKSTRUCT, WH_MOUSE_LL, WM_LBUTTONDOWN,
        WM_LBUTTONUP, WM_QUIT,
    };

    // Thread ID for posting the quit message from the stop monitor.
    static HOOK_THREAD_ID: AtomicU32 = AtomicU32::new(0);

    thread_local! {
        static EVENT_SENDER: RefCell<Option<Sender<RawMouseEvent>>> = const { RefCell::new(None) };
        static START_TIME: RefCell<Option<Instant>> = const { RefCell::new(None) };
    }

    pub fn run_hook_thread(
        event_tx: Sender<RawMouseEvent>,
        stop_rx: Receiver<()>,
        ready_tx: Sender<Result<(), String>>,
    ) {
        info!("mouse hook thread started");

        let thread_id = unsafe { GetCurrentThreadId() };
        HOOK_THREAD_ID.store(thread_id, Ordering::SeqCst);

        EVENT_SENDER.with(|sender| {
            *sender.borrow_mut() = Some(event_tx);
        });
        START_TIME.with(|time| {
            *time.borrow_mut() = Some(Instant::now());
        });

        let hook = unsafe {
            SetWindowsHookExW(
                WH_MOUSE_LL,
                Some(mouse_hook_proc),
                GetModuleHandleW(std::ptr::null()),
                0,
            )
        };
        if hook.is_null() {
            error!("SetWindowsHookExW(WH_MOUSE_LL) failed");
            HOOK_THREAD_ID.store(0, Ordering::SeqCst);
            let _ = ready_tx.send(Err("SetWindowsHookExW(WH_MOUSE_LL) failed".into()));
            return;
        }
        debug!("mouse hook installed");
        let _ = ready_tx.send(Ok(()));

        // Monitor the stop signal and break the message loop with WM_QUIT.
        let stop_thread = std::thread::spawn(move || loop {
            if stop_rx
                .recv_timeout(std::time::Duration::from_millis(50))
                .is_ok()
            {
                let tid = HOOK_THREAD_ID.load(Ordering::SeqCst);
                if tid != 0 {
                    unsafe { PostThreadMessageW(tid, WM_QUIT, 0, 0) };
                }
                break;
            }
            if HOOK_THREAD_ID.load(Ordering::SeqCst) == 0 {
                break;
            }
        });

        // A low-level hook only fires while its thread pumps messages.
        let mut msg: MSG = unsafe { std::mem::zeroed() };
        loop {
            let ret = unsafe { GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0) };
            if ret <= 0 {
                break;
            }
            unsafe {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }

        unsafe {
            UnhookWindowsHookEx(hook);
        }
        HOOK_THREAD_ID.store(0, Ordering::SeqCst);
        let _ = stop_thread.join();

        info!("mouse hook thread exiting");
    }

    /// Low-level mouse hook procedure. Runs in the hook context; must stay
    /// minimal and non-blocking.
    unsafe extern "system" fn mouse_hook_proc(
        code: i32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        if code >= 0 {
            let ms = &*(lparam as *const MSLLHOOKSTRUCT);
            let (x, y) = (ms.pt.x, ms.pt.y);

            let kind = match wparam as u32 {
                WM_LBUTTONDOWN => Some(RawMouseKind::Down { x, y }),
                WM_LBUTTONUP => Some(RawMouseKind::Up { x, y }),
                _ => None,
            };

            if let Some(kind) = kind {
                send_event(kind);
            }
        }

        CallNextHookEx(std::ptr::null_mut(), code, wparam, lparam)
    }

    fn send_event(kind: RawMouseKind) {
        let timestamp_ms = START_TIME.with(|time| {
            time.borrow()
                .as_ref()
                .map(|t| t.elapsed().as_millis() as u64)
                .unwrap_or(0)
        });

        EVENT_SENDER.with(|sender| {
            if let Some(ref tx) = *sender.borrow() {
                let _ = tx.try_send(RawMouseEvent { timestamp_ms, kind });
            }
        });
    }
}

#[cfg(not(windows))]
mod imp {
    use crossbeam_channel::{Receiver, Sender};
    use ghostmouse_core::RawMouseEvent;
    use tracing::info;

    /// Inert listener for non-Windows targets: reports ready, produces no
    /// events, exits on the stop signal.
    pub fn run_hook_thread(
        _event_tx: Sender<RawMouseEvent>,
        stop_rx: Receiver<()>,
        ready_tx: Sender<Result<(), String>>,
    ) {
        info!("mouse listener running as inert stub on this platform");
        let _ = ready_tx.send(Ok(()));
        let _ = stop_rx.recv();
    }
}
