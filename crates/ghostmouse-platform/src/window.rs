//! Window binding: resolve an operator-supplied title to the handle that
//! synthetic input is addressed to.
//!
//! The input handle is searched among the target's children by render class
//! name first; windows without a dedicated render child receive input on the
//! top-level handle itself.

use crate::{PlatformError, PlatformResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Opaque window handle (platform-specific identifier).
pub type WindowHandle = usize;

/// Class name of the render child that usually receives input.
pub const PRIMARY_RENDER_CLASS: &str = "TheRender";
/// Fallback render child class name.
pub const FALLBACK_RENDER_CLASS: &str = "RenderWindow";

/// The pair of handles a successful bind yields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowBinding {
    /// The top-level window identified by title.
    pub target: WindowHandle,
    /// The handle synthetic messages are posted to. May equal `target`.
    pub input: WindowHandle,
}

/// Information about a candidate window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
    pub pid: u32,
}

/// Resolve `title` to a target window and its input handle.
///
/// Search order for the input handle: a child of class
/// [`PRIMARY_RENDER_CLASS`], then [`FALLBACK_RENDER_CLASS`], then the target
/// handle itself. Fails with [`PlatformError::WindowNotFound`] when no
/// visible window matches the title; capture and replay refuse to start
/// without a binding.
pub fn bind_window(title: &str) -> PlatformResult<WindowBinding> {
    let target = find_window_by_title(title)
        .ok_or_else(|| PlatformError::WindowNotFound(title.to_string()))?;

    let input = find_child_by_class(target.handle, PRIMARY_RENDER_CLASS)
        .or_else(|| find_child_by_class(target.handle, FALLBACK_RENDER_CLASS))
        .unwrap_or(target.handle);

    info!(target = target.handle, input, title = %target.title, "bound input window");
    Ok(WindowBinding {
        target: target.handle,
        input,
    })
}

/// Find a visible window by title (partial match, case-insensitive).
pub fn find_window_by_title(title: &str) -> Option<WindowInfo> {
    let title_lower = title.to_lowercase();
    let found = list_windows()
        .into_iter()
        .find(|w| w.title.to_lowercase().contains(&title_lower));
    if found.is_none() {
        debug!(title, "no visible window matched");
    }
    found
}

/// List all visible windows with a non-empty title.
pub fn list_windows() -> Vec<WindowInfo> {
    #[cfg(windows)]
    {
        imp::list_windows()
    }
    #[cfg(not(windows))]
    {
        Vec::new()
    }
}

fn find_child_by_class(parent: WindowHandle, class: &str) -> Option<WindowHandle> {
    #[cfg(windows)]
    {
        imp::find_child_by_class(parent, class)
    }
    #[cfg(not(windows))]
    {
        let _ = (parent, class);
        None
    }
}

#[cfg(windows)]
mod imp {
    use super::{WindowHandle, WindowInfo};
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use windows_sys::Win32::Foundation::{BOOL, HWND, LPARAM, TRUE};
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        EnumWindows, FindWindowExW, GetWindowTextLengthW, GetWindowTextW,
        GetWindowThreadProcessId, IsWindowVisible,
    };

    pub fn list_windows() -> Vec<WindowInfo> {
        let mut windows: Vec<WindowInfo> = Vec::new();

        unsafe {
            EnumWindows(
                Some(enum_window_callback),
                &mut windows as *mut Vec<WindowInfo> as LPARAM,
            );
        }

        windows
    }

    unsafe extern "system" fn enum_window_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let windows = &mut *(lparam as *mut Vec<WindowInfo>);

        // Skip invisible windows and windows with empty titles
        if IsWindowVisible(hwnd) == 0 {
            return TRUE;
        }
        if GetWindowTextLengthW(hwnd) == 0 {
            return TRUE;
        }

        if let Some(info) = get_window_info(hwnd) {
            windows.push(info);
        }

        TRUE
    }

    unsafe fn get_window_info(hwnd: HWND) -> Option<WindowInfo> {
        let title_len = GetWindowTextLengthW(hwnd);
        if title_len == 0 {
            return None;
        }

        let mut title_buf: Vec<u16> = vec![0; (title_len + 1) as usize];
        let copied = GetWindowTextW(hwnd, title_buf.as_mut_ptr(), title_buf.len() as i32);
        if copied == 0 {
            return None;
        }
        title_buf.truncate(copied as usize);
        let title = OsString::from_wide(&title_buf)
            .to_string_lossy()
            .into_owned();

        let mut pid: u32 = 0;
        GetWindowThreadProcessId(hwnd, &mut pid);

        Some(WindowInfo {
            handle: hwnd as WindowHandle,
            title,
            pid,
        })
    }

    pub fn find_child_by_class(parent: WindowHandle, class: &str) -> Option<WindowHandle> {
        let class_wide: Vec<u16> = class.encode_utf16().chain(std::iter::once(0)).collect();

        let child = unsafe {
            FindWindowExW(
                parent as HWND,
                std::ptr::null_mut(),
                class_wide.as_ptr(),
                std::ptr::null(),
            )
        };

        if child.is_null() {
            None
        } else {
            Some(child as WindowHandle)
        }
    }
}
