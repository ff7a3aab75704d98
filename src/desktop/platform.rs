//! Native calls winit does not cover
//!
//! On Windows: top-most re-assertion, the color-keyed translucent overlay,
//! the global cursor position, the system beep and the primary work area.
//! Elsewhere these fall back to what winit offers or do nothing.

use winit::window::Window;

use crate::host::{Point, Rect};

#[cfg(windows)]
mod imp {
    use super::*;
    use std::ffi::c_void;

    use windows::Win32::Foundation::{COLORREF, HWND, POINT, RECT};
    use windows::Win32::System::Diagnostics::Debug::MessageBeep;
    use windows::Win32::UI::WindowsAndMessaging::{
        GetCursorPos, GetWindowLongW, SetLayeredWindowAttributes, SetWindowLongW,
        SetWindowPos, SystemParametersInfoW, GWL_EXSTYLE, HWND_TOPMOST, LWA_ALPHA, LWA_COLORKEY,
        MB_ICONEXCLAMATION, SPI_GETWORKAREA, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
        SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS, WS_EX_LAYERED,
    };
    use winit::raw_window_handle::{HasWindowHandle, RawWindowHandle};

    use crate::desktop::render::COLOR_KEY;

    fn hwnd(window: &Window) -> Option<HWND> {
        match window.window_handle().ok()?.as_raw() {
            RawWindowHandle::Win32(handle) => Some(HWND(handle.hwnd.get())),
            _ => None,
        }
    }

    pub fn raise_topmost(window: &Window) {
        if let Some(hwnd) = hwnd(window) {
            unsafe {
                let _ = SetWindowPos(hwnd, HWND_TOPMOST, 0, 0, 0, 0, SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE);
            }
        }
    }

    pub fn apply_overlay_opacity(window: &Window, opacity: f64) {
        let Some(hwnd) = hwnd(window) else {
            return;
        };
        // softbuffer writes 0x00RRGGBB; the key is the same value as a COLORREF (0x00BBGGRR) for magenta
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        unsafe {
            let style = GetWindowLongW(hwnd, GWL_EXSTYLE);
            if style & WS_EX_LAYERED.0 as i32 == 0 {
                SetWindowLongW(hwnd, GWL_EXSTYLE, style | WS_EX_LAYERED.0 as i32);
            }
            let _ = SetLayeredWindowAttributes(hwnd, COLORREF(COLOR_KEY), alpha, LWA_COLORKEY | LWA_ALPHA);
        }
    }

    pub fn cursor_position() -> Option<Point> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }.ok()?;
        Some(Point { x: point.x, y: point.y })
    }

    pub fn beep() {
        unsafe {
            let _ = MessageBeep(MB_ICONEXCLAMATION);
        }
    }

    pub fn primary_work_area() -> Option<Rect> {
        let mut rect = RECT::default();
        unsafe {
            SystemParametersInfoW(
                SPI_GETWORKAREA,
                0,
                Some(&mut rect as *mut RECT as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
        }
        .ok()?;
        Some(Rect {
            x: rect.left,
            y: rect.top,
            width: (rect.right - rect.left).max(0) as u32,
            height: (rect.bottom - rect.top).max(0) as u32,
        })
    }
}

#[cfg(not(windows))]
mod imp {
    use super::*;
    use std::io::Write;

    pub fn raise_topmost(_window: &Window) {}

    pub fn apply_overlay_opacity(_window: &Window, _opacity: f64) {}

    pub fn cursor_position() -> Option<Point> {
        None
    }

    pub fn beep() {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }

    pub fn primary_work_area() -> Option<Rect> {
        None
    }
}

pub use imp::{apply_overlay_opacity, beep, cursor_position, primary_work_area, raise_topmost};
