use spyglass_core::{InputGrab, log_warn};

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::{IDC_ARROW, IDC_CROSS, LoadCursorW, SetCursor};
use windows::core::PCWSTR;

/// Mouse capture on the inspector window plus the crosshair cursor.
///
/// While the capture is held, Windows routes every mouse message to
/// `window` even when the pointer is over other processes' windows, and
/// does not send `WM_SETCURSOR`, so the crosshair sticks.
#[derive(Debug)]
pub struct CursorGrab {
    window: HWND,
}

impl CursorGrab {
    pub fn new(window: HWND) -> Self {
        Self { window }
    }
}

impl InputGrab for CursorGrab {
    fn start(&mut self) {
        // SAFETY: SetCapture takes a window owned by this thread.
        unsafe {
            SetCapture(self.window);
        }
        set_cursor(IDC_CROSS);
    }

    fn stop(&mut self) {
        // SAFETY: ReleaseCapture is a no-op when nothing is captured.
        if let Err(e) = unsafe { ReleaseCapture() } {
            log_warn!("ReleaseCapture failed: {e}");
        }
        set_cursor(IDC_ARROW);
    }
}

fn set_cursor(id: PCWSTR) {
    // SAFETY: Loading a system cursor by resource id has no preconditions.
    match unsafe { LoadCursorW(None, id) } {
        Ok(cursor) => unsafe {
            SetCursor(Some(cursor));
        },
        Err(e) => log_warn!("could not load cursor: {e}"),
    }
}
