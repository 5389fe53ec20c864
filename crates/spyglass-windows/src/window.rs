use spyglass_core::{Point, Rect, SpyResult, WindowHandle, WindowOwner, WindowQueries};

use windows::Win32::Foundation::{GetLastError, HWND, POINT, RECT, SetLastError, WIN32_ERROR};
use windows::Win32::UI::WindowsAndMessaging::{
    GWL_STYLE, GWLP_ID, GetClassNameW, GetCursorPos, GetParent, GetWindowRect,
    GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId, WINDOW_LONG_PTR_INDEX,
    WindowFromPoint,
};

// user32 only exports the pointer-sized variant on 64-bit Windows.
#[cfg(target_pointer_width = "64")]
use windows::Win32::UI::WindowsAndMessaging::GetWindowLongPtrW as GetWindowLong;
#[cfg(target_pointer_width = "32")]
use windows::Win32::UI::WindowsAndMessaging::GetWindowLongW as GetWindowLong;

/// Converts a platform-neutral handle back into an `HWND`.
pub(crate) fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.raw() as *mut _)
}

pub(crate) fn handle(hwnd: HWND) -> WindowHandle {
    WindowHandle::new(hwnd.0 as usize)
}

/// Current cursor position in screen coordinates.
pub fn cursor_position() -> Option<Point> {
    let mut point = POINT::default();
    // SAFETY: GetCursorPos writes into the POINT we own.
    unsafe { GetCursorPos(&mut point) }.ok()?;
    Some(Point::new(point.x, point.y))
}

/// [`WindowQueries`] backed by user32.
///
/// Every query works on windows of any process; text-returning queries
/// read what the window manager caches and never block on the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Windows;

impl Win32Windows {
    /// Reads a window long whose legitimate value may be zero.
    fn window_long(window: WindowHandle, index: WINDOW_LONG_PTR_INDEX) -> SpyResult<isize> {
        // SAFETY: GetWindowLong only reads window data. The last error is
        // reset first so a zero result can be told apart from a failure.
        unsafe {
            SetLastError(WIN32_ERROR(0));
            let value = GetWindowLong(hwnd(window), index) as isize;
            if value == 0 {
                let error = GetLastError();
                if error.0 != 0 {
                    return Err(format!("GetWindowLong failed (error {})", error.0).into());
                }
            }
            Ok(value)
        }
    }
}

impl WindowQueries for Win32Windows {
    fn window_at(&self, point: Point) -> Option<WindowHandle> {
        // SAFETY: WindowFromPoint is a read-only hit test.
        let hwnd = unsafe {
            WindowFromPoint(POINT {
                x: point.x,
                y: point.y,
            })
        };
        (!hwnd.is_invalid()).then(|| handle(hwnd))
    }

    fn parent(&self, window: WindowHandle) -> Option<WindowHandle> {
        // SAFETY: GetParent is a read-only query; top-level windows
        // report an error, which means "no parent" here.
        let parent = unsafe { GetParent(hwnd(window)) }.ok()?;
        (!parent.is_invalid()).then(|| handle(parent))
    }

    fn class_name(&self, window: WindowHandle) -> SpyResult<String> {
        // SAFETY: GetClassNameW writes at most `buffer.len()` characters.
        // 256 is the maximum class name length in Win32.
        unsafe {
            let mut buffer = [0u16; 256];
            let length = GetClassNameW(hwnd(window), &mut buffer);
            if length == 0 {
                return Err(format!("GetClassNameW failed (error {})", GetLastError().0).into());
            }
            Ok(String::from_utf16_lossy(&buffer[..length as usize]))
        }
    }

    fn caption(&self, window: WindowHandle) -> SpyResult<String> {
        // SAFETY: GetWindowTextLengthW and GetWindowTextW read window text
        // without modifying state.
        unsafe {
            let length = GetWindowTextLengthW(hwnd(window));
            if length == 0 {
                return Ok(String::new());
            }

            // +1 for the null terminator that Windows requires
            let mut buffer = vec![0u16; (length + 1) as usize];
            let copied = GetWindowTextW(hwnd(window), &mut buffer);
            Ok(String::from_utf16_lossy(&buffer[..copied as usize]))
        }
    }

    fn control_id(&self, window: WindowHandle) -> SpyResult<i64> {
        Self::window_long(window, GWLP_ID).map(|id| id as i64)
    }

    fn style(&self, window: WindowHandle) -> SpyResult<u32> {
        Self::window_long(window, GWL_STYLE).map(|style| style as u32)
    }

    fn rect(&self, window: WindowHandle) -> SpyResult<Rect> {
        let mut rect = RECT::default();
        // SAFETY: GetWindowRect writes into the RECT we own.
        unsafe { GetWindowRect(hwnd(window), &mut rect)? };
        Ok(Rect::from_edges(rect.left, rect.top, rect.right, rect.bottom))
    }

    fn owner(&self, window: WindowHandle) -> SpyResult<WindowOwner> {
        let mut process_id = 0u32;
        // SAFETY: GetWindowThreadProcessId writes the pid into our u32.
        let thread_id = unsafe { GetWindowThreadProcessId(hwnd(window), Some(&mut process_id)) };
        if thread_id == 0 {
            return Err(format!("window {window} has no owning thread").into());
        }
        Ok(WindowOwner {
            thread_id,
            process_id,
        })
    }
}
