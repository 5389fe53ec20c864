use std::fmt;

use serde::Serialize;

use crate::{Point, Rect};

/// A boxed error type for OS queries.
///
/// Any error type that implements the `Error` trait can be boxed into this.
/// The injection engine has its own typed error, see [`crate::inject::InjectError`].
pub type SpyResult<T> = Result<T, Box<dyn std::error::Error>>;

/// An opaque OS window identifier.
///
/// Spyglass only references windows; it never owns or destroys them.
/// The raw value is a pointer-sized integer so platform-agnostic code
/// does not need the `windows` crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WindowHandle(usize);

impl WindowHandle {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Thread and process that created a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowOwner {
    pub thread_id: u32,
    pub process_id: u32,
}

/// Identity of a window's immediate parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParentInfo {
    pub handle: WindowHandle,
    pub caption: String,
    pub class: String,
}

/// Everything Spyglass shows about a resolved window.
///
/// Built fresh on every resolution. Fields the OS refused to report are
/// left at their default (empty string, zero).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowMetadata {
    pub handle: WindowHandle,
    pub class: String,
    pub caption: String,
    pub control_id: i64,
    pub style: u32,
    pub rect: Rect,
    /// `None` for top-level windows.
    pub parent: Option<ParentInfo>,
    pub thread_id: u32,
    pub process_id: u32,
}

/// Platform window queries consumed by [`crate::probe::WindowProbe`].
///
/// Each platform crate (e.g. `spyglass-windows`) provides its own
/// implementation. Every query is read-only.
pub trait WindowQueries {
    /// Returns the topmost window at a screen point, if any.
    fn window_at(&self, point: Point) -> Option<WindowHandle>;

    /// Returns the immediate parent, or `None` for top-level windows.
    fn parent(&self, window: WindowHandle) -> Option<WindowHandle>;

    /// Returns the window class name.
    fn class_name(&self, window: WindowHandle) -> SpyResult<String>;

    /// Returns the window caption text.
    fn caption(&self, window: WindowHandle) -> SpyResult<String>;

    /// Returns the control identifier (`GWLP_ID` on Windows).
    fn control_id(&self, window: WindowHandle) -> SpyResult<i64>;

    /// Returns the style bits.
    fn style(&self, window: WindowHandle) -> SpyResult<u32>;

    /// Returns the bounding rectangle in screen coordinates.
    fn rect(&self, window: WindowHandle) -> SpyResult<Rect>;

    /// Returns the thread and process that own the window.
    fn owner(&self, window: WindowHandle) -> SpyResult<WindowOwner>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_displays_as_decimal() {
        assert_eq!(WindowHandle::new(0x1A2B).to_string(), "6699");
    }

    #[test]
    fn zero_handle_is_null() {
        assert!(WindowHandle::default().is_null());
        assert!(!WindowHandle::new(42).is_null());
    }
}
