#![cfg(windows)]

/// Per-monitor DPI awareness.
pub mod dpi;

/// Mouse capture and cursor swapping while the finder is dragged.
pub mod grab;

/// RAII guards for Win32 handles and GDI objects.
mod handle;

/// Border drawing on the window under the finder.
pub mod highlight;

/// The inspector window and its message pump.
pub mod inspector;

/// Foreign process primitives behind the injector.
pub mod process;

/// Window metadata queries on raw `HWND`s.
pub mod window;

pub use grab::CursorGrab;
pub use highlight::GdiHighlighter;
pub use process::{Win32Executor, Win32Process};
pub use window::Win32Windows;
