use spyglass_core::{Color, HIGHLIGHT_WIDTH, Highlighter, SpyResult, WindowHandle};

use windows::Win32::Foundation::{COLORREF, RECT};
use windows::Win32::Graphics::Gdi::{
    CreatePen, GetStockObject, InvalidateRect, NULL_BRUSH, PS_INSIDEFRAME, RDW_ALLCHILDREN,
    RDW_FRAME, RDW_INVALIDATE, RDW_UPDATENOW, Rectangle, RedrawWindow, SelectObject,
    UpdateWindow,
};
use windows::Win32::UI::WindowsAndMessaging::GetWindowRect;

use crate::handle::{GdiObject, WindowDc};
use crate::window::hwnd;

/// Draws the highlight straight into the target's window DC.
///
/// Nothing is retained: the border lives until the target repaints,
/// which [`Highlighter::unhighlight`] forces.
#[derive(Debug, Clone, Copy)]
pub struct GdiHighlighter {
    color: Color,
}

impl GdiHighlighter {
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    fn draw(&self, window: WindowHandle) -> SpyResult<()> {
        let hwnd = hwnd(window);
        let mut rect = RECT::default();
        // SAFETY: GetWindowRect writes into the RECT we own.
        unsafe { GetWindowRect(hwnd, &mut rect)? };

        let dc = WindowDc::acquire(hwnd).ok_or("GetWindowDC failed")?;
        // SAFETY: CreatePen has no preconditions; the pen is deleted by
        // the guard after it has been deselected below.
        let pen = GdiObject::new(unsafe {
            CreatePen(
                PS_INSIDEFRAME,
                HIGHLIGHT_WIDTH,
                COLORREF(self.color.to_bgr()),
            )
        })
        .ok_or("CreatePen failed")?;

        // SAFETY: Both objects stay alive while selected, and the DC's
        // previous pen and brush are restored before the guards drop.
        unsafe {
            let old_pen = SelectObject(dc.hdc(), pen.raw());
            let old_brush = SelectObject(dc.hdc(), GetStockObject(NULL_BRUSH));
            let _ = Rectangle(
                dc.hdc(),
                0,
                0,
                rect.right - rect.left,
                rect.bottom - rect.top,
            );
            SelectObject(dc.hdc(), old_brush);
            SelectObject(dc.hdc(), old_pen);
        }
        Ok(())
    }
}

impl Highlighter for GdiHighlighter {
    fn highlight(&mut self, window: WindowHandle) {
        if let Err(e) = self.draw(window) {
            spyglass_core::log_debug!("highlight {window}: {e}");
        }
    }

    fn unhighlight(&mut self, window: WindowHandle) {
        let hwnd = hwnd(window);
        // SAFETY: Invalidation and redraw requests on a stale handle fail
        // harmlessly. The frame flag is what erases our border, which sits
        // in the non-client area.
        unsafe {
            let _ = InvalidateRect(Some(hwnd), None, true);
            let _ = UpdateWindow(hwnd);
            let _ = RedrawWindow(
                Some(hwnd),
                None,
                None,
                RDW_FRAME | RDW_INVALIDATE | RDW_UPDATENOW | RDW_ALLCHILDREN,
            );
        }
    }
}
