use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND};
use windows::Win32::Graphics::Gdi::{DeleteObject, GetWindowDC, HDC, HGDIOBJ, ReleaseDC};

/// A kernel handle closed on drop.
#[derive(Debug)]
pub(crate) struct OwnedHandle(HANDLE);

impl OwnedHandle {
    pub(crate) fn new(handle: HANDLE) -> Self {
        Self(handle)
    }

    pub(crate) fn raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // SAFETY: We own the handle and nothing else closes it.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

/// The whole-window device context of a (possibly foreign) window,
/// including its non-client area.
pub(crate) struct WindowDc {
    hwnd: HWND,
    hdc: HDC,
}

impl WindowDc {
    pub(crate) fn acquire(hwnd: HWND) -> Option<Self> {
        // SAFETY: GetWindowDC returns a null HDC for invalid windows,
        // which we reject below.
        let hdc = unsafe { GetWindowDC(Some(hwnd)) };
        (!hdc.is_invalid()).then_some(Self { hwnd, hdc })
    }

    pub(crate) fn hdc(&self) -> HDC {
        self.hdc
    }
}

impl Drop for WindowDc {
    fn drop(&mut self) {
        // SAFETY: The DC was obtained from GetWindowDC for this window.
        unsafe {
            ReleaseDC(Some(self.hwnd), self.hdc);
        }
    }
}

/// A GDI object (pen, brush) deleted on drop.
///
/// Must be deselected from every DC before it drops.
pub(crate) struct GdiObject(HGDIOBJ);

impl GdiObject {
    pub(crate) fn new(object: impl Into<HGDIOBJ>) -> Option<Self> {
        let object = object.into();
        (!object.is_invalid()).then_some(Self(object))
    }

    pub(crate) fn raw(&self) -> HGDIOBJ {
        self.0
    }
}

impl Drop for GdiObject {
    fn drop(&mut self) {
        // SAFETY: We created the object and it is no longer selected.
        unsafe {
            let _ = DeleteObject(self.0);
        }
    }
}
