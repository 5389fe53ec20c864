use crate::window::WindowHandle;

/// Width of the highlight border in logical pixels.
pub const HIGHLIGHT_WIDTH: i32 = 3;

/// Draws and erases the highlight border on a target window.
///
/// The border is painted on the target's own surface, not on an overlay,
/// so erasing it means asking the target to repaint itself.
pub trait Highlighter {
    /// Draws a border just inside the window's bounds.
    fn highlight(&mut self, window: WindowHandle);

    /// Forces the window (frame and children included) to repaint.
    fn unhighlight(&mut self, window: WindowHandle);
}

/// RGB color parsed from a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Parses a hex color string like "#00b4d8" or "00b4d8".
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        Some(Self {
            r: u8::from_str_radix(&hex[0..2], 16).ok()?,
            g: u8::from_str_radix(&hex[2..4], 16).ok()?,
            b: u8::from_str_radix(&hex[4..6], 16).ok()?,
        })
    }

    /// Packs the color as a Win32 `COLORREF` value (`0x00BBGGRR`).
    pub fn to_bgr(self) -> u32 {
        u32::from(self.r) | (u32::from(self.g) << 8) | (u32::from(self.b) << 16)
    }
}
