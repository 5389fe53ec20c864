//! The 13 text fields of the inspector panel.

use serde::Serialize;

use crate::probe::ProbeReport;

/// Shown in the parent fields of top-level windows.
pub const NOT_APPLICABLE: &str = "N/A";

/// Text shown for each labeled field. All empty when nothing was resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayFields {
    pub handle: String,
    pub control_id: String,
    pub caption: String,
    pub class: String,
    pub style: String,
    pub rect: String,
    pub thread_id: String,
    pub process_id: String,
    pub parent_handle: String,
    pub parent_caption: String,
    pub parent_class: String,
    pub cursor: String,
    pub cursor_relative: String,
}

impl DisplayFields {
    pub fn from_report(report: &ProbeReport) -> Self {
        let Some(meta) = &report.metadata else {
            return Self::default();
        };

        let (parent_handle, parent_caption, parent_class) = match &meta.parent {
            Some(p) => (p.handle.to_string(), p.caption.clone(), p.class.clone()),
            None => (
                NOT_APPLICABLE.to_string(),
                NOT_APPLICABLE.to_string(),
                NOT_APPLICABLE.to_string(),
            ),
        };

        let r = &meta.rect;
        let relative = report.cursor.relative_to(r);

        Self {
            handle: meta.handle.to_string(),
            control_id: meta.control_id.to_string(),
            caption: meta.caption.clone(),
            class: meta.class.clone(),
            style: format!("0x{:08X}", meta.style),
            rect: format!(
                "[{} x {}], ({},{})-({},{})",
                r.width,
                r.height,
                r.x,
                r.y,
                r.right(),
                r.bottom()
            ),
            thread_id: meta.thread_id.to_string(),
            process_id: meta.process_id.to_string(),
            parent_handle,
            parent_caption,
            parent_class,
            cursor: format!("{},{}", report.cursor.x, report.cursor.y),
            cursor_relative: format!("{},{}", relative.x, relative.y),
        }
    }

    /// Whether every field is empty.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Fields paired with their labels, in panel order.
    pub fn labeled(&self) -> [(&'static str, &str); 13] {
        [
            ("Handle", &self.handle),
            ("Control ID", &self.control_id),
            ("Caption", &self.caption),
            ("Class", &self.class),
            ("Style", &self.style),
            ("Rect", &self.rect),
            ("Thread ID", &self.thread_id),
            ("Process ID", &self.process_id),
            ("Parent", &self.parent_handle),
            ("Parent caption", &self.parent_caption),
            ("Parent class", &self.parent_class),
            ("Cursor", &self.cursor),
            ("Cursor (window)", &self.cursor_relative),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{ParentInfo, WindowHandle, WindowMetadata};
    use crate::{Point, Rect};

    fn ok_button() -> WindowMetadata {
        WindowMetadata {
            handle: WindowHandle::new(512),
            class: "Button".into(),
            caption: "OK".into(),
            control_id: 1,
            style: 0x5001_0000,
            rect: Rect::from_edges(10, 10, 110, 40),
            parent: None,
            thread_id: 77,
            process_id: 4242,
        }
    }

    #[test]
    fn no_window_blanks_every_field() {
        // Arrange
        let report = ProbeReport {
            cursor: Point::new(5, 5),
            metadata: None,
        };

        // Act
        let fields = DisplayFields::from_report(&report);

        // Assert
        assert!(fields.is_blank());
        assert!(fields.labeled().iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn parentless_window_shows_not_applicable() {
        let report = ProbeReport {
            cursor: Point::new(20, 15),
            metadata: Some(ok_button()),
        };

        let fields = DisplayFields::from_report(&report);

        assert_eq!(fields.parent_handle, NOT_APPLICABLE);
        assert_eq!(fields.parent_caption, NOT_APPLICABLE);
        assert_eq!(fields.parent_class, NOT_APPLICABLE);
    }

    #[test]
    fn fields_are_formatted_for_display() {
        // Arrange
        let mut meta = ok_button();
        meta.parent = Some(ParentInfo {
            handle: WindowHandle::new(256),
            caption: "Confirm".into(),
            class: "#32770".into(),
        });
        let report = ProbeReport {
            cursor: Point::new(20, 15),
            metadata: Some(meta),
        };

        // Act
        let fields = DisplayFields::from_report(&report);

        // Assert
        assert_eq!(fields.handle, "512");
        assert_eq!(fields.control_id, "1");
        assert_eq!(fields.style, "0x50010000");
        assert_eq!(fields.rect, "[100 x 30], (10,10)-(110,40)");
        assert_eq!(fields.parent_handle, "256");
        assert_eq!(fields.parent_caption, "Confirm");
        assert_eq!(fields.parent_class, "#32770");
        assert_eq!(fields.cursor, "20,15");
        assert_eq!(fields.cursor_relative, "10,5");
    }

    #[test]
    fn empty_parent_caption_stays_empty() {
        let mut meta = ok_button();
        meta.parent = Some(ParentInfo {
            handle: WindowHandle::new(256),
            ..Default::default()
        });
        let report = ProbeReport {
            cursor: Point::default(),
            metadata: Some(meta),
        };

        let fields = DisplayFields::from_report(&report);

        assert_eq!(fields.parent_caption, "");
        assert_eq!(fields.parent_class, "");
    }
}
