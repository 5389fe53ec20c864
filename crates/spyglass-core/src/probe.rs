//! Point-to-window resolution.
//!
//! [`WindowProbe`] turns a screen coordinate into [`WindowMetadata`] using
//! a platform [`WindowQueries`] implementation. Resolution never fails:
//! a miss yields `None`, and each field the OS refuses to report is left
//! empty while the rest of the metadata is still collected.

use serde::Serialize;

use crate::window::{ParentInfo, SpyResult, WindowHandle, WindowMetadata, WindowQueries};
use crate::{Point, log_debug};

/// The result of probing one cursor position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// Absolute cursor position in screen coordinates.
    pub cursor: Point,
    /// The window under the cursor, or `None` when nothing was hit.
    pub metadata: Option<WindowMetadata>,
}

impl ProbeReport {
    /// Cursor position relative to the resolved window's top-left corner.
    pub fn relative_cursor(&self) -> Option<Point> {
        self.metadata
            .as_ref()
            .map(|m| self.cursor.relative_to(&m.rect))
    }

    /// Handle of the resolved window, if any.
    pub fn handle(&self) -> Option<WindowHandle> {
        self.metadata.as_ref().map(|m| m.handle)
    }
}

/// Resolves screen points to window metadata.
pub struct WindowProbe<Q> {
    queries: Q,
}

impl<Q: WindowQueries> WindowProbe<Q> {
    pub fn new(queries: Q) -> Self {
        Self { queries }
    }

    pub fn queries(&self) -> &Q {
        &self.queries
    }

    /// Probes a cursor position and packages the result for display.
    pub fn report(&self, cursor: Point) -> ProbeReport {
        ProbeReport {
            cursor,
            metadata: self.resolve(cursor),
        }
    }

    /// Hit-tests `point` and collects metadata for the topmost window there.
    ///
    /// Only the immediate parent is inspected, never the full ancestor chain.
    pub fn resolve(&self, point: Point) -> Option<WindowMetadata> {
        let handle = self
            .queries
            .window_at(point)
            .filter(|h| !h.is_null())?;

        let parent = self
            .queries
            .parent(handle)
            .filter(|p| !p.is_null())
            .map(|p| ParentInfo {
                handle: p,
                caption: field("parent caption", p, self.queries.caption(p)),
                class: field("parent class", p, self.queries.class_name(p)),
            });

        let owner = field("owner", handle, self.queries.owner(handle));

        Some(WindowMetadata {
            handle,
            class: field("class", handle, self.queries.class_name(handle)),
            caption: field("caption", handle, self.queries.caption(handle)),
            control_id: field("control id", handle, self.queries.control_id(handle)),
            style: field("style", handle, self.queries.style(handle)),
            rect: field("rect", handle, self.queries.rect(handle)),
            parent,
            thread_id: owner.thread_id,
            process_id: owner.process_id,
        })
    }
}

/// Unwraps a query result, substituting the empty value on failure.
fn field<T: Default>(what: &str, window: WindowHandle, result: SpyResult<T>) -> T {
    result.unwrap_or_else(|e| {
        log_debug!("probe: {what} of window {window} unavailable: {e}");
        T::default()
    })
}
