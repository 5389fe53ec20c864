//! The finder capture session.
//!
//! [`CaptureController`] is the state machine behind the crosshair finder.
//! A left press on the finder arms it (input grab + crosshair cursor),
//! pointer motion while armed is resolved, highlighted and published, and
//! the left release disarms it. Everything runs on the caller's thread.

use std::path::PathBuf;

use crate::highlight::Highlighter;
use crate::inject::{InjectionRequest, InjectionService};
use crate::probe::{ProbeReport, WindowProbe};
use crate::window::{WindowHandle, WindowMetadata, WindowQueries};
use crate::{Point, log_debug};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer input delivered by the platform event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    /// A button went down. `on_finder` is true when the press started on
    /// the finder control.
    Pressed { button: MouseButton, on_finder: bool },
    /// The pointer moved; screen coordinates.
    Moved(Point),
    Released { button: MouseButton },
}

/// Image shown in the finder slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderState {
    /// Idle: the crosshair sits in the finder.
    Home,
    /// Capturing: the crosshair is on the cursor, the slot is blank.
    Gone,
}

/// Global pointer grab and cursor swap.
pub trait InputGrab {
    /// Routes all pointer input to the inspector and shows the crosshair.
    fn start(&mut self);

    /// Releases the grab and restores the default cursor.
    fn stop(&mut self);
}

/// Display surface for probe results. Exactly one consumer.
pub trait MetadataSink {
    fn publish(&mut self, report: &ProbeReport);

    fn finder_changed(&mut self, state: FinderState);
}

/// Per-session state. `previous` is only ever set while `active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureSession {
    active: bool,
    previous: Option<WindowHandle>,
}

impl CaptureSession {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The currently highlighted window.
    pub fn previous(&self) -> Option<WindowHandle> {
        self.previous
    }
}

struct Injection<I> {
    service: I,
    library: PathBuf,
}

/// Drives the capture session from pointer events.
pub struct CaptureController<Q, H, G, S, I>
where
    Q: WindowQueries,
    H: Highlighter,
    G: InputGrab,
    S: MetadataSink,
    I: InjectionService,
{
    probe: WindowProbe<Q>,
    highlighter: H,
    grab: G,
    sink: S,
    injection: Option<Injection<I>>,
    local_pid: u32,
    session: CaptureSession,
}

impl<Q, H, G, S, I> CaptureController<Q, H, G, S, I>
where
    Q: WindowQueries,
    H: Highlighter,
    G: InputGrab,
    S: MetadataSink,
    I: InjectionService,
{
    pub fn new(probe: WindowProbe<Q>, highlighter: H, grab: G, sink: S, local_pid: u32) -> Self {
        Self {
            probe,
            highlighter,
            grab,
            sink,
            injection: None,
            local_pid,
            session: CaptureSession::default(),
        }
    }

    /// Probes foreign processes with `library` on every new window.
    pub fn with_injection(mut self, service: I, library: PathBuf) -> Self {
        self.injection = Some(Injection { service, library });
        self
    }

    pub fn session(&self) -> CaptureSession {
        self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Pressed {
                button: MouseButton::Left,
                on_finder: true,
            } => self.arm(),
            PointerEvent::Moved(point) => self.track(point),
            PointerEvent::Released {
                button: MouseButton::Left,
            } => self.disarm(),
            PointerEvent::Pressed { .. } | PointerEvent::Released { .. } => {}
        }
    }

    fn arm(&mut self) {
        if self.session.active {
            return;
        }
        self.grab.start();
        self.sink.finder_changed(FinderState::Gone);
        self.session.active = true;
        log_debug!("capture: armed");
    }

    fn disarm(&mut self) {
        if !self.session.active {
            return;
        }
        self.grab.stop();
        self.sink.finder_changed(FinderState::Home);
        if let Some(previous) = self.session.previous.take() {
            self.highlighter.unhighlight(previous);
        }
        self.session.active = false;
        log_debug!("capture: released");
    }

    fn track(&mut self, point: Point) {
        if !self.session.active {
            return;
        }

        let report = self.probe.report(point);
        let current = report.handle();

        if current != self.session.previous {
            if let Some(previous) = self.session.previous.take() {
                self.highlighter.unhighlight(previous);
            }
            if let Some(meta) = &report.metadata {
                self.highlighter.highlight(meta.handle);
                self.session.previous = Some(meta.handle);
                self.probe_process(meta);
            }
        }

        self.sink.publish(&report);
    }

    fn probe_process(&mut self, meta: &WindowMetadata) {
        if meta.process_id == self.local_pid {
            return;
        }
        let Some(injection) = self.injection.as_mut() else {
            return;
        };
        let request = InjectionRequest {
            pid: meta.process_id,
            library: injection.library.clone(),
            window: meta.handle,
        };
        let outcome = injection.service.inject(&request);
        log_debug!(
            "capture: window {} (pid {}) probe succeeded={}",
            meta.handle,
            meta.process_id,
            outcome.succeeded
        );
    }
}

impl<Q, H, G, S, I> Drop for CaptureController<Q, H, G, S, I>
where
    Q: WindowQueries,
    H: Highlighter,
    G: InputGrab,
    S: MetadataSink,
    I: InjectionService,
{
    fn drop(&mut self) {
        self.disarm();
    }
}
