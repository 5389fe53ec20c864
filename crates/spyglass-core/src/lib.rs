pub mod capture;
pub mod config;
pub mod display;
pub mod highlight;
pub mod inject;
pub mod log;
pub mod probe;
pub mod rect;
pub mod window;

#[cfg(test)]
mod testing;

pub use capture::{
    CaptureController, CaptureSession, FinderState, InputGrab, MetadataSink, MouseButton,
    PointerEvent,
};
pub use config::Config;
pub use display::{DisplayFields, NOT_APPLICABLE};
pub use highlight::{Color, HIGHLIGHT_WIDTH, Highlighter};
pub use inject::{
    EntryPoint, ForeignProcessExecutor, InjectError, InjectResult, InjectionOutcome,
    InjectionRequest, InjectionService, RemoteAddress, RemoteInjector, RemoteProcess,
    RemoteRoutine, UnsupportedExecutor,
};
pub use probe::{ProbeReport, WindowProbe};
pub use rect::{Point, Rect};
pub use window::{ParentInfo, SpyResult, WindowHandle, WindowMetadata, WindowOwner, WindowQueries};
