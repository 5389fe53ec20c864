//! In-memory doubles for the platform traits, shared by the unit tests.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::capture::{FinderState, InputGrab, MetadataSink};
use crate::highlight::Highlighter;
use crate::inject::{
    EntryPoint, ForeignProcessExecutor, InjectError, InjectResult, InjectionOutcome,
    InjectionRequest, InjectionService, RemoteAddress, RemoteProcess, RemoteRoutine,
};
use crate::probe::ProbeReport;
use crate::window::{SpyResult, WindowHandle, WindowOwner, WindowQueries};
use crate::{Point, Rect};

// -- desktop --

#[derive(Debug, Clone, Default)]
pub struct FakeWindow {
    pub handle: usize,
    pub class: String,
    pub caption: String,
    pub control_id: i64,
    pub style: u32,
    pub rect: Rect,
    pub parent: Option<usize>,
    pub process_id: u32,
    pub thread_id: u32,
}

/// A stack of windows; later additions sit on top.
#[derive(Debug, Default)]
pub struct FakeDesktop {
    windows: Vec<FakeWindow>,
    /// When set, every metadata query fails.
    pub failing: bool,
}

impl FakeDesktop {
    pub fn add(&mut self, window: FakeWindow) {
        self.windows.push(window);
    }

    fn find(&self, window: WindowHandle) -> SpyResult<&FakeWindow> {
        if self.failing {
            return Err("access denied".into());
        }
        self.windows
            .iter()
            .find(|w| w.handle == window.raw())
            .ok_or_else(|| "invalid window handle".into())
    }
}

impl WindowQueries for FakeDesktop {
    fn window_at(&self, point: Point) -> Option<WindowHandle> {
        self.windows
            .iter()
            .rev()
            .find(|w| w.rect.contains(point))
            .map(|w| WindowHandle::new(w.handle))
    }

    fn parent(&self, window: WindowHandle) -> Option<WindowHandle> {
        self.windows
            .iter()
            .find(|w| w.handle == window.raw())
            .and_then(|w| w.parent)
            .map(WindowHandle::new)
    }

    fn class_name(&self, window: WindowHandle) -> SpyResult<String> {
        Ok(self.find(window)?.class.clone())
    }

    fn caption(&self, window: WindowHandle) -> SpyResult<String> {
        Ok(self.find(window)?.caption.clone())
    }

    fn control_id(&self, window: WindowHandle) -> SpyResult<i64> {
        Ok(self.find(window)?.control_id)
    }

    fn style(&self, window: WindowHandle) -> SpyResult<u32> {
        Ok(self.find(window)?.style)
    }

    fn rect(&self, window: WindowHandle) -> SpyResult<Rect> {
        Ok(self.find(window)?.rect)
    }

    fn owner(&self, window: WindowHandle) -> SpyResult<WindowOwner> {
        let w = self.find(window)?;
        Ok(WindowOwner {
            thread_id: w.thread_id,
            process_id: w.process_id,
        })
    }
}

// -- call journal --

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Highlight(usize),
    Unhighlight(usize),
    GrabStart,
    GrabStop,
    Finder(FinderState),
    Publish(Option<usize>),
    Inject(u32),
}

/// Ordered record of calls made on the doubles below.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Call>>>);

impl Journal {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub struct RecordingHighlighter(pub Journal);

impl Highlighter for RecordingHighlighter {
    fn highlight(&mut self, window: WindowHandle) {
        self.0.push(Call::Highlight(window.raw()));
    }

    fn unhighlight(&mut self, window: WindowHandle) {
        self.0.push(Call::Unhighlight(window.raw()));
    }
}

pub struct RecordingGrab(pub Journal);

impl InputGrab for RecordingGrab {
    fn start(&mut self) {
        self.0.push(Call::GrabStart);
    }

    fn stop(&mut self) {
        self.0.push(Call::GrabStop);
    }
}

pub struct RecordingSink(pub Journal);

impl MetadataSink for RecordingSink {
    fn publish(&mut self, report: &ProbeReport) {
        self.0.push(Call::Publish(report.handle().map(WindowHandle::raw)));
    }

    fn finder_changed(&mut self, state: FinderState) {
        self.0.push(Call::Finder(state));
    }
}

pub struct RecordingInjector(pub Journal);

impl InjectionService for RecordingInjector {
    fn inject(&mut self, request: &InjectionRequest) -> InjectionOutcome {
        self.0.push(Call::Inject(request.pid));
        InjectionOutcome::loaded(0x7FF0_0000)
    }
}

// -- foreign process --

/// What the fake executor saw, plus knobs to make individual steps fail.
#[derive(Debug, Default)]
pub struct ExecState {
    pub opened: Vec<u32>,
    pub closed: usize,
    pub allocated: Vec<(usize, usize)>,
    pub freed: Vec<usize>,
    pub written: Vec<Vec<u8>>,
    pub threads: Vec<(EntryPoint, usize)>,
    pub text_probes: Vec<usize>,

    pub fail_open: bool,
    /// The opened process reports a different pointer width.
    pub foreign_architecture: bool,
    pub fail_allocate: bool,
    pub fail_write: bool,
    pub fail_thread: Option<EntryPoint>,
    /// Exit code of the remote load thread.
    pub load_exit_code: u32,
    /// Full module handle found by enumeration, if any.
    pub module: Option<usize>,
}

impl ExecState {
    /// Allocations not yet released.
    pub fn leaked(&self) -> Vec<usize> {
        self.allocated
            .iter()
            .map(|(addr, _)| *addr)
            .filter(|addr| !self.freed.contains(addr))
            .collect()
    }
}

pub const LOCAL_PID: u32 = 1000;
const LOAD_ADDRESS: usize = 0x7FFA_0000_1000;
const FREE_ADDRESS: usize = 0x7FFA_0000_2000;

#[derive(Clone, Default)]
pub struct FakeExecutor(pub Rc<RefCell<ExecState>>);

impl FakeExecutor {
    pub fn state(&self) -> std::cell::Ref<'_, ExecState> {
        self.0.borrow()
    }

    pub fn configure(&self, f: impl FnOnce(&mut ExecState)) {
        f(&mut self.0.borrow_mut());
    }
}

pub struct FakeProcess(Rc<RefCell<ExecState>>);

impl ForeignProcessExecutor for FakeExecutor {
    type Process = FakeProcess;

    fn local_pid(&self) -> u32 {
        LOCAL_PID
    }

    fn open(&self, pid: u32) -> InjectResult<FakeProcess> {
        let mut state = self.0.borrow_mut();
        if state.fail_open {
            return Err(InjectError::Open {
                pid,
                reason: "access denied".into(),
            });
        }
        state.opened.push(pid);
        Ok(FakeProcess(Rc::clone(&self.0)))
    }

    fn entry_point(&self, entry: EntryPoint) -> InjectResult<RemoteRoutine> {
        let address = match entry {
            EntryPoint::LoadLibrary => LOAD_ADDRESS,
            EntryPoint::FreeLibrary => FREE_ADDRESS,
        };
        Ok(RemoteRoutine {
            entry,
            address: RemoteAddress::new(address),
        })
    }

    fn probe_text(&self, window: WindowHandle) -> Option<String> {
        self.0.borrow_mut().text_probes.push(window.raw());
        Some("OK".into())
    }
}

impl RemoteProcess for FakeProcess {
    fn shares_architecture(&self) -> bool {
        !self.0.borrow().foreign_architecture
    }

    fn allocate(&self, size: usize) -> InjectResult<RemoteAddress> {
        let mut state = self.0.borrow_mut();
        if state.fail_allocate {
            return Err(InjectError::Allocate {
                size,
                reason: "out of memory".into(),
            });
        }
        let address = 0x1000_0000 + state.allocated.len() * 0x1000;
        state.allocated.push((address, size));
        Ok(RemoteAddress::new(address))
    }

    fn write(&self, _address: RemoteAddress, bytes: &[u8]) -> InjectResult<()> {
        let mut state = self.0.borrow_mut();
        if state.fail_write {
            return Err(InjectError::Write("partial copy".into()));
        }
        state.written.push(bytes.to_vec());
        Ok(())
    }

    fn free(&self, address: RemoteAddress) {
        self.0.borrow_mut().freed.push(address.raw());
    }

    fn run(&self, routine: RemoteRoutine, argument: usize) -> InjectResult<u32> {
        let mut state = self.0.borrow_mut();
        let entry = routine.entry;
        if state.fail_thread == Some(entry) {
            return Err(InjectError::Thread {
                symbol: entry.symbol(),
                reason: "access denied".into(),
            });
        }
        state.threads.push((entry, argument));
        Ok(match entry {
            EntryPoint::LoadLibrary => state.load_exit_code,
            EntryPoint::FreeLibrary => 1,
        })
    }

    fn find_module(&self, _library: &Path) -> Option<usize> {
        self.0.borrow().module
    }
}

impl Drop for FakeProcess {
    fn drop(&mut self) {
        self.0.borrow_mut().closed += 1;
    }
}
