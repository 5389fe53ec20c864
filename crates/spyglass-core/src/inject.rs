//! Load/unload probe of a companion library inside a foreign process.
//!
//! The engine is written against [`ForeignProcessExecutor`] so the
//! sequencing (guard, open, architecture check, allocate, write, run,
//! free, unload) lives here
//! and only the raw primitives are platform code. Each invocation blocks
//! the calling thread until both remote threads finish; there is no
//! timeout, so a wedged target stalls the caller.

use std::path::{Path, PathBuf};

use crate::window::WindowHandle;
use crate::{log_debug, log_error, log_info, log_warn};

/// An address inside a foreign process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteAddress(usize);

impl RemoteAddress {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }
}

/// Loader entry points run as remote thread start routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    LoadLibrary,
    FreeLibrary,
}

impl EntryPoint {
    /// Exported symbol name in the system loader module.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::LoadLibrary => "LoadLibraryW",
            Self::FreeLibrary => "FreeLibrary",
        }
    }
}

/// A resolved entry point, ready to start a remote thread at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteRoutine {
    pub entry: EntryPoint,
    pub address: RemoteAddress,
}

/// Why an injection stopped. One variant per step.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("refusing to inject into the inspector's own process ({0})")]
    SelfInjection(u32),
    #[error("no owning process (pid 0)")]
    NoProcess,
    #[error("library path is empty")]
    EmptyLibraryPath,
    #[error("could not open process {pid}: {reason}")]
    Open { pid: u32, reason: String },
    #[error("could not allocate {size} bytes in the target: {reason}")]
    Allocate { size: usize, reason: String },
    #[error("could not write the library path: {0}")]
    Write(String),
    #[error("could not resolve {symbol}: {reason}")]
    EntryPoint {
        symbol: &'static str,
        reason: String,
    },
    #[error("could not start a remote thread at {symbol}: {reason}")]
    Thread {
        symbol: &'static str,
        reason: String,
    },
    #[error("process {pid} has a different pointer width than the inspector")]
    Architecture { pid: u32 },
    #[error("remote LoadLibraryW returned a null module handle")]
    NullModule,
    #[error("{library} was loaded but its module handle was not found, so it stays loaded")]
    ModuleNotFound { library: String },
    #[error("foreign-process execution is not supported on this platform")]
    Unsupported,
}

impl InjectError {
    /// The library may still be mapped in the target.
    pub fn leaves_library_loaded(&self) -> bool {
        match self {
            Self::ModuleNotFound { .. } => true,
            Self::Thread { symbol, .. } | Self::EntryPoint { symbol, .. } => {
                *symbol == EntryPoint::FreeLibrary.symbol()
            }
            _ => false,
        }
    }
}

pub type InjectResult<T> = Result<T, InjectError>;

/// Which process to probe and which library to load into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionRequest {
    pub pid: u32,
    pub library: PathBuf,
    /// Window that triggered the request; target of the passive text
    /// probe when the process cannot be opened.
    pub window: WindowHandle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectionOutcome {
    pub succeeded: bool,
    pub module: Option<usize>,
}

impl InjectionOutcome {
    pub fn loaded(module: usize) -> Self {
        Self {
            succeeded: true,
            module: Some(module),
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }
}

/// Something that can run an injection request.
///
/// Implemented by [`RemoteInjector`]; the capture controller depends on
/// this trait only.
pub trait InjectionService {
    fn inject(&mut self, request: &InjectionRequest) -> InjectionOutcome;
}

/// Platform primitives for running code in another process.
pub trait ForeignProcessExecutor {
    type Process: RemoteProcess;

    /// Process id of the inspector itself.
    fn local_pid(&self) -> u32;

    /// Opens `pid` with thread-creation and VM read/write/operate rights.
    fn open(&self, pid: u32) -> InjectResult<Self::Process>;

    /// Address of a loader entry point, valid in every process.
    fn entry_point(&self, entry: EntryPoint) -> InjectResult<RemoteRoutine>;

    /// Asks the window for its text through the normal message channel.
    fn probe_text(&self, window: WindowHandle) -> Option<String>;
}

/// An opened foreign process. Dropping it closes the OS handle.
pub trait RemoteProcess {
    /// Whether the target runs with the inspector's pointer width, so
    /// locally resolved loader addresses are valid inside it.
    fn shares_architecture(&self) -> bool;

    fn allocate(&self, size: usize) -> InjectResult<RemoteAddress>;

    fn write(&self, address: RemoteAddress, bytes: &[u8]) -> InjectResult<()>;

    /// Releases memory returned by [`RemoteProcess::allocate`].
    fn free(&self, address: RemoteAddress);

    /// Starts a thread at `routine` with `argument`, waits for it without
    /// a timeout and returns its exit code.
    ///
    /// Errors only when the thread could not be launched.
    fn run(&self, routine: RemoteRoutine, argument: usize) -> InjectResult<u32>;

    /// Full handle of a module loaded from `library`, if the platform can
    /// enumerate the target's modules.
    fn find_module(&self, library: &Path) -> Option<usize>;
}

/// Remote allocation released on drop.
struct RemoteBuffer<'a, P: RemoteProcess> {
    process: &'a P,
    address: RemoteAddress,
}

impl<'a, P: RemoteProcess> RemoteBuffer<'a, P> {
    fn allocate(process: &'a P, size: usize) -> InjectResult<Self> {
        let address = process.allocate(size)?;
        Ok(Self { process, address })
    }
}

impl<P: RemoteProcess> Drop for RemoteBuffer<'_, P> {
    fn drop(&mut self) {
        self.process.free(self.address);
    }
}

/// Encodes a library path as a NUL-terminated UTF-16LE byte string,
/// the argument layout `LoadLibraryW` expects.
pub fn encode_library_path(library: &Path) -> InjectResult<Vec<u8>> {
    let text = library.to_string_lossy();
    if text.is_empty() {
        return Err(InjectError::EmptyLibraryPath);
    }
    Ok(text
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect())
}

/// Runs the load-then-unload probe against foreign processes.
pub struct RemoteInjector<E> {
    executor: E,
}

impl<E: ForeignProcessExecutor> RemoteInjector<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Loads `request.library` into the target, then unloads it again.
    ///
    /// Returns the module handle the load produced. The remote path buffer
    /// is freed before this returns on every path past allocation, and the
    /// process handle is closed when `process` drops.
    pub fn try_inject(&self, request: &InjectionRequest) -> InjectResult<usize> {
        let local = self.executor.local_pid();
        if request.pid == local {
            return Err(InjectError::SelfInjection(local));
        }
        if request.pid == 0 {
            return Err(InjectError::NoProcess);
        }
        let payload = encode_library_path(&request.library)?;

        let process = match self.executor.open(request.pid) {
            Ok(process) => process,
            Err(e) => {
                let text = self.executor.probe_text(request.window);
                log_debug!(
                    "inject: open failed, window {} answered text probe with {text:?}",
                    request.window
                );
                return Err(e);
            }
        };
        if !process.shares_architecture() {
            return Err(InjectError::Architecture { pid: request.pid });
        }

        let module = {
            let buffer = RemoteBuffer::allocate(&process, payload.len())?;
            process.write(buffer.address, &payload)?;
            let load = self.executor.entry_point(EntryPoint::LoadLibrary)?;
            let exit_code = process.run(load, buffer.address.raw())?;
            if exit_code == 0 {
                0
            } else {
                // Thread exit codes are 32 bits. Only a 32-bit target's
                // handle fits in one.
                match process.find_module(&request.library) {
                    Some(module) => module,
                    None if usize::BITS == 32 => exit_code as usize,
                    None => {
                        return Err(InjectError::ModuleNotFound {
                            library: request.library.display().to_string(),
                        });
                    }
                }
            }
        };

        if module == 0 {
            return Err(InjectError::NullModule);
        }

        let unload = self.executor.entry_point(EntryPoint::FreeLibrary)?;
        process.run(unload, module)?;
        Ok(module)
    }
}

impl<E: ForeignProcessExecutor> InjectionService for RemoteInjector<E> {
    fn inject(&mut self, request: &InjectionRequest) -> InjectionOutcome {
        match self.try_inject(request) {
            Ok(module) => {
                log_info!(
                    "inject: {} loaded into pid {} at 0x{module:X} and unloaded",
                    request.library.display(),
                    request.pid
                );
                InjectionOutcome::loaded(module)
            }
            Err(e) if e.leaves_library_loaded() => {
                log_error!("inject: pid {}: {e}", request.pid);
                InjectionOutcome::failed()
            }
            Err(e) => {
                log_warn!("inject: pid {}: {e}", request.pid);
                InjectionOutcome::failed()
            }
        }
    }
}

/// Executor for platforms without foreign-process execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedExecutor;

/// Never constructed: [`UnsupportedExecutor::open`] always fails.
pub enum UnsupportedProcess {}

impl ForeignProcessExecutor for UnsupportedExecutor {
    type Process = UnsupportedProcess;

    fn local_pid(&self) -> u32 {
        std::process::id()
    }

    fn open(&self, _pid: u32) -> InjectResult<UnsupportedProcess> {
        Err(InjectError::Unsupported)
    }

    fn entry_point(&self, _entry: EntryPoint) -> InjectResult<RemoteRoutine> {
        Err(InjectError::Unsupported)
    }

    fn probe_text(&self, _window: WindowHandle) -> Option<String> {
        None
    }
}

impl RemoteProcess for UnsupportedProcess {
    fn shares_architecture(&self) -> bool {
        match *self {}
    }

    fn allocate(&self, _size: usize) -> InjectResult<RemoteAddress> {
        match *self {}
    }

    fn write(&self, _address: RemoteAddress, _bytes: &[u8]) -> InjectResult<()> {
        match *self {}
    }

    fn free(&self, _address: RemoteAddress) {
        match *self {}
    }

    fn run(&self, _routine: RemoteRoutine, _argument: usize) -> InjectResult<u32> {
        match *self {}
    }

    fn find_module(&self, _library: &Path) -> Option<usize> {
        match *self {}
    }
}
