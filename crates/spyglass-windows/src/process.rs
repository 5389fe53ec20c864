use std::ffi::c_void;
use std::path::{Path, PathBuf};

use spyglass_core::{
    EntryPoint, ForeignProcessExecutor, InjectError, InjectResult, RemoteAddress, RemoteProcess,
    RemoteRoutine, WindowHandle, log_debug, log_warn,
};

use windows::Win32::Foundation::{GetLastError, HANDLE, HMODULE, LPARAM, WAIT_OBJECT_0, WPARAM};
use windows::Win32::System::Diagnostics::Debug::WriteProcessMemory;
use windows::Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress};
use windows::Win32::System::Memory::{
    MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_READWRITE, VirtualAllocEx, VirtualFreeEx,
};
use windows::Win32::System::ProcessStatus::{K32EnumProcessModules, K32GetModuleFileNameExW};
use windows::Win32::System::Threading::{
    CreateRemoteThread, GetCurrentProcess, GetCurrentProcessId, GetExitCodeThread, INFINITE,
    IsWow64Process, LPTHREAD_START_ROUTINE, OpenProcess, PROCESS_CREATE_THREAD, PROCESS_QUERY_INFORMATION,
    PROCESS_VM_OPERATION, PROCESS_VM_READ, PROCESS_VM_WRITE, WaitForSingleObject,
};
use windows::Win32::UI::WindowsAndMessaging::{
    SMTO_ABORTIFHUNG, SMTO_BLOCK, SendMessageTimeoutW, WM_GETTEXT,
};
use windows::core::{s, w};

use crate::handle::OwnedHandle;
use crate::window::hwnd;

/// How long the passive text probe waits on a busy window.
const TEXT_PROBE_TIMEOUT_MS: u32 = 500;

/// Upper bound on modules scanned when recovering a load result.
const MAX_MODULES: usize = 1024;

/// Whether `process` runs under WOW64. `None` when the query fails.
fn is_wow64(process: HANDLE) -> Option<bool> {
    let mut flag = Default::default();
    // SAFETY: IsWow64Process writes one BOOL we own. The handle carries
    // PROCESS_QUERY_INFORMATION or is the current-process pseudo handle.
    unsafe { IsWow64Process(process, &mut flag) }.ok()?;
    Some(flag.as_bool())
}

/// Resolves links and `..` so a module path and a requested path compare
/// equal when they name the same file. Falls back to the path as given.
fn normalized(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn same_file(a: &Path, b: &Path) -> bool {
    let (a, b) = (normalized(a), normalized(b));
    a.to_string_lossy().eq_ignore_ascii_case(&b.to_string_lossy())
}

fn last_error() -> String {
    // SAFETY: GetLastError reads thread-local state.
    let code = unsafe { GetLastError() };
    format!("error {}", code.0)
}

/// [`ForeignProcessExecutor`] over kernel32.
///
/// Entry points are resolved in this process. kernel32 is mapped at the
/// same base in every process of a session, so the addresses are valid
/// in the target too. Processes of the other bitness (a 32-bit target
/// under WOW64 seen from a 64-bit inspector, or the reverse) report
/// [`RemoteProcess::shares_architecture`] as false and are never run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Executor;

impl ForeignProcessExecutor for Win32Executor {
    type Process = Win32Process;

    fn local_pid(&self) -> u32 {
        // SAFETY: GetCurrentProcessId has no preconditions.
        unsafe { GetCurrentProcessId() }
    }

    fn open(&self, pid: u32) -> InjectResult<Win32Process> {
        let access = PROCESS_CREATE_THREAD
            | PROCESS_QUERY_INFORMATION
            | PROCESS_VM_OPERATION
            | PROCESS_VM_WRITE
            | PROCESS_VM_READ;
        // SAFETY: OpenProcess either returns a handle we now own or fails.
        let handle = unsafe { OpenProcess(access, false, pid) }.map_err(|e| InjectError::Open {
            pid,
            reason: e.to_string(),
        })?;
        Ok(Win32Process {
            handle: OwnedHandle::new(handle),
        })
    }

    fn entry_point(&self, entry: EntryPoint) -> InjectResult<RemoteRoutine> {
        let symbol = entry.symbol();
        let resolve_error = |reason: String| InjectError::EntryPoint { symbol, reason };

        // SAFETY: kernel32 is loaded in every process; the handle is not
        // reference counted and needs no release.
        let kernel32 = unsafe { GetModuleHandleW(w!("kernel32.dll")) }
            .map_err(|e| resolve_error(e.to_string()))?;
        let name = match entry {
            EntryPoint::LoadLibrary => s!("LoadLibraryW"),
            EntryPoint::FreeLibrary => s!("FreeLibrary"),
        };
        // SAFETY: `name` is a static null-terminated ANSI string.
        let address = unsafe { GetProcAddress(kernel32, name) }
            .ok_or_else(|| resolve_error(last_error()))?;

        Ok(RemoteRoutine {
            entry,
            address: RemoteAddress::new(address as usize),
        })
    }

    fn probe_text(&self, window: WindowHandle) -> Option<String> {
        let mut buffer = [0u16; 256];
        let mut copied = 0usize;
        // SAFETY: WM_GETTEXT writes at most `buffer.len()` characters into
        // our buffer. SMTO_ABORTIFHUNG keeps a hung target from blocking us.
        let result = unsafe {
            SendMessageTimeoutW(
                hwnd(window),
                WM_GETTEXT,
                WPARAM(buffer.len()),
                LPARAM(buffer.as_mut_ptr() as isize),
                SMTO_ABORTIFHUNG | SMTO_BLOCK,
                TEXT_PROBE_TIMEOUT_MS,
                Some(&mut copied as *mut usize),
            )
        };
        if result.0 == 0 {
            return None;
        }
        Some(String::from_utf16_lossy(&buffer[..copied.min(buffer.len())]))
    }
}

/// An opened foreign process. The handle closes on drop.
#[derive(Debug)]
pub struct Win32Process {
    handle: OwnedHandle,
}

impl Win32Process {
    /// Full path of a module loaded in the target.
    fn module_path(&self, module: HMODULE) -> Option<PathBuf> {
        let mut buffer = [0u16; 260];
        // SAFETY: K32GetModuleFileNameExW writes into our buffer, up to its
        // length. The process handle has PROCESS_VM_READ access.
        let length =
            unsafe { K32GetModuleFileNameExW(Some(self.handle.raw()), Some(module), &mut buffer) };
        (length > 0).then(|| PathBuf::from(String::from_utf16_lossy(&buffer[..length as usize])))
    }
}

impl RemoteProcess for Win32Process {
    fn shares_architecture(&self) -> bool {
        // SAFETY: GetCurrentProcess returns a pseudo handle that needs no
        // release.
        let local = is_wow64(unsafe { GetCurrentProcess() });
        let target = is_wow64(self.handle.raw());
        match (local, target) {
            (Some(local), Some(target)) => local == target,
            _ => {
                log_warn!("inject: could not query WOW64 state of the target");
                false
            }
        }
    }

    fn allocate(&self, size: usize) -> InjectResult<RemoteAddress> {
        // SAFETY: VirtualAllocEx reserves fresh pages in the target; the
        // returned region is released by `free`.
        let address = unsafe {
            VirtualAllocEx(
                self.handle.raw(),
                None,
                size,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_READWRITE,
            )
        };
        if address.is_null() {
            return Err(InjectError::Allocate {
                size,
                reason: last_error(),
            });
        }
        Ok(RemoteAddress::new(address as usize))
    }

    fn write(&self, address: RemoteAddress, bytes: &[u8]) -> InjectResult<()> {
        let mut written = 0usize;
        // SAFETY: `address` came from `allocate` with at least `bytes.len()`
        // bytes, and `bytes` is a live local slice.
        unsafe {
            WriteProcessMemory(
                self.handle.raw(),
                address.raw() as *const c_void,
                bytes.as_ptr().cast(),
                bytes.len(),
                Some(&mut written as *mut usize),
            )
        }
        .map_err(|e| InjectError::Write(e.to_string()))?;

        if written != bytes.len() {
            return Err(InjectError::Write(format!(
                "wrote {written} of {} bytes",
                bytes.len()
            )));
        }
        Ok(())
    }

    fn free(&self, address: RemoteAddress) {
        // SAFETY: `address` is the base of a region from VirtualAllocEx;
        // MEM_RELEASE requires a zero size.
        if let Err(e) =
            unsafe { VirtualFreeEx(self.handle.raw(), address.raw() as *mut c_void, 0, MEM_RELEASE) }
        {
            log_warn!("inject: could not free remote buffer 0x{:X}: {e}", address.raw());
        }
    }

    fn run(&self, routine: RemoteRoutine, argument: usize) -> InjectResult<u32> {
        // SAFETY: `routine.address` is a kernel32 export taking one
        // pointer-sized argument, which matches the thread start signature.
        let start: LPTHREAD_START_ROUTINE = unsafe { std::mem::transmute(routine.address.raw()) };

        // SAFETY: The target handle carries PROCESS_CREATE_THREAD. The
        // argument is either a remote buffer or a module handle, both
        // valid inside the target.
        let thread = unsafe {
            CreateRemoteThread(
                self.handle.raw(),
                None,
                0,
                start,
                Some(argument as *const c_void),
                0,
                None,
            )
        }
        .map_err(|e| InjectError::Thread {
            symbol: routine.entry.symbol(),
            reason: e.to_string(),
        })?;
        let thread = OwnedHandle::new(thread);

        // SAFETY: Waiting on and querying a thread handle we own.
        unsafe {
            if WaitForSingleObject(thread.raw(), INFINITE) != WAIT_OBJECT_0 {
                log_warn!("inject: wait on remote {} failed", routine.entry.symbol());
                return Ok(0);
            }
            let mut exit_code = 0u32;
            if let Err(e) = GetExitCodeThread(thread.raw(), &mut exit_code) {
                log_warn!("inject: no exit code from remote {}: {e}", routine.entry.symbol());
                return Ok(0);
            }
            Ok(exit_code)
        }
    }

    fn find_module(&self, library: &Path) -> Option<usize> {
        let mut modules = vec![HMODULE::default(); MAX_MODULES];
        let mut needed = 0u32;
        // SAFETY: K32EnumProcessModules fills at most `cb` bytes of our
        // vector and reports the size it needed.
        unsafe {
            K32EnumProcessModules(
                self.handle.raw(),
                modules.as_mut_ptr(),
                (modules.len() * size_of::<HMODULE>()) as u32,
                &mut needed,
            )
        }
        .ok()?;

        let count = (needed as usize / size_of::<HMODULE>()).min(modules.len());
        let found = modules[..count]
            .iter()
            .find(|module| {
                self.module_path(**module)
                    .is_some_and(|path| same_file(&path, library))
            })
            .map(|module| module.0 as usize);

        if found.is_none() {
            log_debug!(
                "inject: {} not among {count} modules of the target",
                library.display()
            );
        }
        found
    }
}
