use std::path::{Path, PathBuf};

use clap::Args;

use spyglass_core::config::{self, InjectConfig};
use spyglass_core::{InjectionRequest, RemoteInjector, WindowHandle, log_error};

/// Arguments for the `inject` subcommand.
#[derive(Args)]
pub struct InjectArgs {
    /// Target process id
    #[arg(long)]
    pid: u32,
    /// Companion library to load, relative to the current directory
    /// (defaults to the configured one)
    #[arg(long)]
    library: Option<PathBuf>,
}

pub fn execute(args: &InjectArgs) {
    let config = config::load();
    super::start_logging(&config.logging);

    let library = library_path(args.library.as_deref(), &config.inject, &super::exe_dir());
    let request = InjectionRequest {
        pid: args.pid,
        library,
        // No window to fall back on when the process cannot be opened.
        window: WindowHandle::new(0),
    };

    let injector = RemoteInjector::new(executor());
    match injector.try_inject(&request) {
        Ok(module) => println!(
            "Loaded {} into process {} at 0x{module:X} and unloaded it.",
            request.library.display(),
            request.pid
        ),
        Err(e) => {
            log_error!("inject: pid {}: {e}", request.pid);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// The library to load, always absolute so the target's loader never
/// searches its own paths for it.
fn library_path(arg: Option<&Path>, inject: &InjectConfig, exe_dir: &Path) -> PathBuf {
    match arg {
        Some(path) => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
        None => inject.library_path(exe_dir),
    }
}

#[cfg(windows)]
fn executor() -> spyglass_windows::Win32Executor {
    spyglass_windows::Win32Executor
}

#[cfg(not(windows))]
fn executor() -> spyglass_core::UnsupportedExecutor {
    spyglass_core::UnsupportedExecutor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_library_argument_becomes_absolute() {
        // Arrange
        let inject = InjectConfig::default();
        let exe_dir = std::env::temp_dir();

        // Act
        let path = library_path(Some(Path::new("helper.dll")), &inject, &exe_dir);

        // Assert
        assert!(path.is_absolute());
        assert_eq!(path, std::env::current_dir().unwrap().join("helper.dll"));
    }

    #[test]
    fn missing_library_argument_uses_configured_library() {
        let inject = InjectConfig::default();
        let exe_dir = std::env::temp_dir();

        let path = library_path(None, &inject, &exe_dir);

        assert_eq!(path, inject.library_path(&exe_dir));
        assert!(path.is_absolute());
    }
}
