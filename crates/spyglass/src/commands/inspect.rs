#[cfg(windows)]
pub fn execute() {
    use spyglass_core::{config, log_error};

    use crate::report::ConsoleSink;

    let config = config::load();
    super::start_logging(&config.logging);
    spyglass_windows::dpi::enable_dpi_awareness();

    let library = config
        .inject
        .enabled
        .then(|| config.inject.library_path(&super::exe_dir()));
    if let Some(library) = &library
        && !library.exists()
    {
        eprintln!(
            "Warning: {} not found; foreign-process probes will fail.",
            library.display()
        );
    }

    println!("Press the left button on the finder and drag it over any window.");
    println!("Close the Spyglass window to quit.");

    if let Err(e) = spyglass_windows::inspector::run(&config, library, ConsoleSink::default()) {
        log_error!("inspector: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
pub fn execute() {
    super::unsupported("the inspector window");
}
