use clap::Args;

/// Arguments for the `probe` subcommand.
#[derive(Args)]
pub struct ProbeArgs {
    /// X screen coordinate in pixels
    #[arg(long, allow_negative_numbers = true)]
    x: i32,
    /// Y screen coordinate in pixels
    #[arg(long, allow_negative_numbers = true)]
    y: i32,
    /// Print the raw report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[cfg(windows)]
pub fn execute(args: &ProbeArgs) {
    use spyglass_core::{Point, WindowProbe};

    spyglass_windows::dpi::enable_dpi_awareness();

    let probe = WindowProbe::new(spyglass_windows::Win32Windows);
    let report = probe.report(Point::new(args.x, args.y));

    if args.json {
        match crate::report::json(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else if report.metadata.is_none() {
        println!("No window at ({}, {}).", args.x, args.y);
    } else {
        println!("{}", crate::report::table(&report));
    }
}

#[cfg(not(windows))]
pub fn execute(_args: &ProbeArgs) {
    super::unsupported("window probing");
}
