//! Console rendering of probe reports.
#![cfg_attr(not(windows), allow(dead_code))]

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};

use spyglass_core::{DisplayFields, FinderState, MetadataSink, ProbeReport, WindowHandle};

/// The thirteen display fields as a two-column table.
pub fn table(report: &ProbeReport) -> Table {
    let fields = DisplayFields::from_report(report);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Field"), Cell::new("Value")]);
    for (label, value) in fields.labeled() {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table
}

pub fn json(report: &ProbeReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Prints a table whenever the window under the finder changes.
///
/// Cursor-only updates over the same window are not reprinted.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    shown: Option<Option<WindowHandle>>,
}

impl ConsoleSink {
    /// Whether `report` differs from what was last printed. Records it.
    fn is_new(&mut self, report: &ProbeReport) -> bool {
        let handle = report.handle();
        if self.shown == Some(handle) {
            return false;
        }
        self.shown = Some(handle);
        true
    }
}

impl MetadataSink for ConsoleSink {
    fn publish(&mut self, report: &ProbeReport) {
        if self.is_new(report) {
            println!("{}", table(report));
        }
    }

    fn finder_changed(&mut self, state: FinderState) {
        match state {
            FinderState::Gone => println!("Capturing..."),
            FinderState::Home => {
                self.shown = None;
                println!("Released.");
            }
        }
    }
}
