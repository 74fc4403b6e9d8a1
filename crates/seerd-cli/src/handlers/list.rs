//! List command handler.
//!
//! Displays every supervised process in registration order.

use chrono::Utc;
use seerd_core::ProcessSupervisor;

use crate::presentation::{print_separator, process_row, process_table_header};

/// Execute the list command.
pub fn execute(supervisor: &dyn ProcessSupervisor) {
    let records = supervisor.get_all();

    if records.is_empty() {
        println!("No processes are currently being monitored.");
        return;
    }

    println!("{}", process_table_header());
    print_separator(80);

    let now = Utc::now();
    for record in &records {
        println!("{}", process_row(record, now));
    }
}
