//! Info command handler.

use seerd_core::ProcessSupervisor;

use crate::presentation::process_details;

/// Print every field of one process, or a not-found notice.
pub fn execute(supervisor: &dyn ProcessSupervisor, name: &str) {
    let Some(record) = supervisor.get_info(name) else {
        println!("Process {name} not found");
        return;
    };

    for (label, value) in process_details(&record) {
        println!("{:<18} {value}", format!("{label}:"));
    }
}
