//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: functions return strings and never talk
//! to the engine.

pub mod process_display;
pub mod tables;

// Re-export commonly used items
pub use process_display::{
    format_cpu_time, format_memory, format_uptime, process_details, process_row, process_table_header,
};
pub use tables::{format_optional, print_separator, truncate_string};
