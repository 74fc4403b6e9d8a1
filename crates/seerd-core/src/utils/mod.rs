//! Small pure helpers shared across crates.

mod args;

pub use args::split_arguments;
