//! CLI command handlers, one per file.

mod config;
mod exec;
mod table;

pub use config::run_config;
pub use exec::{run_exec, ExecArgs};
pub use table::run_table;
