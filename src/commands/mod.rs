// ABOUTME: Command implementations for the CLI
// ABOUTME: Exports apply (set replica identity) and status (inspect it)

pub mod apply;
pub mod status;

pub use apply::{apply, ApplyOptions};
pub use status::{status, TableStatus};
