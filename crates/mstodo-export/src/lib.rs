/*
[INPUT]:  Public API exports for mstodo-export crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod export;
pub mod row;

// Re-export main types for convenience
pub use export::{run_export, ExportOptions};
pub use row::{map_task, TodoistRow, OUTPUT_HEADER};
