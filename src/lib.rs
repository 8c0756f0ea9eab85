// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod config;
pub mod optimizer;
pub mod report;
pub mod table;
