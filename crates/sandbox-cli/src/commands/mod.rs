//! CLI command handlers.

pub mod launch;
pub mod reset;
pub mod serve;
pub mod status;
