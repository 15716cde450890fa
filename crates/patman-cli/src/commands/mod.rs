//! CLI command implementations for patman.

pub mod lifecycle;
pub mod session;
pub mod status;
