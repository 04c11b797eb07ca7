//! CLI command implementations.

pub mod catalog;
pub mod history;
pub mod init;
pub mod session;
