//! CLI command implementations.

pub mod backup;
pub mod common;
pub mod config;
pub mod install;
pub mod resources;
pub mod status;
