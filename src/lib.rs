// ABOUTME: Library root for cumulo - deployment orchestration decision core.
// ABOUTME: The main binary is in main.rs.

pub mod azure;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod failure;
pub mod output;
pub mod region;
pub mod types;
