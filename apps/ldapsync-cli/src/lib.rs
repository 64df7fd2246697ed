//! ldapsync CLI library
//!
//! Command implementations and their configuration, logging and output
//! helpers. The binary entry point is in main.rs.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
