//! Core shared library for LaunchGate.
//!
//! This crate exposes the primitives the other LaunchGate crates depend on:
//! common errors, configuration loading, the SQLite pool wrapper and logging
//! setup.

pub mod config;
pub mod db;
pub mod errors;
pub mod logging;

pub use errors::{LaunchGateError, Result as CoreResult};
