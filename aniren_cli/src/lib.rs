//! aniren command line front end
//!
//! Configuration discovery and loading, console progress rendering and
//! terminal capability checks. The binary in `main.rs` wires these to the
//! core pipeline.

pub mod config;
pub mod progress;
pub mod terminal;
