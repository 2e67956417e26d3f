//! Command-line interface
//!
//! Argument definitions and command handlers for the `moving-window`
//! binary.

pub mod args;
pub mod commands;
