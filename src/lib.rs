//! `moving-window` - Moving-window self-paced reading trials
//!
//! This library provides the trial controller for the moving-window
//! paradigm, a headless rendering surface with scripted replay, trial
//! configuration, reading-measure preparation, and constrained stimulus
//! list randomization.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod randomize;
pub mod script;
pub mod surface;
pub mod trial;
