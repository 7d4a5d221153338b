//! Subcommand implementations.

pub mod config;
pub mod models;
pub mod run;
pub mod tags;
