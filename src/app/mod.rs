//! Application layer: command line, configuration and the session run loops

pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod runner;
pub mod startup;
