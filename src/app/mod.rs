//! Application module: command line, configuration and the `run` handler

pub mod cli;
pub mod handler;
pub mod startup;
