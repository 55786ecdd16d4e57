//! Tests for the CLI module
//!
//! Argument parsing and TOML configuration merging.
