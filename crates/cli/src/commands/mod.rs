//! Subcommand implementations.
//!
//! Each module is self-contained: it loads its own environment,
//! opens its own pool, and reports through `tracing`.

pub mod admin;
pub mod migrate;
pub mod seed;
