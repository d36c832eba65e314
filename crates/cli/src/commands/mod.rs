//! CLI subcommands.

pub mod export;
pub mod seed;
