//! Jsonshop Core - Shared domain types.
//!
//! This crate provides the types used across all Jsonshop components:
//! - `server` - JSON HTTP backend over flat-file collections
//! - `cli` - Command-line tools for seeding and exporting data
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no storage
//! access, no HTTP. Persistence lives in the server crate.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, validated names and ratings, and the
//!   product/review/cart records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
