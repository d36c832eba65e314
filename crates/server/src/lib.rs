//! Jsonshop server library.
//!
//! Product catalog, nested reviews and carts persisted as flat JSON
//! collections, exposed over a JSON HTTP API. Built as a library so the CLI
//! and the integration tests can reuse the repositories and router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;
