//! Bazaar storefront library.
//!
//! A JSON API over a file-backed catalog: products, their owning users,
//! stored assets and an admin surface guarded by signed session tokens.
//! The binary in `main.rs` wires this into a server; the CLI and the
//! integration tests use it directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
