//! Business logic services for the storefront.
//!
//! - [`assets`] - Filesystem asset storage with traversal protection
//! - [`auth`] - Credential login and session tokens
//! - [`remote`] - HTTP client for remote catalogs and images

pub mod assets;
pub mod auth;
pub mod remote;
