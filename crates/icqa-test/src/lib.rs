//! Shared test fixtures for ICQA crates.
//!
//! This crate provides sample databases, constraint sets, and query catalogs
//! for testing. It depends only on `icqa-core`, so every other crate can use
//! it as a dev-dependency without cycles.
//!
//! - [`orders`] - customer/orders databases with known conflicts, the
//!   constraint set that detects them, and a small query catalog
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! icqa-test = { workspace = true }
//! ```

pub mod orders;

pub use orders::{clean_database, dc_set_spec, violated_database};
