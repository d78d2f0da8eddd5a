//! Shared test fixtures for GridPlace crates.
//!
//! This crate depends only on `gridplace-core` so that every other crate can
//! take it as a dev-dependency.
//!
//! - [`fixtures`] - seeded stores and directories (the soi6 pair scenario)
//! - [`faulty`] - a placement store with injectable write failures and latency
//! - [`cache`] - a cache invalidator that records calls and can fail
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! gridplace-test = { workspace = true }
//! ```
//!
//! ```
//! use gridplace_test::fixtures;
//!
//! let (store, a, b) = fixtures::soi6_pair();
//! assert_eq!(store.occupied_count("soi6"), 2);
//! assert_ne!(a.id, b.id);
//! ```

pub mod cache;
pub mod faulty;
pub mod fixtures;

pub use cache::RecordingCache;
pub use faulty::FaultyStore;
pub use fixtures::Actors;
