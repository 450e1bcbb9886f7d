//! Directory service library crate.
//!
//! # Purpose
//! Persists the access-control catalog, memberships, and protected records,
//! and answers authorization questions over them through [`Authorizer`].
//!
//! # Notes
//! All decision logic lives in `commons_authz`; this crate only loads
//! snapshots and renders scope queries for its storage backends.
pub mod authorizer;
pub mod config;
pub mod observability;
pub mod seed;
pub mod store;

pub use authorizer::Authorizer;
pub use config::{DirectoryConfig, PostgresConfig, StorageBackend};
pub use store::{AccessStore, StoreError, StoreResult};
