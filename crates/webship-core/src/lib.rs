//! Webship Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain logic** - remote path normalization, the retention policy,
//!   and the deployment error kinds
//! - **Configuration** - typed config with validation and a builder
//! - **Port definitions** - Traits for adapters: `IRemoteStore`,
//!   `ILocalTree`, `IProgressSink`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement; the mirror
//! engine in `webship-sync` orchestrates the domain through those ports.

pub mod config;
pub mod domain;
pub mod ports;
