//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStore`] - Remote tree operations over the deployment transport
//! - [`ILocalTree`] - Read-only view of the local build output tree
//! - [`IProgressSink`] - Operator-facing progress reporting

pub mod local_tree;
pub mod progress;
pub mod remote_store;

pub use local_tree::ILocalTree;
pub use progress::{IProgressSink, NullProgress};
pub use remote_store::{IRemoteStore, RemoteEntry, RemoteEntryKind};
