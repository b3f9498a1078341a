//! Core data types for the brix package manager.
//!
//! This crate defines the fundamental types that represent a brix project:
//! manifest parsing, version ranges, dependency source descriptors,
//! COM-style references, and build targets.
//!
//! This crate is intentionally free of async code and network I/O.

/// Name of the manifest file at a package or project root.
pub const MANIFEST_FILENAME: &str = "brix.toml";

pub mod dependency;
pub mod manifest;
pub mod reference;
pub mod target;
pub mod version;
