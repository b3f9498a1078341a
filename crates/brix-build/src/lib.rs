//! Component loading and build-graph assembly.
//!
//! Takes the root manifest plus the resolved dependency manifests and merges
//! their declared source components and references into one de-duplicated,
//! validated [`graph::BuildGraph`] ready for packaging.

pub mod assemble;
pub mod component;
pub mod graph;

pub use assemble::assemble;
pub use component::Component;
pub use graph::{BuildGraph, Origin};
