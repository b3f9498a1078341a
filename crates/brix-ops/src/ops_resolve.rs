//! Operation: resolve dependencies and print the solution.

use std::path::Path;

use brix_core::manifest::Manifest;
use brix_sources::SourceSet;
use brix_util::progress::{spinner, status};

/// Resolve the project's dependency closure and print one line per package
/// in discovery order.
pub async fn resolve(project_root: &Path, offline: bool) -> miette::Result<()> {
    let root = Manifest::from_dir(project_root)?;
    status("Resolving", &root.id());

    let sources = SourceSet::new(project_root, offline)?;
    let progress = spinner("resolving dependency graph");
    let solution = brix_resolver::resolve(&root, &sources).await;
    progress.finish_and_clear();
    let solution = solution?;

    if solution.is_empty() {
        println!("{} has no dependencies", root.name);
        return Ok(());
    }
    for node in solution.nodes() {
        println!("{} v{} ({})", node.name, node.version, node.source.kind());
    }
    Ok(())
}
