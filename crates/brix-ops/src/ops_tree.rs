//! Operation: display the resolved dependency tree.

use std::path::Path;

use brix_core::manifest::Manifest;
use brix_resolver::graph::ResolvedGraph;
use brix_sources::SourceSet;

/// Options for `brix tree`.
#[derive(Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Use only cached dependencies.
    pub offline: bool,
}

/// Resolve the project and print its dependency tree.
pub async fn tree(project_root: &Path, opts: &TreeOptions) -> miette::Result<()> {
    let root = Manifest::from_dir(project_root)?;
    let sources = SourceSet::new(project_root, opts.offline)?;
    let solution = brix_resolver::resolve(&root, &sources).await?;

    let graph = ResolvedGraph::from_solution(&root, &solution);
    print!("{}", graph.print_tree(opts.depth));
    Ok(())
}
