//! Operation: build the project (resolve, fetch, assemble, package).

use std::path::{Path, PathBuf};
use std::time::Instant;

use brix_build::graph::BuildGraph;
use brix_core::manifest::Manifest;
use brix_core::target::{Target, TargetType};
use brix_sources::SourceSet;
use brix_util::errors::BrixError;
use brix_util::progress::{spinner, status, status_info};

use crate::package;

/// Options for a build invocation.
#[derive(Default)]
pub struct BuildOptions {
    /// Package only targets of this container type.
    pub target: Option<String>,
    /// Use only cached dependencies.
    pub offline: bool,
    pub verbose: bool,
}

/// Result of a build operation.
pub struct BuildResult {
    pub graph: BuildGraph,
    /// Container files written, one per packaged target.
    pub outputs: Vec<PathBuf>,
}

/// Run the full build pipeline.
pub async fn build(project_root: &Path, opts: &BuildOptions) -> miette::Result<BuildResult> {
    let start = Instant::now();

    let root = Manifest::from_dir(project_root)?;
    status("Resolving", &root.id());

    let sources = SourceSet::new(project_root, opts.offline)?;
    let progress = spinner("resolving dependency graph");
    let solution = brix_resolver::resolve(&root, &sources).await;
    progress.finish_and_clear();
    let solution = solution?;

    // Materialize each resolved package's contents on disk and reload its
    // manifest from there, so component loading sees real source paths.
    let mut resolved = Vec::with_capacity(solution.len());
    for node in solution.nodes() {
        status("Fetching", &format!("{} v{}", node.name, node.version));
        let manifest = sources
            .materialize(&node.name, &node.version, &node.source)
            .await?;
        resolved.push(manifest);
    }

    let graph = brix_build::assemble(&root, &resolved).await?;
    if opts.verbose {
        for component in &graph.components {
            status_info(
                "Component",
                &format!("{} ({})", component.name, component.origin),
            );
        }
    }

    let mut outputs = Vec::new();
    for target in selected_targets(&root, opts.target.as_deref())? {
        status("Packaging", &format!("{} ({})", target.filename, target.kind));
        outputs.push(package::package_target(project_root, target)?);
    }

    status(
        "Finished",
        &format!("{} in {:.2}s", graph.summary(), start.elapsed().as_secs_f64()),
    );
    for output in &outputs {
        status_info("Output", &output.display().to_string());
    }

    Ok(BuildResult { graph, outputs })
}

/// The targets this invocation should package.
///
/// With no `--target` every declared target is packaged; a project without
/// targets simply builds nothing. A named type must match at least one
/// declared target.
fn selected_targets<'a>(root: &'a Manifest, only: Option<&str>) -> miette::Result<Vec<&'a Target>> {
    let Some(only) = only else {
        return Ok(root.targets.iter().collect());
    };
    let kind = TargetType::parse(only).ok_or_else(|| BrixError::Generic {
        message: format!("Unknown target type \"{only}\" (expected xlsx, xlsm, or xlam)"),
    })?;
    let selected: Vec<&Target> = root.targets.iter().filter(|t| t.kind == kind).collect();
    if selected.is_empty() {
        return Err(BrixError::Generic {
            message: format!("Project \"{}\" declares no {kind} target", root.name),
        }
        .into());
    }
    Ok(selected)
}
