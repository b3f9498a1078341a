//! Build graph assembly.
//!
//! Merges the root project manifest and every resolved dependency manifest
//! into one validated [`BuildGraph`]: components load concurrently and come
//! back sorted by name, references collapse to their first occurrence, and
//! the global uniqueness invariants are checked over the merged sets with
//! every violation collected before failing.

use std::collections::BTreeMap;

use tokio::task::JoinSet;

use brix_core::manifest::Manifest;
use brix_util::errors::BrixError;
use brix_util::text::join_commas;

use crate::component::Component;
use crate::graph::{BuildGraph, GraphReference, Origin, PROJECT_NAME};

/// Merge the root project manifest and its resolved dependencies into a
/// validated build graph.
///
/// `resolved` must keep resolver order: the merged declaration order (root
/// first, then each dependency) decides which duplicate reference wins and
/// how diagnostics name contributors.
pub async fn assemble(project: &Manifest, resolved: &[Manifest]) -> miette::Result<BuildGraph> {
    let manifests: Vec<(&Manifest, Origin)> = std::iter::once((project, Origin::Project))
        .chain(
            resolved
                .iter()
                .map(|manifest| (manifest, Origin::Dependency(manifest.name.clone()))),
        )
        .collect();

    let mut components = load_components(&manifests).await?;
    let references = collect_references(&manifests);

    let mut violations = Vec::new();
    check_component_names(&components, &project.name, &mut violations);
    check_reference_versions(&references, &project.name, &mut violations);
    if !violations.is_empty() {
        return Err(BrixError::Build {
            message: violations.join("\n"),
        }
        .into());
    }

    components.sort_by(|a, b| a.name.cmp(&b.name));

    let graph = BuildGraph {
        name: PROJECT_NAME.to_string(),
        components,
        references,
    };
    tracing::debug!(
        components = graph.components.len(),
        references = graph.references.len(),
        "build graph assembled"
    );
    Ok(graph)
}

/// Load every declared source entry across all manifests.
///
/// Loads fan out concurrently; completion order depends on I/O latency, so
/// results are buffered back into declaration order before anything is
/// returned. A failed load surfaces the first failure in declaration order,
/// after letting in-flight loads drain.
async fn load_components(manifests: &[(&Manifest, Origin)]) -> miette::Result<Vec<Component>> {
    let mut set: JoinSet<(usize, miette::Result<Component>)> = JoinSet::new();
    let mut total = 0;
    for (manifest, origin) in manifests {
        for entry in &manifest.src {
            if entry.optional && !entry.path.is_file() {
                tracing::debug!(
                    component = %entry.name,
                    path = %entry.path.display(),
                    "skipping absent optional component"
                );
                continue;
            }
            let index = total;
            total += 1;
            let entry = entry.clone();
            let origin = origin.clone();
            set.spawn(async move { (index, Component::load(entry, origin).await) });
        }
    }

    let mut slots: Vec<Option<miette::Result<Component>>> = (0..total).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        let (index, result) = joined.map_err(|e| BrixError::Component {
            message: format!("Component load task failed: {e}"),
        })?;
        slots[index] = Some(result);
    }

    let mut components = Vec::with_capacity(total);
    for slot in slots {
        components.push(slot.expect("one result per spawned load")?);
    }
    Ok(components)
}

/// Gather references in first-seen order, collapsing exact re-declarations.
///
/// Only a fully identical reference (name, guid, and version) is dropped; a
/// same-named reference at a different version is kept so validation can
/// report the clash instead of silently discarding one side.
fn collect_references(manifests: &[(&Manifest, Origin)]) -> Vec<GraphReference> {
    let mut references: Vec<GraphReference> = Vec::new();
    for (manifest, origin) in manifests {
        for reference in &manifest.references {
            if references
                .iter()
                .any(|existing| existing.reference == *reference)
            {
                continue;
            }
            references.push(GraphReference {
                reference: reference.clone(),
                origin: origin.clone(),
            });
        }
    }
    references
}

/// No two manifests may declare a source component with the same name.
fn check_component_names(
    components: &[Component],
    project_name: &str,
    violations: &mut Vec<String>,
) {
    let mut by_name: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for component in components {
        by_name
            .entry(&component.name)
            .or_default()
            .push(format!("\"{}\"", component.origin.manifest_name(project_name)));
    }
    for (name, contributors) in by_name {
        if contributors.len() > 1 {
            violations.push(format!(
                "Component \"{name}\" is declared by {}",
                join_commas(&contributors)
            ));
        }
    }
}

/// No two references may share a name but disagree on major.minor.
fn check_reference_versions(
    references: &[GraphReference],
    project_name: &str,
    violations: &mut Vec<String>,
) {
    let mut by_name: BTreeMap<&str, Vec<&GraphReference>> = BTreeMap::new();
    for entry in references {
        by_name.entry(&entry.reference.name).or_default().push(entry);
    }
    for (name, entries) in by_name {
        let mut versions: Vec<String> = Vec::new();
        for entry in &entries {
            let version = entry.reference.version();
            if !versions.contains(&version) {
                versions.push(version);
            }
        }
        if versions.len() > 1 {
            let declared: Vec<String> = entries
                .iter()
                .map(|entry| {
                    format!(
                        "{} (by \"{}\")",
                        entry.reference.version(),
                        entry.origin.manifest_name(project_name)
                    )
                })
                .collect();
            violations.push(format!(
                "Reference \"{name}\" is declared at conflicting versions: {}",
                join_commas(&declared)
            ));
        }
    }
}
