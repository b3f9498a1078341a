//! Core dependency resolution: breadth-first discovery, accumulated range
//! constraints per package name, highest-compatible-version selection, and
//! backtracking reassignment when a late requirer narrows a package that is
//! already assigned.

use std::collections::{HashMap, VecDeque};

use semver::Version;

use brix_core::dependency::{Dependency, DependencySource};
use brix_core::manifest::Manifest;
use brix_core::version::Range;
use brix_sources::{Candidate, PackageSource};
use brix_util::errors::BrixError;

use crate::conflict::{Requirer, UnresolvableConflict};
use crate::solution::{DependencyNode, Solution};

/// Safety valve on resolution passes. Every extra pass is triggered by a
/// newly narrowed pin, so real trees converge far earlier; an unsatisfiable
/// tree fails with a conflict, not by exhausting this bound.
const MAX_PASSES: usize = 64;

/// One entry in the discovery frontier.
struct Requirement {
    dependency: Dependency,
    required_by: String,
}

/// Candidates fetched for one package name, newest first.
struct Pool {
    kind: &'static str,
    candidates: Vec<Candidate>,
}

enum Pass {
    Solved(Solution),
    Narrowed { name: String, version: Version },
}

/// Resolve the full dependency closure of a root manifest.
///
/// Returns one node per package name in breadth-first discovery order,
/// which is deterministic for fixed provider responses. At most one version
/// per package name ever appears in a solution.
pub async fn resolve(root: &Manifest, sources: &impl PackageSource) -> miette::Result<Solution> {
    let mut pinned: HashMap<String, Version> = HashMap::new();

    for pass in 1..=MAX_PASSES {
        tracing::debug!(pass, pins = pinned.len(), "resolution pass");
        match run_pass(root, sources, &pinned).await? {
            Pass::Solved(solution) => {
                tracing::debug!(packages = solution.len(), "resolution complete");
                return Ok(solution);
            }
            Pass::Narrowed { name, version } => {
                tracing::debug!(%name, %version, "reassigning after conflicting requirement");
                pinned.insert(name, version);
            }
        }
    }

    Err(BrixError::Resolution {
        message: format!("Resolution did not converge after {MAX_PASSES} passes"),
    }
    .into())
}

/// Walk the tree once. Either every requirement is satisfied, or some
/// package needs a different version than greedy selection picked, in which
/// case the caller pins that version and re-walks so the discarded choice's
/// dependents are dropped with it.
async fn run_pass(
    root: &Manifest,
    sources: &impl PackageSource,
    pinned: &HashMap<String, Version>,
) -> miette::Result<Pass> {
    let mut frontier: VecDeque<Requirement> = root
        .dependencies
        .iter()
        .map(|dependency| Requirement {
            dependency: dependency.clone(),
            required_by: root.name.clone(),
        })
        .collect();

    let mut pools: HashMap<String, Pool> = HashMap::new();
    let mut constraints: HashMap<String, Vec<Requirer>> = HashMap::new();
    let mut assigned: HashMap<String, usize> = HashMap::new();
    let mut nodes: Vec<DependencyNode> = Vec::new();

    while let Some(requirement) = frontier.pop_front() {
        let name = requirement.dependency.name.clone();

        // One lookup per package name. Any version satisfying the
        // accumulated intersection also satisfies the first requirement's
        // own range, so the first pool is a superset of every later-valid
        // choice for this pass.
        if !pools.contains_key(&name) {
            let mut candidates = sources.lookup(&requirement.dependency).await?;
            candidates.sort_by(|a, b| b.version.cmp(&a.version));
            tracing::trace!(package = %name, count = candidates.len(), "fetched candidates");
            pools.insert(
                name.clone(),
                Pool {
                    kind: requirement.dependency.source.kind(),
                    candidates,
                },
            );
        }
        let pool = &pools[&name];

        // A package cannot be pulled from two different kinds of source.
        if pool.kind != requirement.dependency.source.kind() {
            return Err(BrixError::Resolution {
                message: format!(
                    "Package \"{name}\" is required from a {} source by \"{}\" but was already provided by a {} source",
                    requirement.dependency.source.kind(),
                    requirement.required_by,
                    pool.kind
                ),
            }
            .into());
        }

        constraints
            .entry(name.clone())
            .or_default()
            .push(requirer_for(&requirement, pool));
        let merged = merged_range(&constraints[&name]);

        if let Some(&index) = assigned.get(&name) {
            if merged.contains(&nodes[index].version) {
                // Already assigned and still consistent. Names, not manifest
                // instances, are the cycle-breaking key.
                continue;
            }
            // The new requirer rules out the current choice.
            return match best_candidate(pool, &merged) {
                Some(candidate) => Ok(Pass::Narrowed {
                    name,
                    version: candidate.version.clone(),
                }),
                None => Err(UnresolvableConflict::new(
                    name.clone(),
                    constraints.remove(&name).unwrap_or_default(),
                )
                .into_error()
                .into()),
            };
        }

        // Prefer a version pinned by an earlier pass while it still
        // satisfies everything seen so far; otherwise take the newest
        // satisfying candidate.
        let candidate = pinned
            .get(&name)
            .and_then(|version| pool.candidates.iter().find(|c| &c.version == version))
            .filter(|c| merged.contains(&c.version))
            .or_else(|| best_candidate(pool, &merged));

        let Some(candidate) = candidate else {
            return Err(UnresolvableConflict::new(
                name.clone(),
                constraints.remove(&name).unwrap_or_default(),
            )
            .into_error()
            .into());
        };

        tracing::debug!(package = %name, version = %candidate.version, "assigned");
        for dependency in &candidate.manifest.dependencies {
            frontier.push_back(Requirement {
                dependency: dependency.clone(),
                required_by: candidate.manifest.name.clone(),
            });
        }
        assigned.insert(name.clone(), nodes.len());
        nodes.push(DependencyNode {
            name,
            version: candidate.version.clone(),
            manifest: candidate.manifest.clone(),
            source: requirement.dependency.source.clone(),
        });
    }

    Ok(Pass::Solved(Solution::new(nodes)))
}

fn requirer_for(requirement: &Requirement, pool: &Pool) -> Requirer {
    let range = match &requirement.dependency.source {
        DependencySource::Registry { range } => range.clone(),
        // Git and path requirements carry no range; their single candidate's
        // version is the whole requirement.
        _ => pool
            .candidates
            .first()
            .map(|candidate| Range::exact(&candidate.version))
            .unwrap_or_else(Range::any),
    };
    Requirer {
        manifest: requirement.required_by.clone(),
        range,
    }
}

fn merged_range(requirers: &[Requirer]) -> Range {
    requirers
        .iter()
        .fold(Range::any(), |merged, requirer| {
            merged.intersect(&requirer.range)
        })
}

/// Newest candidate satisfying the range. Pools are sorted newest first, so
/// equal fits tie-break toward the higher version on its own total order.
fn best_candidate<'a>(pool: &'a Pool, range: &Range) -> Option<&'a Candidate> {
    pool.candidates
        .iter()
        .find(|candidate| range.contains(&candidate.version))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use brix_core::manifest::{Manifest, ManifestKind, Metadata};
    use brix_core::version::parse_version;

    /// In-memory package source with a fixed set of published packages.
    #[derive(Default)]
    struct StubSource {
        packages: HashMap<String, Vec<Candidate>>,
    }

    impl StubSource {
        fn publish(&mut self, name: &str, version: &str, deps: &[(&str, &str)]) {
            let manifest = manifest(name, version, deps);
            self.packages
                .entry(name.to_string())
                .or_default()
                .push(Candidate {
                    version: manifest.version.clone(),
                    manifest,
                });
        }
    }

    impl PackageSource for StubSource {
        async fn lookup(&self, dependency: &Dependency) -> miette::Result<Vec<Candidate>> {
            let candidates = self
                .packages
                .get(&dependency.name)
                .cloned()
                .unwrap_or_default();
            Ok(match dependency.source.range() {
                Some(range) => candidates
                    .into_iter()
                    .filter(|candidate| range.contains(&candidate.version))
                    .collect(),
                None => candidates,
            })
        }
    }

    fn manifest(name: &str, version: &str, deps: &[(&str, &str)]) -> Manifest {
        Manifest {
            name: name.to_string(),
            version: parse_version(version).unwrap(),
            kind: ManifestKind::Package,
            metadata: Metadata {
                authors: Vec::new(),
                publish: false,
            },
            src: Vec::new(),
            dependencies: deps
                .iter()
                .map(|(dep_name, range)| Dependency {
                    name: dep_name.to_string(),
                    source: DependencySource::Registry {
                        range: Range::parse(range).unwrap(),
                    },
                })
                .collect(),
            references: Vec::new(),
            targets: Vec::new(),
            dir: PathBuf::from("/stub"),
        }
    }

    fn names_and_versions(solution: &Solution) -> Vec<(String, String)> {
        solution
            .nodes()
            .iter()
            .map(|node| (node.name.clone(), node.version.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn no_dependencies_resolves_empty() {
        let sources = StubSource::default();
        let root = manifest("root", "0.0.0", &[]);
        let solution = resolve(&root, &sources).await.unwrap();
        assert!(solution.is_empty());
    }

    #[tokio::test]
    async fn simple_tree_in_discovery_order() {
        let mut sources = StubSource::default();
        sources.publish("a", "1.2.0", &[("b", "^0.5")]);
        sources.publish("b", "0.5.3", &[]);

        let root = manifest("root", "0.0.0", &[("a", "^1.0")]);
        let solution = resolve(&root, &sources).await.unwrap();
        assert_eq!(
            names_and_versions(&solution),
            vec![
                ("a".to_string(), "1.2.0".to_string()),
                ("b".to_string(), "0.5.3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn newest_compatible_version_wins() {
        let mut sources = StubSource::default();
        sources.publish("a", "1.0.0", &[]);
        sources.publish("a", "1.4.1", &[]);
        sources.publish("a", "2.0.0", &[]);

        let root = manifest("root", "0.0.0", &[("a", "^1.0")]);
        let solution = resolve(&root, &sources).await.unwrap();
        assert_eq!(solution.get("a").unwrap().version.to_string(), "1.4.1");
    }

    #[tokio::test]
    async fn late_requirer_narrows_assigned_package() {
        // a's requirement is seen first and greedily picks c 1.5.0; b's
        // narrower requirement arrives later and forces a reassignment to
        // 1.1.0, which satisfies both.
        let mut sources = StubSource::default();
        sources.publish("a", "1.0.0", &[("c", "^1.0")]);
        sources.publish("b", "1.0.0", &[("c", ">=1.0, <1.2")]);
        sources.publish("c", "1.1.0", &[]);
        sources.publish("c", "1.5.0", &[]);

        let root = manifest("root", "0.0.0", &[("a", "^1.0"), ("b", "^1.0")]);
        let solution = resolve(&root, &sources).await.unwrap();
        assert_eq!(solution.get("c").unwrap().version.to_string(), "1.1.0");
    }

    #[tokio::test]
    async fn reassignment_discards_stale_subtree() {
        // c 1.5.0 pulls in d; after backtracking to c 1.1.0 (which does
        // not), d must not remain in the solution.
        let mut sources = StubSource::default();
        sources.publish("a", "1.0.0", &[("c", "^1.0")]);
        sources.publish("b", "1.0.0", &[("c", ">=1.0, <1.2")]);
        sources.publish("c", "1.5.0", &[("d", "^1.0")]);
        sources.publish("c", "1.1.0", &[]);
        sources.publish("d", "1.0.0", &[]);

        let root = manifest("root", "0.0.0", &[("a", "^1.0"), ("b", "^1.0")]);
        let solution = resolve(&root, &sources).await.unwrap();
        assert_eq!(solution.get("c").unwrap().version.to_string(), "1.1.0");
        assert!(solution.get("d").is_none());
    }

    #[tokio::test]
    async fn disjoint_ranges_report_both_requirers() {
        let mut sources = StubSource::default();
        sources.publish("a", "1.0.0", &[("p", "^1.0.0")]);
        sources.publish("b", "1.0.0", &[("p", "^2.0.0")]);
        sources.publish("p", "1.2.0", &[]);
        sources.publish("p", "2.3.0", &[]);

        let root = manifest("root", "0.0.0", &[("a", "^1.0"), ("b", "^1.0")]);
        let err = resolve(&root, &sources).await.unwrap_err();
        let rendered = format!("{err}");
        assert!(rendered.contains("\"p\""));
        assert!(rendered.contains("\"a\" requires p ^1.0.0"));
        assert!(rendered.contains("\"b\" requires p ^2.0.0"));
    }

    #[tokio::test]
    async fn missing_package_is_a_conflict() {
        let sources = StubSource::default();
        let root = manifest("root", "0.0.0", &[("ghost", "^1.0")]);
        let err = resolve(&root, &sources).await.unwrap_err();
        assert!(format!("{err}").contains("\"ghost\""));
    }

    #[tokio::test]
    async fn every_requirement_is_satisfied() {
        let mut sources = StubSource::default();
        sources.publish("a", "1.3.0", &[("shared", "^1.0")]);
        sources.publish("b", "2.1.0", &[("shared", "^1.2")]);
        sources.publish("shared", "1.1.0", &[]);
        sources.publish("shared", "1.4.0", &[]);

        let root = manifest("root", "0.0.0", &[("a", "^1.0"), ("b", "^2.0")]);
        let solution = resolve(&root, &sources).await.unwrap();

        // Soundness: the assigned version satisfies every requirer's range.
        let shared = solution.get("shared").unwrap();
        for node in solution.nodes() {
            for dep in &node.manifest.dependencies {
                if dep.name == "shared" {
                    assert!(dep.source.range().unwrap().contains(&shared.version));
                }
            }
        }
        assert_eq!(shared.version.to_string(), "1.4.0");
    }

    #[tokio::test]
    async fn identical_inputs_identical_solutions() {
        let mut sources = StubSource::default();
        sources.publish("a", "1.0.0", &[("c", "^1.0"), ("d", "^1.0")]);
        sources.publish("b", "1.0.0", &[("d", "^1.0")]);
        sources.publish("c", "1.2.0", &[]);
        sources.publish("d", "1.0.5", &[]);

        let root = manifest("root", "0.0.0", &[("a", "^1.0"), ("b", "^1.0")]);
        let first = resolve(&root, &sources).await.unwrap();
        let second = resolve(&root, &sources).await.unwrap();
        assert_eq!(names_and_versions(&first), names_and_versions(&second));
        assert_eq!(
            names_and_versions(&first),
            vec![
                ("a".to_string(), "1.0.0".to_string()),
                ("b".to_string(), "1.0.0".to_string()),
                ("c".to_string(), "1.2.0".to_string()),
                ("d".to_string(), "1.0.5".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn circular_requirements_terminate() {
        let mut sources = StubSource::default();
        sources.publish("a", "1.0.0", &[("b", "^1.0")]);
        sources.publish("b", "1.0.0", &[("a", "^1.0")]);

        let root = manifest("root", "0.0.0", &[("a", "^1.0")]);
        let solution = resolve(&root, &sources).await.unwrap();
        assert_eq!(solution.len(), 2);
    }

    #[tokio::test]
    async fn path_requirement_pins_its_candidate() {
        let mut sources = StubSource::default();
        sources.publish("local", "0.1.0", &[("a", "^1.0")]);
        sources.publish("a", "1.0.0", &[]);

        let mut root = manifest("root", "0.0.0", &[]);
        root.dependencies.push(Dependency {
            name: "local".to_string(),
            source: DependencySource::Path {
                path: PathBuf::from("/stub/local"),
            },
        });

        let solution = resolve(&root, &sources).await.unwrap();
        assert_eq!(solution.get("local").unwrap().version.to_string(), "0.1.0");
        assert!(solution.get("a").is_some());
    }

    #[tokio::test]
    async fn mixed_source_kinds_are_rejected() {
        let mut sources = StubSource::default();
        sources.publish("a", "1.0.0", &[("dual", "^1.0")]);
        sources.publish("dual", "1.0.0", &[]);

        let mut root = manifest("root", "0.0.0", &[("a", "^1.0")]);
        root.dependencies.push(Dependency {
            name: "dual".to_string(),
            source: DependencySource::Path {
                path: PathBuf::from("/stub/dual"),
            },
        });

        let err = resolve(&root, &sources).await.unwrap_err();
        assert!(format!("{err}").contains("\"dual\""));
    }
}
