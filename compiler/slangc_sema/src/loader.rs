//! The unit loader (§4.1): resolves imports into a dependency DAG, verifies
//! global acyclicity, and returns a topological load order.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::ast::{Import, Unit};
use crate::diagnostics::{codes, Reporter};

/// The result of successfully loading a closed set of units.
pub struct LoadedUnits {
    /// Dependencies-first topological order of unit names.
    pub order: Vec<String>,
    pub units: HashMap<String, Unit>,
    pub stdlib_modules: HashSet<String>,
    pub external_libraries: HashSet<String>,
}

/// Loads `root` plus every unit it transitively imports out of `available`
/// (the set of units a caller has already parsed and can hand over — parsing
/// itself is out of scope for this crate, see §4.1).
#[tracing::instrument(level = "debug", skip(available, reporter), fields(root = %root))]
pub fn load_units(
    root: &str,
    available: HashMap<String, Unit>,
    reporter: &mut Reporter,
) -> Option<LoadedUnits> {
    let mut stdlib_modules = HashSet::new();
    let mut external_libraries = HashSet::new();
    let mut edges: HashMap<String, Vec<String>> = HashMap::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut to_visit = vec![root.to_string()];

    while let Some(name) = to_visit.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        let Some(unit) = available.get(&name) else {
            reporter.error(codes::CE3003_MISSING_UNIT, format!("unit `{}` not found", name));
            return None;
        };
        debug!(unit = %name, path = %name, "visiting unit");

        let mut seen_imports = HashSet::new();
        let mut deps = Vec::new();
        for import in &unit.imports {
            match import {
                Import::Unit(dep) => {
                    if !seen_imports.insert(dep.clone()) {
                        reporter.warning(
                            codes::CW1003_DUPLICATE_IMPORT,
                            format!("duplicate import `{}` in unit `{}`", dep, name),
                        );
                        continue;
                    }
                    deps.push(dep.clone());
                    to_visit.push(dep.clone());
                }
                Import::Stdlib(module) => {
                    stdlib_modules.insert(module.clone());
                }
                Import::Library(lib) => {
                    external_libraries.insert(lib.clone());
                }
            }
        }
        edges.insert(name, deps);
    }

    let order = topo_sort(&edges, root, reporter)?;

    let units: HashMap<String, Unit> =
        visited.into_iter().filter_map(|name| available.get(&name).cloned().map(|u| (name, u))).collect();

    Some(LoadedUnits { order, units, stdlib_modules, external_libraries })
}

/// Kahn's-algorithm-style topological sort with explicit cycle reporting:
/// on finding a cycle, names every unit still stuck in it (§4.1).
fn topo_sort(edges: &HashMap<String, Vec<String>>, root: &str, reporter: &mut Reporter) -> Option<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> = edges.keys().map(|k| (k.as_str(), 0)).collect();
    for deps in edges.values() {
        for dep in deps {
            *in_degree.entry(dep.as_str()).or_insert(0) += 1;
        }
    }

    // Dependencies-first order: a unit with no remaining dependents-on-it-not-yet-emitted
    // is ready once all *its* dependencies have been emitted, so we sort by
    // in-degree of the *reversed* graph (who depends on whom).
    let mut depends_on_count: HashMap<&str, usize> =
        edges.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
    let mut ready: Vec<&str> = depends_on_count.iter().filter(|(_, &c)| c == 0).map(|(k, _)| *k).collect();
    ready.sort();

    let mut order = Vec::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (unit, deps) in edges {
        for dep in deps {
            dependents.entry(dep.as_str()).or_default().push(unit.as_str());
        }
    }

    while let Some(name) = ready.pop() {
        order.push(name.to_string());
        if let Some(parents) = dependents.get(name) {
            let mut newly_ready = Vec::new();
            for parent in parents {
                if let Some(c) = depends_on_count.get_mut(parent) {
                    *c -= 1;
                    if *c == 0 {
                        newly_ready.push(*parent);
                    }
                }
            }
            newly_ready.sort();
            ready.extend(newly_ready);
        }
    }

    if order.len() != edges.len() {
        let stuck: Vec<&str> =
            edges.keys().map(|s| s.as_str()).filter(|name| !order.contains(&name.to_string())).collect();
        reporter.error(
            codes::CE3002_IMPORT_CYCLE,
            format!("import cycle detected among units: {}", stuck.join(", ")),
        );
        return None;
    }

    debug!(root = %root, order = ?order, "topological load order computed");
    Some(order)
}
