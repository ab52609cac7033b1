//! Read-only planning over the registry
//!
//! Nothing here executes a recipe. [`install_order`] predicts the order in
//! which a session will reach each unit's recipe, for reporting before a run.
//! [`find_cycle`] is the optional `WouldCycle` pre-flight check: sessions
//! themselves tolerate cycles, so callers that want a hard error run this
//! first.

use super::registry::Registry;
use crate::core::error::InstallError;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A dependency cycle reachable from the requested units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WouldCycle {
    /// Units along the cycle; the first name is repeated at the end.
    pub path: Vec<String>,
}

impl fmt::Display for WouldCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join(" -> "))
    }
}

/// Predict the order in which a session will run recipes for `targets`.
///
/// Mirrors the session's walk exactly: a unit is marked before its
/// dependencies are visited, so a cycle is cut at the second visit instead
/// of being reported.
pub fn install_order<S: AsRef<str>>(
    registry: &Registry,
    targets: &[S],
) -> Result<Vec<String>, InstallError> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for target in targets {
        visit(registry, target.as_ref(), None, &mut seen, &mut order)?;
    }
    Ok(order)
}

fn visit(
    registry: &Registry,
    name: &str,
    requested_by: Option<&str>,
    seen: &mut HashSet<String>,
    order: &mut Vec<String>,
) -> Result<(), InstallError> {
    if seen.contains(name) {
        return Ok(());
    }
    let unit = registry
        .get(name)
        .ok_or_else(|| InstallError::UnitNotFound {
            name: name.to_string(),
            requested_by: requested_by.map(str::to_string),
        })?;
    seen.insert(name.to_string());
    for dep in unit.dependencies() {
        visit(registry, dep, Some(name), seen, order)?;
    }
    order.push(name.to_string());
    Ok(())
}

/// Node state for DFS traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    /// Not yet visited
    Unprocessed,
    /// Currently on the DFS path
    Processing,
    /// All dependencies explored
    Processed,
}

/// Look for a dependency cycle reachable from `targets`.
///
/// Uses iterative DFS with an explicit stack. The stack always holds exactly
/// the path from the current root, so a back edge yields the cycle directly.
/// Unknown names are skipped here; the session reports them as
/// `UnitNotFound`.
pub fn find_cycle<S: AsRef<str>>(registry: &Registry, targets: &[S]) -> Option<WouldCycle> {
    let mut state: HashMap<&str, NodeState> = HashMap::new();

    for target in targets {
        let Some(root) = registry.get(target.as_ref()) else {
            continue;
        };
        // Stack holds (node_name, index_of_next_dependency_to_visit)
        let mut stack: Vec<(&str, usize)> = vec![(root.name(), 0)];

        while let Some((node, dep_idx)) = stack.pop() {
            let deps = registry.get(node).map(|u| u.dependencies()).unwrap_or(&[]);

            match state.get(node).copied().unwrap_or(NodeState::Unprocessed) {
                NodeState::Processed => continue,
                NodeState::Processing => {
                    if dep_idx >= deps.len() {
                        state.insert(node, NodeState::Processed);
                        continue;
                    }
                }
                NodeState::Unprocessed => {
                    state.insert(node, NodeState::Processing);
                }
            }

            let mut descended = false;
            for (i, dep) in deps.iter().enumerate().skip(dep_idx) {
                let Some(dep_unit) = registry.get(dep) else {
                    continue;
                };
                let dep = dep_unit.name();
                match state.get(dep).copied().unwrap_or(NodeState::Unprocessed) {
                    NodeState::Unprocessed => {
                        stack.push((node, i + 1));
                        stack.push((dep, 0));
                        descended = true;
                        break;
                    }
                    NodeState::Processing => {
                        let start = stack.iter().position(|(n, _)| *n == dep);
                        let mut path: Vec<String> = match start {
                            Some(start) => stack[start..].iter().map(|(n, _)| n.to_string()).collect(),
                            None => Vec::new(),
                        };
                        path.push(node.to_string());
                        path.push(dep.to_string());
                        return Some(WouldCycle { path });
                    }
                    NodeState::Processed => {}
                }
            }

            if !descended {
                stack.push((node, deps.len()));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RecipeError;
    use crate::engine::recipe::RecipeOutcome;
    use crate::engine::settings::Settings;
    use crate::helpers::Toolbox;

    fn noop(_: &Settings, _: &Toolbox) -> Result<RecipeOutcome, RecipeError> {
        Ok(RecipeOutcome::Installed)
    }

    fn registry(edges: &[(&str, &[&str])]) -> Registry {
        let mut registry = Registry::new();
        for (name, deps) in edges {
            registry.register(name, noop, deps, true, Settings::new());
        }
        registry
    }

    #[test]
    fn test_install_order_dependencies_first() {
        let r = registry(&[("a", &[]), ("b", &["a"]), ("c", &["b", "a"])]);
        assert_eq!(install_order(&r, &["c"]).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_install_order_follows_request_order() {
        let r = registry(&[("a", &[]), ("b", &[]), ("c", &[])]);
        assert_eq!(
            install_order(&r, &["c", "a", "b"]).unwrap(),
            vec!["c", "a", "b"]
        );
    }

    #[test]
    fn test_install_order_deduplicates() {
        let r = registry(&[("a", &[]), ("b", &["a"])]);
        assert_eq!(install_order(&r, &["b", "a", "b"]).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_install_order_cycle_terminates() {
        let r = registry(&[("a", &["b"]), ("b", &["a"])]);
        assert_eq!(install_order(&r, &["a"]).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_install_order_missing_dependency() {
        let r = registry(&[("qemu", &["dtc"])]);
        let err = install_order(&r, &["qemu"]).unwrap_err();
        assert!(matches!(
            err,
            InstallError::UnitNotFound { ref name, requested_by: Some(ref parent) }
                if name == "dtc" && parent == "qemu"
        ));
    }

    #[test]
    fn test_find_cycle_none_for_dag() {
        let r = registry(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);
        assert_eq!(find_cycle(&r, &["c"]), None);
    }

    #[test]
    fn test_find_cycle_two_nodes() {
        let r = registry(&[("a", &["b"]), ("b", &["a"])]);
        let cycle = find_cycle(&r, &["a"]).unwrap();
        assert_eq!(cycle.path, vec!["a", "b", "a"]);
        assert_eq!(cycle.to_string(), "a -> b -> a");
    }

    #[test]
    fn test_find_cycle_reports_only_the_loop() {
        let r = registry(&[("root", &["x"]), ("x", &["y"]), ("y", &["z"]), ("z", &["x"])]);
        let cycle = find_cycle(&r, &["root"]).unwrap();
        assert_eq!(cycle.path, vec!["x", "y", "z", "x"]);
    }

    #[test]
    fn test_find_cycle_self_loop() {
        let r = registry(&[("a", &["a"])]);
        assert_eq!(find_cycle(&r, &["a"]).unwrap().path, vec!["a", "a"]);
    }

    #[test]
    fn test_find_cycle_unreachable_cycle_ignored() {
        let r = registry(&[("a", &[]), ("x", &["y"]), ("y", &["x"])]);
        assert_eq!(find_cycle(&r, &["a"]), None);
    }
}
