//! Depth-first document traversal.

use crate::harvest::traits::{Candidate, ComponentIndex, Diagnostics, DocumentNode};

/// Returns the path to every visible component below `root`, in document order.
///
/// The root itself is not part of any path. Nodes whose name starts with `_`
/// are skipped together with their subtree, and components are never
/// descended into.
pub fn component_paths(root: &DocumentNode) -> Vec<Vec<&DocumentNode>> {
    let mut paths = Vec::new();
    let mut path = Vec::new();
    walk(root, &mut path, &mut paths);
    paths
}

fn walk<'a>(
    node: &'a DocumentNode,
    path: &mut Vec<&'a DocumentNode>,
    paths: &mut Vec<Vec<&'a DocumentNode>>,
) {
    for child in node.children.iter().filter(|c| !c.is_hidden()) {
        path.push(child);
        if child.is_component() {
            paths.push(path.clone());
        } else {
            walk(child, path, paths);
        }
        path.pop();
    }
}

/// Traverses `root` and builds one [`Candidate`] per visible component.
pub fn collect_candidates(
    root: &DocumentNode,
    components: &ComponentIndex,
    diagnostics: &mut Diagnostics,
) -> Vec<Candidate> {
    component_paths(root)
        .iter()
        .filter_map(|path| Candidate::build(path, components, diagnostics))
        .collect()
}
