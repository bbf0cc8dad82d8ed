//! Instance planning.
//!
//! A node reachable through more than one path is instanced: its geometry is
//! written once, in object space, and every visible placement gets a small
//! instance record with its own transform and shaders.

use std::collections::HashMap;

use log::warn;

use crate::{
    data_structures::scene_graph::{NodeId, NodePath, SceneGraph},
    visibility::is_effectively_visible,
};

/// All placements of every node, numbered the way the host numbers them:
/// pre-order, children in order.
#[derive(Debug, Default)]
pub struct DagIndex {
    paths: HashMap<NodeId, Vec<NodePath>>,
}

impl DagIndex {
    pub fn build<G: SceneGraph + ?Sized>(graph: &G) -> Self {
        let mut index = Self::default();
        let mut stack: Vec<NodePath> = graph
            .roots()
            .iter()
            .rev()
            .map(|&root| NodePath::root(root))
            .collect();
        while let Some(path) = stack.pop() {
            for &child in graph.children(path.node()).iter().rev() {
                if path.contains(child) {
                    warn!(
                        "Cycle below {}: {} is its own ancestor, not following it",
                        path.full_name(graph),
                        graph.name(child)
                    );
                    continue;
                }
                stack.push(path.child(child));
            }
            index.paths.entry(path.node()).or_default().push(path);
        }
        index
    }

    pub fn paths_to(&self, node: NodeId) -> &[NodePath] {
        self.paths.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_instanced(&self, node: NodeId) -> bool {
        self.paths_to(node).len() > 1
    }

    /// Position of `path` among all placements of its node.
    pub fn instance_number(&self, path: &NodePath) -> usize {
        self.paths_to(path.node())
            .iter()
            .position(|p| p == path)
            .unwrap_or(0)
    }
}

/// The placements of a shared geometry that get an instance record.
#[derive(Clone, Debug, PartialEq)]
pub struct InstancePlan {
    /// Placement that writes the shared geometry.
    pub owner: NodePath,
    /// Effectively visible placements, owner included when visible.
    pub members: Vec<NodePath>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Placement {
    /// Written in place with its world transform.
    Unique(NodePath),
    Instanced(InstancePlan),
    /// Another placement of the same geometry writes it.
    NotOwner,
    Hidden,
}

pub fn plan_instancing<G: SceneGraph + ?Sized>(
    graph: &G,
    index: &DagIndex,
    path: &NodePath,
) -> Placement {
    let node = path.node();
    if !index.is_instanced(node) {
        return if is_effectively_visible(graph, path) {
            Placement::Unique(path.clone())
        } else {
            Placement::Hidden
        };
    }
    if index.instance_number(path) != 0 {
        return Placement::NotOwner;
    }
    let members: Vec<NodePath> = index
        .paths_to(node)
        .iter()
        .filter(|p| is_effectively_visible(graph, p))
        .cloned()
        .collect();
    if members.is_empty() {
        return Placement::Hidden;
    }
    Placement::Instanced(InstancePlan {
        owner: path.clone(),
        members,
    })
}
