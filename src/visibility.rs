//! Export eligibility of scene nodes.
//!
//! Not every node kind carries every attribute, so a missing attribute always
//! falls back to the permissive value.

use crate::data_structures::scene_graph::{Attribute, NodeId, NodePath, SceneGraph};

/// Visible and not an intermediate (construction history) node.
pub fn is_visible<G: SceneGraph + ?Sized>(graph: &G, node: NodeId) -> bool {
    let visible = graph.attribute(node, Attribute::Visibility).unwrap_or(true);
    let intermediate = graph
        .attribute(node, Attribute::Intermediate)
        .unwrap_or(false);
    visible && !intermediate
}

/// The node and every ancestor on this path are visible.
pub fn is_effectively_visible<G: SceneGraph + ?Sized>(graph: &G, path: &NodePath) -> bool {
    path.ids().iter().all(|&node| is_visible(graph, node))
}

/// Cameras carry their own renderable switch, independent of visibility.
pub fn is_renderable<G: SceneGraph + ?Sized>(graph: &G, node: NodeId) -> bool {
    graph.attribute(node, Attribute::Renderable).unwrap_or(true)
}
