//! Host-side data structures: the scene graph and what hangs off its nodes.
//!
//! - `scene_graph` holds the read-only host interface and the in-memory scene
//! - `mesh` contains polygon meshes and the triangle buffers derived from them
//! - `material` contains shading nodes, shading groups and exported materials

pub mod material;
pub mod mesh;
pub mod scene_graph;
