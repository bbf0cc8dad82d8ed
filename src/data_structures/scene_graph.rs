//! Scene graph access.
//!
//! The exporter never owns the scene it writes. It reads it through the
//! [`SceneGraph`] trait, a set of read-only queries a host implements over
//! its own representation. [`Scene`] is the in-memory host used by the file
//! loaders and the tests.
//!
//! The graph is a DAG: a node may have several parents, and every distinct
//! root-to-node [`NodePath`] is one placement (instance) of that node.

use cgmath::{Matrix4, Rad, SquareMatrix};

use crate::{
    config::Resolution,
    data_structures::{
        material::{ShaderAssignment, ShaderId, ShaderNode, ShadingGroup, ShadingGroupId},
        mesh::PolygonMesh,
    },
};

pub type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Transform,
    Mesh,
    Camera,
    Light,
}

/// Boolean node attributes the exporter asks for. Hosts return `None` when a
/// node kind does not carry the attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Visibility,
    Intermediate,
    Renderable,
}

/// A camera shape. The camera looks down its local -Z axis with +Y up.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraShape {
    pub orthographic: bool,
    pub horizontal_fov: Rad<f64>,
}

impl Default for CameraShape {
    fn default() -> Self {
        Self {
            orthographic: false,
            // 54.43 degrees, the usual 35mm default
            horizontal_fov: Rad(0.95),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LightShape {
    /// Shines along the light's local -Z axis, local +Z points at the sun.
    Directional { shadow_samples: u32 },
    /// A 2x2 quad in the light's local XY plane.
    Area {
        color: [f32; 3],
        intensity: f32,
        shadow_samples: u32,
    },
    Other { type_name: String },
}

/// Read-only queries over a host scene graph.
pub trait SceneGraph {
    fn roots(&self) -> &[NodeId];

    fn children(&self, node: NodeId) -> &[NodeId];

    fn name(&self, node: NodeId) -> &str;

    fn kind(&self, node: NodeId) -> NodeKind;

    fn attribute(&self, node: NodeId, attribute: Attribute) -> Option<bool>;

    /// Transform relative to the parent, column vector convention.
    fn local_transform(&self, node: NodeId) -> Matrix4<f64>;

    fn mesh(&self, node: NodeId) -> Option<&PolygonMesh>;

    fn camera(&self, node: NodeId) -> Option<&CameraShape>;

    fn light(&self, node: NodeId) -> Option<&LightShape>;

    /// Shading groups connected to placement `instance` of a geometry node.
    fn connected_shaders(&self, node: NodeId, instance: usize) -> ShaderAssignment;

    /// Every shading group of the scene, in host order.
    fn shading_groups(&self) -> Vec<ShadingGroupId>;

    fn shading_group(&self, group: ShadingGroupId) -> Option<&ShadingGroup>;

    fn shader(&self, shader: ShaderId) -> Option<&ShaderNode>;

    /// Output resolution configured in the host, if any.
    fn resolution(&self) -> Option<Resolution>;
}

/// One placement of a node: the ids from a root down to the node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<NodeId>);

impl NodePath {
    pub fn root(node: NodeId) -> Self {
        Self(vec![node])
    }

    pub fn child(&self, node: NodeId) -> Self {
        let mut ids = self.0.clone();
        ids.push(node);
        Self(ids)
    }

    /// The node this path leads to.
    pub fn node(&self) -> NodeId {
        // paths are never empty, they are built from `root`
        self.0[self.0.len() - 1]
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.0.contains(&node)
    }

    /// `|root|child|node`
    pub fn full_name<G: SceneGraph + ?Sized>(&self, graph: &G) -> String {
        self.0
            .iter()
            .map(|&id| format!("|{}", graph.name(id)))
            .collect()
    }

    /// Object to world transform: the product of all local transforms from
    /// the root down, the node's own included.
    pub fn world_transform<G: SceneGraph + ?Sized>(&self, graph: &G) -> Matrix4<f64> {
        self.0
            .iter()
            .fold(Matrix4::identity(), |acc, &id| acc * graph.local_transform(id))
    }
}

#[derive(Clone, Debug)]
pub enum NodePayload {
    Transform,
    Mesh {
        mesh: PolygonMesh,
        /// Indexed by instance number.
        shaders: Vec<ShaderAssignment>,
    },
    Camera(CameraShape),
    Light(LightShape),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub local: Matrix4<f64>,
    pub payload: NodePayload,
    pub visibility: Option<bool>,
    pub intermediate: Option<bool>,
    pub renderable: Option<bool>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, payload: NodePayload) -> Self {
        Self {
            name: name.into(),
            local: Matrix4::identity(),
            payload,
            visibility: None,
            intermediate: None,
            renderable: None,
            children: Vec::new(),
        }
    }

    pub fn transform(name: impl Into<String>) -> Self {
        Self::new(name, NodePayload::Transform)
    }

    pub fn with_local(mut self, local: Matrix4<f64>) -> Self {
        self.local = local;
        self
    }
}

/// Arena backed scene graph.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    groups: Vec<ShadingGroup>,
    shaders: Vec<ShaderNode>,
    pub resolution: Option<Resolution>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node without attaching it anywhere.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_root(&mut self, node: Node) -> NodeId {
        let id = self.add_node(node);
        self.roots.push(id);
        id
    }

    /// Makes an already added node a root.
    pub fn set_root(&mut self, node: NodeId) {
        if !self.roots.contains(&node) {
            self.roots.push(node);
        }
    }

    /// Attaches `child` below `parent`. Attaching the same child to several
    /// parents instances it.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        } else {
            log::warn!("Cannot attach node {} to unknown parent {}", child, parent);
        }
    }

    pub fn add_shader(&mut self, shader: ShaderNode) -> ShaderId {
        self.shaders.push(shader);
        self.shaders.len() - 1
    }

    pub fn add_shading_group(&mut self, group: ShadingGroup) -> ShadingGroupId {
        self.groups.push(group);
        self.groups.len() - 1
    }

    pub fn set_attribute(&mut self, node: NodeId, attribute: Attribute, value: bool) {
        if let Some(node) = self.nodes.get_mut(node) {
            match attribute {
                Attribute::Visibility => node.visibility = Some(value),
                Attribute::Intermediate => node.intermediate = Some(value),
                Attribute::Renderable => node.renderable = Some(value),
            }
        }
    }

    /// Sets the shader assignment of placement `instance` of a mesh node.
    pub fn assign_shaders(&mut self, node: NodeId, instance: usize, assignment: ShaderAssignment) {
        match self.nodes.get_mut(node).map(|n| &mut n.payload) {
            Some(NodePayload::Mesh { shaders, .. }) => {
                if shaders.len() <= instance {
                    shaders.resize(instance + 1, ShaderAssignment::default());
                }
                shaders[instance] = assignment;
            }
            _ => log::warn!("Node {} is not a mesh, shader assignment ignored", node),
        }
    }
}

impl SceneGraph for Scene {
    fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn name(&self, node: NodeId) -> &str {
        self.nodes.get(node).map(|n| n.name.as_str()).unwrap_or("")
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        match self.nodes.get(node).map(|n| &n.payload) {
            Some(NodePayload::Mesh { .. }) => NodeKind::Mesh,
            Some(NodePayload::Camera(_)) => NodeKind::Camera,
            Some(NodePayload::Light(_)) => NodeKind::Light,
            Some(NodePayload::Transform) | None => NodeKind::Transform,
        }
    }

    fn attribute(&self, node: NodeId, attribute: Attribute) -> Option<bool> {
        let node = self.nodes.get(node)?;
        match attribute {
            Attribute::Visibility => node.visibility,
            Attribute::Intermediate => node.intermediate,
            Attribute::Renderable => node.renderable,
        }
    }

    fn local_transform(&self, node: NodeId) -> Matrix4<f64> {
        self.nodes
            .get(node)
            .map(|n| n.local)
            .unwrap_or_else(Matrix4::identity)
    }

    fn mesh(&self, node: NodeId) -> Option<&PolygonMesh> {
        match &self.nodes.get(node)?.payload {
            NodePayload::Mesh { mesh, .. } => Some(mesh),
            _ => None,
        }
    }

    fn camera(&self, node: NodeId) -> Option<&CameraShape> {
        match &self.nodes.get(node)?.payload {
            NodePayload::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    fn light(&self, node: NodeId) -> Option<&LightShape> {
        match &self.nodes.get(node)?.payload {
            NodePayload::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Placements without an assignment of their own inherit the first one.
    fn connected_shaders(&self, node: NodeId, instance: usize) -> ShaderAssignment {
        match self.nodes.get(node).map(|n| &n.payload) {
            Some(NodePayload::Mesh { shaders, .. }) => shaders
                .get(instance)
                .or_else(|| shaders.first())
                .cloned()
                .unwrap_or_default(),
            _ => ShaderAssignment::default(),
        }
    }

    fn shading_groups(&self) -> Vec<ShadingGroupId> {
        (0..self.groups.len()).collect()
    }

    fn shading_group(&self, group: ShadingGroupId) -> Option<&ShadingGroup> {
        self.groups.get(group)
    }

    fn shader(&self, shader: ShaderId) -> Option<&ShaderNode> {
        self.shaders.get(shader)
    }

    fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }
}
