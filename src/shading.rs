//! Shader resolution and material deduplication.
//!
//! Geometry is assigned to shading groups; each group points at one or more
//! upstream shading nodes. The first of those that can be expressed as a
//! diffuse material names the material. Anything else resolves to the
//! `default` material.

use std::collections::HashSet;

use log::{info, warn};

use crate::data_structures::{
    material::{Material, MaterialRef, ShaderKind, ShaderNode, ShadingGroupId},
    scene_graph::{NodeId, SceneGraph},
};

/// Capability check for the diffuse material kind.
pub fn try_extract_diffuse(shader: &ShaderNode) -> Option<Material> {
    match &shader.kind {
        ShaderKind::Lambert {
            color,
            diffuse_coeff,
        } => Some(Material::new(
            shader.name.clone(),
            [
                color[0] * diffuse_coeff,
                color[1] * diffuse_coeff,
                color[2] * diffuse_coeff,
            ],
        )),
        ShaderKind::Unsupported { .. } => None,
    }
}

/// The material a shading group resolves to, if any of its surface shaders
/// is supported.
pub fn material_from_group<G: SceneGraph + ?Sized>(
    graph: &G,
    group: ShadingGroupId,
) -> Option<Material> {
    graph
        .shading_group(group)?
        .surface_shaders
        .iter()
        .filter_map(|&shader| graph.shader(shader))
        .find_map(try_extract_diffuse)
}

/// Materials known to one export, in first-discovery order.
#[derive(Debug, Default)]
pub struct ShaderRegistry {
    names: HashSet<String>,
    materials: Vec<Material>,
    pending: Vec<Material>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks every shading group of the scene once and records each
    /// extractable material the first time its name shows up.
    pub fn discover<G: SceneGraph + ?Sized>(graph: &G) -> Self {
        let mut registry = Self::new();
        for group in graph.shading_groups() {
            if let Some(material) = material_from_group(graph, group) {
                if registry.register(material.clone()) {
                    info!("Found surface shader: {}", material.name);
                }
            }
        }
        registry
    }

    /// Returns `false` when a material with that name is already known; the
    /// known one wins.
    pub fn register(&mut self, material: Material) -> bool {
        if material.is_default() || self.names.contains(&material.name) {
            return false;
        }
        self.names.insert(material.name.clone());
        self.materials.push(material);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Materials first seen while resolving geometry, not yet written.
    pub fn take_pending(&mut self) -> Vec<Material> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// One material reference per shading group connected to placement
    /// `instance` of `node`. Never empty: no assignment means `default`.
    pub fn resolve_shaders<G: SceneGraph + ?Sized>(
        &mut self,
        graph: &G,
        node: NodeId,
        instance: usize,
    ) -> Vec<MaterialRef> {
        let assignment = graph.connected_shaders(node, instance);
        if assignment.groups.is_empty() {
            return vec![MaterialRef::default_material()];
        }
        assignment
            .groups
            .iter()
            .map(|&group| match material_from_group(graph, group) {
                Some(material) => {
                    let name = MaterialRef(material.name.clone());
                    // groups the pre-pass never saw still need a definition
                    // before the geometry that uses them
                    if self.register(material.clone()) {
                        self.pending.push(material);
                    }
                    name
                }
                None => {
                    let group_name = graph
                        .shading_group(group)
                        .map(|g| g.name.as_str())
                        .unwrap_or("<unknown>");
                    warn!(
                        "Shading group {} on {} has no supported surface shader, using {}",
                        group_name,
                        graph.name(node),
                        MaterialRef::default_material()
                    );
                    MaterialRef::default_material()
                }
            })
            .collect()
    }
}
