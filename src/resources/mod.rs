use std::path::Path;

use anyhow::Context;

use crate::data_structures::{
    material::{ShaderAssignment, ShaderNode, ShadingGroup, ShadingGroupId},
    scene_graph::{Node, NodePayload, Scene},
};

/**
 * This module contains all logic for building a scene from external files.
 */
pub mod mesh;
pub mod node;

/// Diffuse colour for obj materials that don't set `Kd`.
const OBJ_DEFAULT_DIFFUSE: [f32; 3] = [0.7, 0.7, 0.7];

/// Loads a scene file, picking the loader by extension.
pub fn load_scene(path: impl AsRef<Path>) -> anyhow::Result<Scene> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("obj") => load_scene_obj(path),
        Some("gltf") | Some("glb") => load_scene_gltf(path),
        _ => anyhow::bail!("Unsupported scene file {}", path.display()),
    }
}

pub fn load_scene_obj(path: impl AsRef<Path>) -> anyhow::Result<Scene> {
    let path = path.as_ref();
    let options = tobj::LoadOptions {
        single_index: false,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &options)
        .with_context(|| format!("Cannot load obj file {}", path.display()))?;
    let materials = materials.unwrap_or_else(|err| {
        log::warn!(
            "Materials of {} could not be loaded, using the default material: {}",
            path.display(),
            err
        );
        Vec::new()
    });

    let mut scene = Scene::new();
    let groups: Vec<ShadingGroupId> = materials
        .iter()
        .map(|material| {
            let shader = scene.add_shader(ShaderNode::lambert(
                material.name.as_str(),
                material.diffuse.unwrap_or(OBJ_DEFAULT_DIFFUSE),
                1.0,
            ));
            scene.add_shading_group(ShadingGroup {
                name: format!("{}SG", material.name),
                surface_shaders: vec![shader],
            })
        })
        .collect();

    for (idx, model) in models.iter().enumerate() {
        let name = if model.name.is_empty() {
            format!("model{}", idx)
        } else {
            model.name.clone()
        };
        let mesh = mesh::obj_polygon_mesh(model);
        let assignment = match model.mesh.material_id.and_then(|m| groups.get(m)) {
            Some(&group) => ShaderAssignment {
                groups: vec![group],
                face_groups: Vec::new(),
            },
            None => ShaderAssignment::default(),
        };
        let transform = scene.add_root(Node::transform(name.as_str()));
        let shape = scene.add_node(Node::new(
            format!("{}Shape", name),
            NodePayload::Mesh {
                mesh,
                shaders: vec![assignment],
            },
        ));
        scene.add_child(transform, shape);
    }
    log::info!(
        "Loaded {} obj models and {} materials from {}",
        models.len(),
        materials.len(),
        path.display()
    );
    Ok(scene)
}

pub fn load_scene_gltf(path: impl AsRef<Path>) -> anyhow::Result<Scene> {
    let path = path.as_ref();
    let gltf = gltf::Gltf::open(path)
        .with_context(|| format!("Cannot load gltf file {}", path.display()))?;
    let buffers = gltf::import_buffers(&gltf.document, path.parent(), gltf.blob.clone())
        .with_context(|| format!("Cannot load the buffers of {}", path.display()))?;

    let mut scene = Scene::new();
    let mut converter = node::GltfConverter::new(&mut scene, &gltf.document, &buffers);
    let Some(root) = gltf.default_scene().or_else(|| gltf.scenes().next()) else {
        log::warn!("{} contains no scene", path.display());
        return Ok(scene);
    };
    for node in root.nodes() {
        let id = converter.convert_node(&mut scene, node)?;
        scene.set_root(id);
    }
    Ok(scene)
}
