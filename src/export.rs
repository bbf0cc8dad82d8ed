//! The export pass.
//!
//! One breadth-first walk over every placement in the scene. Settings,
//! the default material and all discovered materials go out first, then one
//! block per exported node in traversal order. The whole scene is written to
//! an in-memory buffer; a file is only touched once the walk succeeded.

use std::{collections::VecDeque, io::Write, path::Path};

use anyhow::Context as _;
use cgmath::{Deg, InnerSpace, Point3, Transform, Vector3};
use instant::Instant;
use log::{debug, info};

use crate::{
    config::ExportSettings,
    context::{ExportSession, ExportStats},
    data_structures::{
        material::{DEFAULT_MATERIAL, Material},
        scene_graph::{LightShape, NodeKind, NodePath, SceneGraph},
    },
    instancing::{Placement, plan_instancing},
    triangulate::triangulate,
    visibility::{is_effectively_visible, is_renderable},
    writer::{ObjectPlacement, SceneWriter},
};

/// Corners of an area light in its local frame.
const AREA_LIGHT_QUAD: [[f64; 3]; 4] = [
    [-1.0, 1.0, 0.0],
    [1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
];

/// Exports `graph` into `out`.
pub fn export_scene<G, W>(
    graph: &G,
    settings: &ExportSettings,
    out: W,
) -> anyhow::Result<ExportStats>
where
    G: SceneGraph + ?Sized,
    W: Write,
{
    settings.validate()?;
    let start = Instant::now();
    let mut session = ExportSession::new(graph, settings);
    let mut writer = SceneWriter::new(out);

    writer.write_image(
        session.resolution,
        (settings.aa_min, settings.aa_max),
        &settings.filter,
    )?;
    writer.write_shader(&Material::new(DEFAULT_MATERIAL, settings.default_diffuse))?;
    for material in session.shaders.materials() {
        writer.write_shader(material)?;
    }

    for path in breadth_first(graph) {
        match graph.kind(path.node()) {
            NodeKind::Mesh => export_mesh(graph, &mut session, &mut writer, &path)?,
            NodeKind::Camera => export_camera(graph, &mut session, &mut writer, &path)?,
            NodeKind::Light => export_light(graph, &mut session, &mut writer, &path)?,
            NodeKind::Transform => {}
        }
    }
    writer.flush()?;

    info!(
        "Exporting scene done in {:?}: {:?}",
        start.elapsed(),
        session.stats
    );
    Ok(session.stats)
}

/// Exports `graph` to the file at `path`. Nothing is written when the export
/// fails before the file is opened.
pub fn export_to_file<G: SceneGraph + ?Sized>(
    graph: &G,
    settings: &ExportSettings,
    path: impl AsRef<Path>,
) -> anyhow::Result<ExportStats> {
    let path = path.as_ref();
    info!("Exporting scene to: {} ...", path.display());
    let mut buffer = Vec::new();
    let stats = export_scene(graph, settings, &mut buffer)?;
    std::fs::write(path, &buffer)
        .with_context(|| format!("Cannot write scene file {}", path.display()))?;
    Ok(stats)
}

/// Every placement of every node, level by level.
pub fn breadth_first<G: SceneGraph + ?Sized>(graph: &G) -> Vec<NodePath> {
    let mut order = Vec::new();
    let mut queue: VecDeque<NodePath> = graph.roots().iter().map(|&r| NodePath::root(r)).collect();
    while let Some(path) = queue.pop_front() {
        for &child in graph.children(path.node()) {
            // cycles are reported once when the dag index is built
            if !path.contains(child) {
                queue.push_back(path.child(child));
            }
        }
        order.push(path);
    }
    order
}

fn export_mesh<G, W>(
    graph: &G,
    session: &mut ExportSession,
    writer: &mut SceneWriter<W>,
    path: &NodePath,
) -> anyhow::Result<()>
where
    G: SceneGraph + ?Sized,
    W: Write,
{
    let node = path.node();
    let Some(mesh) = graph.mesh(node) else {
        return Ok(());
    };
    let name = path.full_name(graph);

    let plan = match plan_instancing(graph, &session.dag, path) {
        Placement::Hidden => {
            debug!("Skipping hidden mesh: {}", name);
            session.stats.skipped += 1;
            return Ok(());
        }
        Placement::NotOwner => {
            debug!("Mesh {} is written by its first instance", name);
            return Ok(());
        }
        plan => plan,
    };
    if mesh.is_degenerate() {
        debug!("Skipping empty mesh: {}", name);
        session.stats.skipped += 1;
        return Ok(());
    }
    info!("Exporting mesh: {} ...", name);

    let instance = session.dag.instance_number(path);
    let shaders = session.shaders.resolve_shaders(graph, node, instance);
    let assignment = graph.connected_shaders(node, instance);
    let Some(triangles) = triangulate(mesh, &assignment.face_groups, shaders.len())
        .with_context(|| format!("Cannot triangulate mesh {}", name))?
    else {
        return Ok(());
    };

    match plan {
        Placement::Instanced(plan) => {
            let members: Vec<_> = plan
                .members
                .iter()
                .map(|member| {
                    let instance = session.dag.instance_number(member);
                    let shaders = session.shaders.resolve_shaders(graph, node, instance);
                    (member, shaders)
                })
                .collect();
            write_pending_materials(session, writer)?;
            writer.write_object(&name, &triangles, ObjectPlacement::Shared)?;
            session.stats.meshes += 1;
            for (member, shaders) in members {
                writer.write_instance(
                    &member.full_name(graph),
                    &name,
                    &member.world_transform(graph),
                    &shaders,
                )?;
                session.stats.instances += 1;
            }
        }
        _ => {
            write_pending_materials(session, writer)?;
            writer.write_object(
                &name,
                &triangles,
                ObjectPlacement::Inline {
                    shaders: &shaders,
                    transform: path.world_transform(graph),
                },
            )?;
            session.stats.meshes += 1;
        }
    }
    Ok(())
}

fn write_pending_materials<W: Write>(
    session: &mut ExportSession,
    writer: &mut SceneWriter<W>,
) -> anyhow::Result<()> {
    for material in session.shaders.take_pending() {
        writer.write_shader(&material)?;
        session.stats.materials += 1;
    }
    Ok(())
}

fn export_camera<G, W>(
    graph: &G,
    session: &mut ExportSession,
    writer: &mut SceneWriter<W>,
    path: &NodePath,
) -> anyhow::Result<()>
where
    G: SceneGraph + ?Sized,
    W: Write,
{
    let node = path.node();
    let Some(camera) = graph.camera(node) else {
        return Ok(());
    };
    let name = path.full_name(graph);
    if !is_renderable(graph, node) {
        debug!("Skipping non renderable camera: {}", name);
        session.stats.skipped += 1;
        return Ok(());
    }
    if camera.orthographic {
        debug!("Skipping orthographic camera: {}", name);
        session.stats.skipped += 1;
        return Ok(());
    }
    info!("Exporting camera: {} ...", name);

    let world = path.world_transform(graph);
    let eye = world.transform_point(Point3::new(0.0, 0.0, 0.0));
    let direction = normalized(world.transform_vector(Vector3::new(0.0, 0.0, -1.0)));
    let up = normalized(world.transform_vector(Vector3::new(0.0, 1.0, 0.0)));
    let fov = Deg::from(camera.horizontal_fov).0;

    writer.write_camera(&name, eye, eye + direction, up, fov, session.aspect_ratio)?;
    session.stats.cameras += 1;
    Ok(())
}

fn export_light<G, W>(
    graph: &G,
    session: &mut ExportSession,
    writer: &mut SceneWriter<W>,
    path: &NodePath,
) -> anyhow::Result<()>
where
    G: SceneGraph + ?Sized,
    W: Write,
{
    let Some(light) = graph.light(path.node()) else {
        return Ok(());
    };
    let name = path.full_name(graph);
    if !is_effectively_visible(graph, path) {
        debug!("Skipping hidden light: {}", name);
        session.stats.skipped += 1;
        return Ok(());
    }
    let world = path.world_transform(graph);

    match light {
        LightShape::Directional { shadow_samples } => {
            if session.sun_exported {
                debug!("Only one sun is exported, ignoring {}", name);
                session.stats.skipped += 1;
                return Ok(());
            }
            info!("Exporting sunlight: {} ...", name);
            let direction = world.transform_vector(Vector3::new(0.0, 0.0, 1.0));
            writer.write_sun(direction, *shadow_samples)?;
            session.sun_exported = true;
        }
        LightShape::Area {
            color,
            intensity,
            shadow_samples,
        } => {
            info!("Exporting light: {} ...", name);
            let quad = AREA_LIGHT_QUAD.map(|[x, y, z]| world.transform_point(Point3::new(x, y, z)));
            writer.write_mesh_light(&name, *color, *intensity, *shadow_samples, &quad)?;
        }
        LightShape::Other { type_name } => {
            debug!("Light {} of type {} is not exported", name, type_name);
            session.stats.skipped += 1;
            return Ok(());
        }
    }
    session.stats.lights += 1;
    Ok(())
}

fn normalized(v: Vector3<f64>) -> Vector3<f64> {
    if v.magnitude2() > 0.0 { v.normalize() } else { v }
}
