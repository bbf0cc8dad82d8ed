#![allow(dead_code)]

use cgmath::{Matrix4, Point3, Vector3};
use flow_export::{
    ExportSettings, ExportStats, Scene, export_scene,
    data_structures::{
        material::{ShaderAssignment, ShaderNode, ShadingGroup, ShadingGroupId},
        mesh::{Face, PolygonMesh, UvSet},
        scene_graph::{Node, NodeId, NodePayload},
    },
};

/// Quad with one normal for all corners and the UV corners 0..4.
pub fn quad_face(vertices: [u32; 4], normal: u32) -> Face {
    Face::fan(vertices.to_vec(), vec![normal; 4], vec![vec![0, 1, 2, 3]])
}

/// A 2x2x2 cube around the origin: 8 points, 6 quads, 6 normals.
pub fn cube_mesh() -> PolygonMesh {
    let positions = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ]
    .into_iter()
    .map(|[x, y, z]| Point3::new(x, y, z))
    .collect();
    let normals = vec![
        Vector3::new(0.0, 0.0, -1.0),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, -1.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(-1.0, 0.0, 0.0),
        Vector3::new(1.0, 0.0, 0.0),
    ];
    PolygonMesh {
        positions,
        normals,
        uv_sets: vec![UvSet {
            name: "map1".to_string(),
            coords: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        }],
        faces: vec![
            quad_face([0, 3, 2, 1], 0),
            quad_face([4, 5, 6, 7], 1),
            quad_face([0, 1, 5, 4], 2),
            quad_face([3, 7, 6, 2], 3),
            quad_face([0, 4, 7, 3], 4),
            quad_face([1, 2, 6, 5], 5),
        ],
    }
}

pub fn mesh_node(name: &str, mesh: PolygonMesh) -> Node {
    Node::new(
        name,
        NodePayload::Mesh {
            mesh,
            shaders: Vec::new(),
        },
    )
}

pub fn translated(name: &str, x: f64, y: f64, z: f64) -> Node {
    Node::transform(name).with_local(Matrix4::from_translation(Vector3::new(x, y, z)))
}

/// A Lambert shader named `name` in a shading group `{name}SG`.
pub fn add_lambert(scene: &mut Scene, name: &str, color: [f32; 3]) -> ShadingGroupId {
    let shader = scene.add_shader(ShaderNode::lambert(name, color, 1.0));
    scene.add_shading_group(ShadingGroup {
        name: format!("{}SG", name),
        surface_shaders: vec![shader],
    })
}

pub fn assign(
    scene: &mut Scene,
    node: NodeId,
    instance: usize,
    groups: Vec<ShadingGroupId>,
    face_groups: Vec<usize>,
) {
    scene.assign_shaders(node, instance, ShaderAssignment { groups, face_groups });
}

/// `|pCube1|pCube1Shape`: the cube moved to (1, 2, 3), shaded red.
pub fn cube_scene() -> (Scene, NodeId, NodeId) {
    let mut scene = Scene::new();
    let transform = scene.add_root(translated("pCube1", 1.0, 2.0, 3.0));
    let shape = scene.add_node(mesh_node("pCube1Shape", cube_mesh()));
    scene.add_child(transform, shape);
    let red = add_lambert(&mut scene, "red", [1.0, 0.0, 0.0]);
    assign(&mut scene, shape, 0, vec![red], Vec::new());
    (scene, transform, shape)
}

pub fn export_string(scene: &Scene, settings: &ExportSettings) -> (String, ExportStats) {
    let mut out = Vec::new();
    let stats = export_scene(scene, settings, &mut out).expect("export failed");
    (String::from_utf8(out).expect("output is not utf-8"), stats)
}

/// All blocks of the given kind (`object`, `instance`, `light`, ...).
pub fn blocks<'a>(out: &'a str, kind: &str) -> Vec<&'a str> {
    let header = format!("{} {{", kind);
    out.split("\n\n")
        .filter(|block| block.lines().any(|line| line == header))
        .collect()
}
