use std::collections::HashMap;

use cgmath::{Matrix4, Point3, Rad, Vector3};

use crate::{
    data_structures::{
        material::{ShaderAssignment, ShaderNode, ShadingGroup, ShadingGroupId},
        mesh::{Face, PolygonMesh, UvSet},
        scene_graph::{CameraShape, LightShape, Node, NodeId, NodePayload, Scene},
    },
    resources::mesh::{PRIMARY_UV_SET, has_repeated_vertex},
};

/// Shadow samples for lights coming from formats that don't carry any.
const DEFAULT_SHADOW_SAMPLES: u32 = 16;

/// Builds the scene side of a gltf document.
///
/// Every gltf node becomes a transform node. Meshes, cameras and lights hang
/// below it as shape nodes. A gltf mesh used by several nodes is converted
/// once and attached to each of them, which makes it an instanced shape.
pub struct GltfConverter<'a> {
    buffers: &'a [gltf::buffer::Data],
    /// Shading group per gltf material index.
    groups: Vec<ShadingGroupId>,
    /// Group for primitives without a material, created on first use.
    fallback_group: Option<ShadingGroupId>,
    shapes: HashMap<usize, NodeId>,
}

impl<'a> GltfConverter<'a> {
    pub fn new(
        scene: &mut Scene,
        document: &gltf::Document,
        buffers: &'a [gltf::buffer::Data],
    ) -> Self {
        let groups = document
            .materials()
            .enumerate()
            .map(|(idx, material)| {
                let name = material
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("material{}", idx));
                let [r, g, b, _] = material.pbr_metallic_roughness().base_color_factor();
                add_lambert(scene, &name, [r, g, b])
            })
            .collect();
        Self {
            buffers,
            groups,
            fallback_group: None,
            shapes: HashMap::new(),
        }
    }

    /// Converts `node` and its subtree, returns the transform node's id.
    pub fn convert_node(&mut self, scene: &mut Scene, node: gltf::Node) -> anyhow::Result<NodeId> {
        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", node.index()));
        let local = node.transform().matrix().map(|column| column.map(f64::from));
        let id = scene.add_node(Node::transform(name.as_str()).with_local(Matrix4::from(local)));

        if let Some(mesh) = node.mesh() {
            let shape = self.convert_mesh(scene, mesh)?;
            scene.add_child(id, shape);
        }
        if let Some(camera) = node.camera() {
            let shape = scene.add_node(Node::new(
                format!("{}Shape", name),
                NodePayload::Camera(camera_shape(&camera)),
            ));
            scene.add_child(id, shape);
        }
        if let Some(light) = node.light() {
            let shape = scene.add_node(Node::new(
                format!("{}Shape", name),
                NodePayload::Light(light_shape(&light)),
            ));
            scene.add_child(id, shape);
        }
        for child in node.children() {
            let child = self.convert_node(scene, child)?;
            scene.add_child(id, child);
        }
        Ok(id)
    }

    fn convert_mesh(&mut self, scene: &mut Scene, mesh: gltf::Mesh) -> anyhow::Result<NodeId> {
        // placements without their own assignment share the first one
        if let Some(shape) = self.shapes.get(&mesh.index()) {
            return Ok(*shape);
        }

        let name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));
        let mut polygons = PolygonMesh::default();
        let mut coords: Vec<[f32; 2]> = Vec::new();
        let mut has_uvs = false;
        let mut assignment = ShaderAssignment::default();
        let buffers = self.buffers;

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Primitive {} of mesh {} is not a triangle list, skipped",
                    primitive.index(),
                    name
                );
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let offset = polygons.positions.len() as u32;
            polygons
                .positions
                .extend(positions.map(|[x, y, z]| Point3::new(x as f64, y as f64, z as f64)));
            let count = polygons.positions.len() - offset as usize;

            let normals: Vec<Vector3<f32>> = reader
                .read_normals()
                .map(|normals| normals.map(Vector3::from).collect())
                .unwrap_or_default();
            let normal_offset = polygons.normals.len() as u32;
            let per_vertex_normals = normals.len() == count;
            if per_vertex_normals {
                polygons.normals.extend(normals);
            }

            if let Some(uvs) = reader.read_tex_coords(0) {
                has_uvs = true;
                coords.extend(uvs.into_f32());
            }
            coords.resize(polygons.positions.len(), [0.0, 0.0]);

            let group = self.primitive_group(scene, &primitive);
            let slot = match assignment.groups.iter().position(|&g| g == group) {
                Some(slot) => slot,
                None => {
                    assignment.groups.push(group);
                    assignment.groups.len() - 1
                }
            };

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..count as u32).collect(),
            };
            for triangle in indices.chunks_exact(3) {
                if triangle.iter().any(|&i| i as usize >= count) {
                    anyhow::bail!("Mesh {} indexes past its {} vertices", name, count);
                }
                if has_repeated_vertex(triangle) {
                    continue;
                }
                let vertices: Vec<u32> = triangle.iter().map(|&i| i + offset).collect();
                let uvs = vec![vertices.clone()];
                let mut face = Face::fan(vertices, Vec::new(), uvs);
                face.normals = if per_vertex_normals {
                    triangle.iter().map(|&i| i + normal_offset).collect()
                } else {
                    let normal = polygons.face_normal(&face);
                    polygons.normals.push(normal);
                    vec![polygons.normals.len() as u32 - 1; 3]
                };
                polygons.faces.push(face);
                assignment.face_groups.push(slot);
            }
        }

        if has_uvs {
            polygons.uv_sets.push(UvSet {
                name: PRIMARY_UV_SET.to_string(),
                coords,
            });
        } else {
            for face in &mut polygons.faces {
                face.uvs.clear();
            }
        }

        let shape = scene.add_node(Node::new(
            format!("{}Shape", name),
            NodePayload::Mesh {
                mesh: polygons,
                shaders: vec![assignment],
            },
        ));
        self.shapes.insert(mesh.index(), shape);
        Ok(shape)
    }

    fn primitive_group(&mut self, scene: &mut Scene, primitive: &gltf::Primitive) -> ShadingGroupId {
        if let Some(group) = primitive.material().index().and_then(|idx| self.groups.get(idx)) {
            return *group;
        }
        *self
            .fallback_group
            .get_or_insert_with(|| add_lambert(scene, "gltfDefault", [1.0, 1.0, 1.0]))
    }
}

fn add_lambert(scene: &mut Scene, name: &str, color: [f32; 3]) -> ShadingGroupId {
    let shader = scene.add_shader(ShaderNode::lambert(name, color, 1.0));
    scene.add_shading_group(ShadingGroup {
        name: format!("{}SG", name),
        surface_shaders: vec![shader],
    })
}

fn camera_shape(camera: &gltf::Camera) -> CameraShape {
    match camera.projection() {
        gltf::camera::Projection::Perspective(perspective) => {
            let yfov = perspective.yfov() as f64;
            let aspect = perspective.aspect_ratio().unwrap_or(1.0) as f64;
            CameraShape {
                orthographic: false,
                horizontal_fov: Rad(2.0 * ((yfov / 2.0).tan() * aspect).atan()),
            }
        }
        gltf::camera::Projection::Orthographic(_) => CameraShape {
            orthographic: true,
            ..Default::default()
        },
    }
}

fn light_shape(light: &gltf::khr_lights_punctual::Light) -> LightShape {
    match light.kind() {
        gltf::khr_lights_punctual::Kind::Directional => LightShape::Directional {
            shadow_samples: DEFAULT_SHADOW_SAMPLES,
        },
        gltf::khr_lights_punctual::Kind::Point => LightShape::Other {
            type_name: "point".to_string(),
        },
        gltf::khr_lights_punctual::Kind::Spot { .. } => LightShape::Other {
            type_name: "spot".to_string(),
        },
    }
}
