//! Polygon meshes as handed over by the host, and the flat triangle buffers
//! the exporter derives from them.
//!
//! Normals and UVs are face-varying: they are addressed per corner of a face,
//! not per vertex. A cube has 8 points but 24 corner normals because each
//! point takes part in three faces with three different normals.

use cgmath::{InnerSpace, Point3, Vector3};

/// A single polygon of a [`PolygonMesh`].
///
/// `vertices`, `normals` and every entry of `uvs` are parallel: position `i`
/// in each of them describes corner `i` of the face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
    /// Mesh-relative vertex indices in winding order.
    pub vertices: Vec<u32>,
    /// Per-corner indices into [`PolygonMesh::normals`].
    pub normals: Vec<u32>,
    /// Per-corner indices into each UV set's coordinates, one list per set.
    pub uvs: Vec<Vec<u32>>,
    /// The host's triangulation of this face, as mesh-relative vertex indices.
    pub triangles: Vec<[u32; 3]>,
}

impl Face {
    /// Builds a face whose triangulation is a fan around the first corner.
    ///
    /// This is what most hosts do for convex polygons and what the file
    /// loaders use when the source format does not carry a triangulation.
    pub fn fan(vertices: Vec<u32>, normals: Vec<u32>, uvs: Vec<Vec<u32>>) -> Self {
        let triangles = fan_triangles(&vertices);
        Self {
            vertices,
            normals,
            uvs,
            triangles,
        }
    }

    pub fn corner_count(&self) -> usize {
        self.vertices.len()
    }

    /// Face-relative corner of a mesh-relative vertex. The first match wins.
    ///
    /// A face that lists the same vertex twice makes this ambiguous; such
    /// faces are outside the contract with the host.
    pub fn corner_of(&self, vertex: u32) -> Option<usize> {
        self.vertices.iter().position(|&v| v == vertex)
    }
}

/// Fan triangulation `(0, i, i + 1)` over a polygon's vertex list.
pub fn fan_triangles(vertices: &[u32]) -> Vec<[u32; 3]> {
    if vertices.len() < 3 {
        return Vec::new();
    }
    (1..vertices.len() - 1)
        .map(|i| [vertices[0], vertices[i], vertices[i + 1]])
        .collect()
}

/// A named set of texture coordinates. Faces index into `coords` through
/// [`Face::uvs`] at the same position as the set in [`PolygonMesh::uv_sets`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UvSet {
    pub name: String,
    pub coords: Vec<[f32; 2]>,
}

/// The geometric payload of a mesh node, in object space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolygonMesh {
    pub positions: Vec<Point3<f64>>,
    pub normals: Vec<Vector3<f32>>,
    pub uv_sets: Vec<UvSet>,
    pub faces: Vec<Face>,
}

impl PolygonMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles the host triangulation yields over all faces.
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|face| face.triangles.len()).sum()
    }

    pub fn is_degenerate(&self) -> bool {
        self.vertex_count() == 0 || self.triangle_count() == 0
    }

    /// The only UV set that gets exported.
    pub fn primary_uv_set(&self) -> Option<&UvSet> {
        self.uv_sets.first()
    }

    /// Geometric normal of a face from its first three corners. Falls back to
    /// +Z for collinear corners.
    pub fn face_normal(&self, face: &Face) -> Vector3<f32> {
        let corner = |i: usize| {
            face.vertices
                .get(i)
                .and_then(|&v| self.positions.get(v as usize))
                .copied()
        };
        match (corner(0), corner(1), corner(2)) {
            (Some(a), Some(b), Some(c)) => {
                let n = (b - a).cross(c - a);
                if n.magnitude2() > 0.0 {
                    let n = n.normalize();
                    Vector3::new(n.x as f32, n.y as f32, n.z as f32)
                } else {
                    Vector3::new(0.0, 0.0, 1.0)
                }
            }
            _ => Vector3::new(0.0, 0.0, 1.0),
        }
    }
}

/// Renderer-ready triangle buffers of one mesh.
///
/// `normals` (and `uvs` when present) hold exactly three entries per
/// triangle, in corner order 0, 1, 2.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleMesh {
    pub points: Vec<Point3<f64>>,
    pub triangles: Vec<[u32; 3]>,
    pub normals: Vec<Vector3<f32>>,
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Per-triangle shading index, only kept for multi material meshes.
    pub face_shaders: Option<Vec<usize>>,
}

impl TriangleMesh {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}
