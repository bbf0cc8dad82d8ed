use cgmath::{Point3, Vector3};

use crate::data_structures::mesh::{Face, PolygonMesh, UvSet};

/// Name of the UV set file loaders put texture coordinates into.
pub const PRIMARY_UV_SET: &str = "map1";

/**
 * Converts an obj model into a polygon mesh. Faces keep their arity and get
 * a fan triangulation. Obj files without normals get one geometric normal
 * per face.
 */
pub fn obj_polygon_mesh(model: &tobj::Model) -> PolygonMesh {
    let m = &model.mesh;
    let positions = m
        .positions
        .chunks_exact(3)
        .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
        .collect();
    let mut mesh = PolygonMesh {
        positions,
        normals: m
            .normals
            .chunks_exact(3)
            .map(|n| Vector3::new(n[0], n[1], n[2]))
            .collect(),
        uv_sets: Vec::new(),
        faces: Vec::new(),
    };
    let has_normals = !m.normal_indices.is_empty() && !mesh.normals.is_empty();
    let has_uvs = !m.texcoord_indices.is_empty() && !m.texcoords.is_empty();
    if has_uvs {
        mesh.uv_sets.push(UvSet {
            name: PRIMARY_UV_SET.to_string(),
            coords: m.texcoords.chunks_exact(2).map(|uv| [uv[0], uv[1]]).collect(),
        });
    }
    if !has_normals {
        mesh.normals.clear();
    }

    // All-triangle meshes come without arities
    let arities: Vec<usize> = if m.face_arities.is_empty() {
        vec![3; m.indices.len() / 3]
    } else {
        m.face_arities.iter().map(|&a| a as usize).collect()
    };

    let mut start = 0;
    for arity in arities {
        let end = start + arity;
        let Some(vertices) = m.indices.get(start..end) else {
            log::warn!(
                "Obj model {} ends inside a face, {} trailing indices dropped",
                model.name,
                m.indices.len().saturating_sub(start)
            );
            break;
        };
        let range = start..end;
        start = end;
        if arity < 3 || has_repeated_vertex(vertices) {
            log::debug!("Dropping degenerate face of obj model {}", model.name);
            continue;
        }
        let uvs = match m.texcoord_indices.get(range.clone()) {
            Some(indices) if has_uvs => vec![indices.to_vec()],
            _ => Vec::new(),
        };
        let mut face = Face::fan(vertices.to_vec(), Vec::new(), uvs);
        face.normals = match m.normal_indices.get(range) {
            Some(indices) if has_normals => indices.to_vec(),
            _ => {
                let normal = mesh.face_normal(&face);
                mesh.normals.push(normal);
                vec![mesh.normals.len() as u32 - 1; arity]
            }
        };
        mesh.faces.push(face);
    }
    mesh
}

pub(crate) fn has_repeated_vertex(vertices: &[u32]) -> bool {
    vertices
        .iter()
        .enumerate()
        .any(|(i, v)| vertices[..i].contains(v))
}
