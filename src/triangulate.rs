//! Polygon to triangle conversion with face-varying attribute remapping.
//!
//! The host's triangulation is authoritative. For every triangle it reports,
//! each mesh-relative vertex is mapped back to the corner it occupies in its
//! face, and that corner's normal and UV indices are looked up. The result is
//! a set of flat buffers with three attribute entries per triangle.

use anyhow::bail;
use cgmath::Vector3;
use log::warn;

use crate::data_structures::mesh::{Face, PolygonMesh, TriangleMesh};

/// Triangulates `mesh`.
///
/// `face_shaders` holds the shading index of every face of the placement
/// being exported. It is only kept in the output when `material_count` is
/// larger than one. Faces without an entry, or with an index past
/// `material_count`, use index 0.
///
/// Returns `Ok(None)` for degenerate meshes, which are skipped rather than
/// reported.
pub fn triangulate(
    mesh: &PolygonMesh,
    face_shaders: &[usize],
    material_count: usize,
) -> anyhow::Result<Option<TriangleMesh>> {
    if mesh.is_degenerate() {
        return Ok(None);
    }

    let triangle_count = mesh.triangle_count();
    // a UV set without coordinates is exported as no UVs at all
    let uv_set = mesh.primary_uv_set().filter(|set| !set.coords.is_empty());
    let multi_material = material_count > 1;

    let mut triangles = Vec::with_capacity(triangle_count);
    let mut normals = Vec::with_capacity(3 * triangle_count);
    let mut uvs = uv_set.map(|_| Vec::with_capacity(3 * triangle_count));
    let mut per_triangle_shaders = multi_material.then(|| Vec::with_capacity(triangle_count));

    for (face_index, face) in mesh.faces.iter().enumerate() {
        let shader = if multi_material {
            face_shader(face_shaders, face_index, material_count)
        } else {
            0
        };
        for triangle in &face.triangles {
            let corners = corners_of(mesh, face, face_index, triangle)?;

            for &corner in &corners {
                normals.push(corner_normal(mesh, face, face_index, corner)?);
            }
            if let (Some(uvs), Some(set)) = (uvs.as_mut(), uv_set) {
                for &corner in &corners {
                    let uv = face
                        .uvs
                        .first()
                        .and_then(|indices| indices.get(corner))
                        .and_then(|&i| set.coords.get(i as usize))
                        .copied()
                        // corners outside the UV set's coverage
                        .unwrap_or([0.0, 0.0]);
                    uvs.push(uv);
                }
            }
            if let Some(shaders) = per_triangle_shaders.as_mut() {
                shaders.push(shader);
            }
            triangles.push(*triangle);
        }
    }

    Ok(Some(TriangleMesh {
        points: mesh.positions.clone(),
        triangles,
        normals,
        uvs,
        face_shaders: per_triangle_shaders,
    }))
}

fn face_shader(face_shaders: &[usize], face_index: usize, material_count: usize) -> usize {
    match face_shaders.get(face_index).copied() {
        Some(shader) if shader >= material_count => {
            warn!(
                "Face {} uses shading index {} but only {} materials are assigned, using 0",
                face_index, shader, material_count
            );
            0
        }
        shader => shader.unwrap_or(0),
    }
}

/// Face-relative corners of a host triangle, checking the triangle against
/// the mesh on the way.
fn corners_of(
    mesh: &PolygonMesh,
    face: &Face,
    face_index: usize,
    triangle: &[u32; 3],
) -> anyhow::Result<[usize; 3]> {
    let [a, b, c] = *triangle;
    if a == b || b == c || a == c {
        bail!(
            "Triangle {:?} of face {} repeats a vertex",
            triangle,
            face_index
        );
    }
    let mut corners = [0; 3];
    for (slot, &vertex) in corners.iter_mut().zip(triangle) {
        if vertex as usize >= mesh.vertex_count() {
            bail!(
                "Triangle {:?} of face {} references vertex {} but the mesh has {} points",
                triangle,
                face_index,
                vertex,
                mesh.vertex_count()
            );
        }
        *slot = match face.corner_of(vertex) {
            Some(corner) => corner,
            None => bail!(
                "Triangle {:?} of face {} uses vertex {} which is not part of the face",
                triangle,
                face_index,
                vertex
            ),
        };
    }
    Ok(corners)
}

fn corner_normal(
    mesh: &PolygonMesh,
    face: &Face,
    face_index: usize,
    corner: usize,
) -> anyhow::Result<Vector3<f32>> {
    let index = match face.normals.get(corner) {
        Some(&index) => index as usize,
        None => bail!(
            "Face {} has {} corners but only {} normal indices",
            face_index,
            face.corner_count(),
            face.normals.len()
        ),
    };
    match mesh.normals.get(index) {
        Some(normal) => Ok(*normal),
        None => bail!(
            "Face {} references normal {} but the mesh has {}",
            face_index,
            index,
            mesh.normals.len()
        ),
    }
}
