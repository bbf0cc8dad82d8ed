//! Scene description text format.
//!
//! Every block is tab indented and followed by an empty line. Numbers are
//! written with `Display`, which gives the shortest representation that
//! round-trips, so nothing is rounded on the way out.

use std::io::Write;

use cgmath::{Matrix4, Point3, Vector3};

use crate::{
    config::Resolution,
    data_structures::{
        material::{Material, MaterialRef},
        mesh::TriangleMesh,
    },
};

/// How a geometry block is placed in the world.
pub enum ObjectPlacement<'a> {
    /// Shaded and transformed in the block itself.
    Inline {
        shaders: &'a [MaterialRef],
        transform: Matrix4<f64>,
    },
    /// Only defines the shape; `instance` blocks place it.
    Shared,
}

pub struct SceneWriter<W: Write> {
    out: W,
}

impl<W: Write> SceneWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }

    pub fn write_image(
        &mut self,
        resolution: Resolution,
        aa: (i32, i32),
        filter: &str,
    ) -> std::io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "image {{")?;
        writeln!(out, "\tresolution {} {}", resolution.width, resolution.height)?;
        writeln!(out, "\taa {} {}", aa.0, aa.1)?;
        writeln!(out, "\tfilter {}", filter)?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    pub fn write_shader(&mut self, material: &Material) -> std::io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "shader {{")?;
        writeln!(out, "\tname {}", material.name)?;
        writeln!(out, "\ttype diffuse")?;
        writeln!(out, "\tdiff {}", color(material.diffuse))?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    pub fn write_object(
        &mut self,
        name: &str,
        mesh: &TriangleMesh,
        placement: ObjectPlacement<'_>,
    ) -> std::io::Result<()> {
        writeln!(self.out, "object {{")?;
        match placement {
            ObjectPlacement::Shared => writeln!(self.out, "\tnoinstance")?,
            ObjectPlacement::Inline { shaders, transform } => {
                self.write_shader_list(shaders)?;
                writeln!(self.out, "\ttransform col {}", matrix(&transform))?;
            }
        }
        let out = &mut self.out;
        writeln!(out, "\ttype generic-mesh")?;
        writeln!(out, "\tname \"{}\"", name)?;

        writeln!(out, "\tpoints {}", mesh.points.len())?;
        for p in &mesh.points {
            writeln!(out, "\t\t{} {} {}", p.x, p.y, p.z)?;
        }

        writeln!(out, "\ttriangles {}", mesh.triangles.len())?;
        for [a, b, c] in &mesh.triangles {
            writeln!(out, "\t\t{} {} {}", a, b, c)?;
        }

        writeln!(out, "\tnormals facevarying")?;
        for corners in mesh.normals.chunks(3) {
            let line: Vec<String> = corners.iter().map(vector).collect();
            writeln!(out, "\t\t{}", line.join(" "))?;
        }

        match &mesh.uvs {
            Some(uvs) => {
                writeln!(out, "\tuvs facevarying")?;
                for corners in uvs.chunks(3) {
                    let line: Vec<String> = corners
                        .iter()
                        .map(|[u, v]| format!("{} {}", u, v))
                        .collect();
                    writeln!(out, "\t\t{}", line.join(" "))?;
                }
            }
            None => writeln!(out, "\tuvs none")?,
        }

        if let Some(face_shaders) = &mesh.face_shaders {
            writeln!(out, "\tface_shaders")?;
            for shader in face_shaders {
                writeln!(out, "\t\t{}", shader)?;
            }
        }
        writeln!(out, "}}")?;
        writeln!(out)
    }

    pub fn write_instance(
        &mut self,
        name: &str,
        geometry: &str,
        transform: &Matrix4<f64>,
        shaders: &[MaterialRef],
    ) -> std::io::Result<()> {
        writeln!(self.out, "instance {{")?;
        writeln!(self.out, "\tname \"{}.instance\"", name)?;
        writeln!(self.out, "\tgeometry \"{}\"", geometry)?;
        writeln!(self.out, "\ttransform col {}", matrix(transform))?;
        self.write_shader_list(shaders)?;
        writeln!(self.out, "}}")?;
        writeln!(self.out)
    }

    pub fn write_camera(
        &mut self,
        name: &str,
        eye: Point3<f64>,
        target: Point3<f64>,
        up: Vector3<f64>,
        fov_degrees: f64,
        aspect_ratio: f32,
    ) -> std::io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "% {}", name)?;
        writeln!(out, "camera {{")?;
        writeln!(out, "\ttype   pinhole")?;
        writeln!(out, "\teye    {} {} {}", eye.x, eye.y, eye.z)?;
        writeln!(out, "\ttarget {} {} {}", target.x, target.y, target.z)?;
        writeln!(out, "\tup     {} {} {}", up.x, up.y, up.z)?;
        writeln!(out, "\tfov    {}", fov_degrees)?;
        writeln!(out, "\taspect {}", aspect_ratio)?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    pub fn write_sun(&mut self, direction: Vector3<f64>, samples: u32) -> std::io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "light {{")?;
        writeln!(out, "\ttype sunsky")?;
        writeln!(out, "\tup 0 1 0")?;
        writeln!(out, "\teast 0 0 1")?;
        writeln!(out, "\tsundir {} {} {}", direction.x, direction.y, direction.z)?;
        writeln!(out, "\tturbidity 2")?;
        writeln!(out, "\tsamples {}", samples)?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    pub fn write_mesh_light(
        &mut self,
        name: &str,
        emit: [f32; 3],
        radiance: f32,
        samples: u32,
        quad: &[Point3<f64>; 4],
    ) -> std::io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "light {{")?;
        writeln!(out, "\ttype meshlight")?;
        writeln!(out, "\tname {}", name)?;
        writeln!(out, "\temit {}", color(emit))?;
        writeln!(out, "\tradiance {}", radiance)?;
        writeln!(out, "\tsamples {}", samples)?;
        writeln!(out, "\tpoints 4")?;
        for p in quad {
            writeln!(out, "\t\t{} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(out, "\ttriangles 2")?;
        writeln!(out, "\t\t0 1 2")?;
        writeln!(out, "\t\t0 2 3")?;
        writeln!(out, "}}")?;
        writeln!(out)
    }

    fn write_shader_list(&mut self, shaders: &[MaterialRef]) -> std::io::Result<()> {
        match shaders {
            [] => writeln!(self.out, "\tshader {}", MaterialRef::default_material()),
            [single] => writeln!(self.out, "\tshader {}", single),
            many => {
                writeln!(self.out, "\tshaders {}", many.len())?;
                for shader in many {
                    writeln!(self.out, "\t\t{}", shader)?;
                }
                Ok(())
            }
        }
    }
}

fn color(rgb: [f32; 3]) -> String {
    format!("{{ \"sRGB nonlinear\" {} {} {} }}", rgb[0], rgb[1], rgb[2])
}

fn vector(v: &Vector3<f32>) -> String {
    format!("{} {} {}", v.x, v.y, v.z)
}

/// The 16 entries of an object to world matrix, one basis column after the
/// other, translation last.
fn matrix(m: &Matrix4<f64>) -> String {
    let columns: &[[f64; 4]; 4] = m.as_ref();
    columns
        .iter()
        .flatten()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
