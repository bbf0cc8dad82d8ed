//! Shading descriptions as the host exposes them and the materials the
//! exporter derives from them.

/// Name of the material every unresolved assignment falls back to.
pub const DEFAULT_MATERIAL: &str = "default";

pub type ShaderId = usize;
pub type ShadingGroupId = usize;

/// The kind of a host shading node.
///
/// Only Lambert-like shaders carry something the exporter can translate;
/// everything else is kept by type name so it can be reported.
#[derive(Clone, Debug, PartialEq)]
pub enum ShaderKind {
    Lambert { color: [f32; 3], diffuse_coeff: f32 },
    Unsupported { type_name: String },
}

/// An upstream shading description node.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderNode {
    pub name: String,
    pub kind: ShaderKind,
}

impl ShaderNode {
    pub fn lambert(name: impl Into<String>, color: [f32; 3], diffuse_coeff: f32) -> Self {
        Self {
            name: name.into(),
            kind: ShaderKind::Lambert {
                color,
                diffuse_coeff,
            },
        }
    }

    pub fn unsupported(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ShaderKind::Unsupported {
                type_name: type_name.into(),
            },
        }
    }
}

/// A shading group: the thing geometry gets assigned to. Its surface shader
/// connections point at [`ShaderNode`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShadingGroup {
    pub name: String,
    pub surface_shaders: Vec<ShaderId>,
}

/// The shading groups connected to one placement of a geometry, plus the
/// index into `groups` for every face of the mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaderAssignment {
    pub groups: Vec<ShadingGroupId>,
    pub face_groups: Vec<usize>,
}

/// A renderer material: a flat diffuse colour under a unique name.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse: [f32; 3],
}

impl Material {
    pub fn new(name: impl Into<String>, diffuse: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            diffuse,
        }
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_MATERIAL
    }
}

/// A reference to a material by name, as written into geometry blocks.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MaterialRef(pub String);

impl MaterialRef {
    pub fn default_material() -> Self {
        Self(DEFAULT_MATERIAL.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MaterialRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
