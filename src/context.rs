use crate::{
    config::{ExportSettings, Resolution},
    data_structures::scene_graph::SceneGraph,
    instancing::DagIndex,
    shading::ShaderRegistry,
};

/// Counters reported at the end of an export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub meshes: usize,
    pub instances: usize,
    pub cameras: usize,
    pub lights: usize,
    pub materials: usize,
    pub skipped: usize,
}

/// State shared by every emitter during one export, set up once before the
/// traversal starts.
#[derive(Debug)]
pub struct ExportSession {
    pub resolution: Resolution,
    /// Fixed for the whole export, every camera gets the same value.
    pub aspect_ratio: f32,
    pub shaders: ShaderRegistry,
    pub dag: DagIndex,
    pub sun_exported: bool,
    pub stats: ExportStats,
}

impl ExportSession {
    pub fn new<G: SceneGraph + ?Sized>(graph: &G, settings: &ExportSettings) -> Self {
        let resolution = settings.effective_resolution(graph.resolution());
        let shaders = ShaderRegistry::discover(graph);
        let stats = ExportStats {
            materials: shaders.len(),
            ..Default::default()
        };
        Self {
            aspect_ratio: resolution.aspect_ratio(),
            resolution,
            shaders,
            dag: DagIndex::build(graph),
            sun_exported: false,
            stats,
        }
    }
}
