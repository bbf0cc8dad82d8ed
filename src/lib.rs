//! flow-export
//!
//! Writes a host scene graph (meshes, cameras, lights and their diffuse
//! shading) as a text scene description for an offline ray tracer, and
//! decodes the tile stream the renderer reports its progress with. The host
//! is reached through the read-only [`SceneGraph`] trait so that the same
//! export pass runs over a DCC plug-in's scene, a loaded OBJ/glTF file or a
//! scene built in code.
//!
//! High-level modules
//! - `config`: export settings loaded from TOML
//! - `context`: per-export session state (aspect ratio, written materials, stats)
//! - `data_structures`: host-side data models (scene graph, meshes, shading)
//! - `display`: tile stream decoder driving a live preview image
//! - `export`: the breadth-first export pass
//! - `instancing`: placement enumeration and instance planning
//! - `resources`: loaders that build a scene from OBJ and glTF files
//! - `shading`: material discovery and per-placement shader resolution
//! - `triangulate`: polygon to triangle conversion with face-varying data
//! - `visibility`: visibility and renderability rules
//! - `writer`: the scene description text format
//!

pub mod config;
pub mod context;
pub mod data_structures;
pub mod display;
pub mod export;
pub mod instancing;
pub mod resources;
pub mod shading;
pub mod triangulate;
pub mod visibility;
pub mod writer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use config::{ExportSettings, Resolution};
pub use context::ExportStats;
pub use data_structures::scene_graph::{NodePath, Scene, SceneGraph};
pub use export::{export_scene, export_to_file};
