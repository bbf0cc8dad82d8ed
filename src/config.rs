//! Export settings.
//!
//! Settings are plain serde structs. They can be built in code or loaded from
//! a TOML file; every field has a default so a partial file is fine:
//!
//! ```toml
//! filter = "mitchell"
//! aa_max = 3
//!
//! [resolution]
//! width = 1280
//! height = 720
//! ```

use std::path::Path;

use anyhow::{Context as _, bail};
use serde::{Deserialize, Serialize};

/// Pixel filters the renderer understands.
pub const FILTER_NAMES: [&str; 8] = [
    "box",
    "triangle",
    "catmull-rom",
    "mitchell",
    "lanczos",
    "blackman-harris",
    "sinc",
    "gaussian",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Overrides the host resolution when set.
    pub resolution: Option<Resolution>,
    pub aa_min: i32,
    pub aa_max: i32,
    pub filter: String,
    /// Colour of the `default` material.
    pub default_diffuse: [f32; 3],
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            resolution: None,
            aa_min: 0,
            aa_max: 2,
            filter: "gaussian".to_string(),
            default_diffuse: [0.7, 0.7, 0.7],
        }
    }
}

impl ExportSettings {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read export settings {}", path.display()))?;
        let settings: Self = toml::from_str(&contents)
            .with_context(|| format!("Cannot parse export settings {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !FILTER_NAMES.contains(&self.filter.as_str()) {
            bail!(
                "Unknown pixel filter '{}', expected one of {}",
                self.filter,
                FILTER_NAMES.join(", ")
            );
        }
        if self.aa_min > self.aa_max {
            bail!(
                "Anti-aliasing range is empty: aa_min {} > aa_max {}",
                self.aa_min,
                self.aa_max
            );
        }
        if let Some(resolution) = self.resolution {
            if resolution.width == 0 || resolution.height == 0 {
                bail!(
                    "Resolution must not be empty, got {}x{}",
                    resolution.width,
                    resolution.height
                );
            }
        }
        Ok(())
    }

    /// Explicit setting first, then the host, then 640x480.
    pub fn effective_resolution(&self, host: Option<Resolution>) -> Resolution {
        self.resolution.or(host).unwrap_or_default()
    }
}
