use std::path::{Path, PathBuf};

use anyhow::Context;
use geometry::mesh::SphereParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            path: PathBuf::from("sphere.png"),
        }
    }
}

/// Model parameters and render output, loaded from TOML.
///
/// ```toml
/// radius = 2.0
/// radial_segments = 32
/// vertical_segments = 16
/// inward_normals = true
/// hemisphere = true
///
/// [output]
/// width = 800
/// height = 600
/// path = "dome.png"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub radius: f32,
    pub radial_segments: u32,
    pub vertical_segments: u32,
    pub inward_normals: bool,
    pub hemisphere: bool,
    pub output: OutputConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let params = SphereParams::default();
        Self {
            radius: params.radius,
            radial_segments: params.radial_segments,
            vertical_segments: params.vertical_segments,
            inward_normals: params.inward_normals,
            hemisphere: params.hemisphere,
            output: OutputConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        log::debug!("loaded config {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Only the output section is checked here; sphere parameters are validated when the
    /// model is built.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.output.width == 0 || self.output.height == 0 {
            anyhow::bail!(
                "output size must be non-zero, got {}x{}",
                self.output.width,
                self.output.height
            );
        }
        Ok(())
    }

    pub fn sphere_params(&self) -> SphereParams {
        SphereParams {
            radius: self.radius,
            radial_segments: self.radial_segments,
            vertical_segments: self.vertical_segments,
            inward_normals: self.inward_normals,
            hemisphere: self.hemisphere,
        }
    }
}
