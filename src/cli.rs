use std::path::PathBuf;

use clap::Parser;

use crate::config::ModelConfig;

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{}`", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok((w, h))
}

/// Builds a sphere or hemisphere model and renders it offscreen to a PNG.
#[derive(Debug, Parser)]
#[command(name = "sphere-model", version, about)]
pub struct Args {
    /// TOML file with model and output settings. Flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, allow_hyphen_values = true)]
    pub radius: Option<f32>,

    #[arg(long)]
    pub radial_segments: Option<u32>,

    #[arg(long)]
    pub vertical_segments: Option<u32>,

    /// Point normals to the centre, for viewing from inside.
    #[arg(long)]
    pub inward: bool,

    /// Generate only the upper half.
    #[arg(long)]
    pub hemisphere: bool,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output size as WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Submit to a recording context and log the draw instead of using the GPU.
    #[arg(long)]
    pub dry_run: bool,
}

impl Args {
    pub fn apply(&self, mut config: ModelConfig) -> ModelConfig {
        if let Some(radius) = self.radius {
            config.radius = radius;
        }
        if let Some(n) = self.radial_segments {
            config.radial_segments = n;
        }
        if let Some(n) = self.vertical_segments {
            config.vertical_segments = n;
        }
        config.inward_normals |= self.inward;
        config.hemisphere |= self.hemisphere;
        if let Some(path) = &self.output {
            config.output.path = path.clone();
        }
        if let Some((w, h)) = self.size {
            config.output.width = w;
            config.output.height = h;
        }
        config
    }

    pub fn load_config(&self) -> anyhow::Result<ModelConfig> {
        let config = match &self.config {
            Some(path) => ModelConfig::from_file(path)?,
            None => ModelConfig::default(),
        };
        let config = self.apply(config);
        config.validate()?;
        Ok(config)
    }
}
