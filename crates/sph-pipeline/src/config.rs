//! Simulation configuration
//!
//! The handful of integers that size an SPH pipeline. Everything else
//! (buffer sizes, dispatch counts, export values) is derived from them.

use crate::error::{ConfigError, PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Bytes per particle record in the `particles` buffer
pub const PARTICLE_RECORD_SIZE: u64 = 84;

/// Bytes per pixel in the `pixelbuffer` buffer
pub const PIXEL_SIZE: u64 = 8;

/// Parameters of one SPH pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Invocations per work group
    pub particle_group_size: u32,
    /// Work groups per compute dispatch
    pub particle_group_count: u32,
    /// Width of the rendered image in pixels
    pub render_width: u32,
    /// Height of the rendered image in pixels
    pub render_height: u32,
}

impl SimulationConfig {
    /// 9216 particles rendered at 512x512
    pub const STANDARD: Self = Self {
        particle_group_size: 96,
        particle_group_count: 96,
        render_width: 512,
        render_height: 512,
    };

    /// 4096 particles rendered at 256x256
    pub const COMPACT: Self = Self {
        particle_group_size: 64,
        particle_group_count: 64,
        render_width: 256,
        render_height: 256,
    };

    /// Looks up a preset by its lowercase name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::STANDARD),
            "compact" => Some(Self::COMPACT),
            _ => None,
        }
    }

    /// Number of simulated particles
    pub fn particle_count(&self) -> u64 {
        self.particle_group_size as u64 * self.particle_group_count as u64
    }

    pub fn particle_buffer_size(&self) -> u64 {
        PARTICLE_RECORD_SIZE * self.particle_count()
    }

    pub fn pixel_buffer_size(&self) -> u64 {
        PIXEL_SIZE * self.render_width as u64 * self.render_height as u64
    }

    /// Checks every value is positive and every exported value fits an `i32`
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("particle_group_size", self.particle_group_size as u64),
            ("particle_group_count", self.particle_group_count as u64),
            ("render_width", self.render_width as u64),
            ("render_height", self.render_height as u64),
            ("particle_count", self.particle_count()),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(PipelineError::InvalidDimension {
                    name: name.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            if value > i32::MAX as u64 {
                return Err(PipelineError::InvalidDimension {
                    name: name.to_string(),
                    reason: format!("{value} does not fit an i32 export"),
                });
            }
        }
        Ok(())
    }

    /// Parses and validates a configuration from YAML
    ///
    /// Missing fields take their value from [`SimulationConfig::STANDARD`].
    pub fn from_yaml(yaml_content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_norway::from_str(yaml_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML configuration file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml_content = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml_content)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}
