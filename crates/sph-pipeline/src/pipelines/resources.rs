//! Buffer and texture declarations
//!
//! The registry owns every GPU resource a pipeline declares. Resources are
//! sized once at declaration time and live as long as the pipeline; there is
//! no resize or release API.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel format of a declared texture
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    #[serde(rename = "RGBA8")]
    Rgba8,
    #[default]
    #[serde(rename = "RGBA16F")]
    Rgba16F,
    #[serde(rename = "RGBA32F")]
    Rgba32F,
    #[serde(rename = "R16F")]
    R16F,
    #[serde(rename = "R32F")]
    R32F,
    #[serde(rename = "RG16F")]
    Rg16F,
    #[serde(rename = "RG32F")]
    Rg32F,
}

impl TextureFormat {
    /// Bytes occupied by one texel of this format
    pub fn bytes_per_texel(&self) -> u32 {
        match self {
            Self::Rgba8 => 4,
            Self::Rgba16F => 8,
            Self::Rgba32F => 16,
            Self::R16F => 2,
            Self::R32F => 4,
            Self::Rg16F => 4,
            Self::Rg32F => 8,
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rgba8 => "RGBA8",
            Self::Rgba16F => "RGBA16F",
            Self::Rgba32F => "RGBA32F",
            Self::R16F => "R16F",
            Self::R32F => "R32F",
            Self::Rg16F => "RG16F",
            Self::Rg32F => "RG32F",
        };
        f.write_str(name)
    }
}

/// A raw, byte-addressable GPU buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferSpec {
    /// Unique resource name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Whether the buffer is zeroed at the start of every frame
    pub clear_each_frame: bool,
}

/// A 2D GPU image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextureSpec {
    /// Unique resource name
    pub name: String,
    /// Texel format
    pub format: TextureFormat,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Whether a full mip chain is allocated
    pub mipmap: bool,
    /// Whether the texture is cleared before it is written each frame
    pub clear_each_frame: bool,
}

impl TextureSpec {
    /// Number of mip levels to allocate for this texture
    pub fn mip_level_count(&self) -> u32 {
        if self.mipmap { u32::BITS - self.width.max(self.height).leading_zeros() } else { 1 }
    }
}

/// Non-owning reference to a declared buffer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    pub(crate) name: String,
}

impl BufferHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Non-owning reference to a declared texture
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureHandle {
    pub(crate) name: String,
}

impl TextureHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Owns all buffer and texture declarations of a pipeline, keyed by name
///
/// Buffers and textures share one namespace.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    buffers: Vec<BufferSpec>,
    textures: Vec<TextureSpec>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a buffer of `size` bytes
    ///
    /// # Errors
    /// * `DuplicateName` if any resource already uses `name`
    /// * `InvalidDimension` if `size` is zero
    pub fn declare_buffer(&mut self, name: &str, size: u64, clear_each_frame: bool) -> Result<BufferHandle> {
        self.ensure_unused(name)?;
        if size == 0 {
            return Err(PipelineError::InvalidDimension {
                name: name.to_string(),
                reason: "buffer size must be positive".to_string(),
            });
        }

        tracing::debug!(name, size, clear_each_frame, "declared buffer");
        self.buffers.push(BufferSpec {
            name: name.to_string(),
            size,
            clear_each_frame,
        });
        Ok(BufferHandle { name: name.to_string() })
    }

    /// Declares a texture from a complete [`TextureSpec`]
    ///
    /// # Errors
    /// * `DuplicateName` if any resource already uses the name
    /// * `InvalidDimension` if width or height is zero
    pub fn declare_texture(&mut self, spec: TextureSpec) -> Result<TextureHandle> {
        self.ensure_unused(&spec.name)?;
        if spec.width == 0 || spec.height == 0 {
            return Err(PipelineError::InvalidDimension {
                name: spec.name,
                reason: "texture width and height must be positive".to_string(),
            });
        }

        tracing::debug!(name = %spec.name, format = %spec.format, width = spec.width, height = spec.height, "declared texture");
        let handle = TextureHandle { name: spec.name.clone() };
        self.textures.push(spec);
        Ok(handle)
    }

    /// Looks up a declared buffer by name
    pub fn buffer(&self, name: &str) -> Option<&BufferSpec> {
        self.buffers.iter().find(|buffer| buffer.name == name)
    }

    /// Looks up a declared texture by name
    pub fn texture(&self, name: &str) -> Option<&TextureSpec> {
        self.textures.iter().find(|texture| texture.name == name)
    }

    /// Declared buffers in declaration order
    pub fn buffers(&self) -> &[BufferSpec] {
        &self.buffers
    }

    /// Declared textures in declaration order
    pub fn textures(&self) -> &[TextureSpec] {
        &self.textures
    }

    pub(crate) fn into_parts(self) -> (Vec<BufferSpec>, Vec<TextureSpec>) {
        (self.buffers, self.textures)
    }

    fn ensure_unused(&self, name: &str) -> Result<()> {
        let kind = if self.buffer(name).is_some() {
            "buffer"
        } else if self.texture(name).is_some() {
            "texture"
        } else {
            return Ok(());
        };
        Err(PipelineError::DuplicateName { kind, name: name.to_string() })
    }
}
