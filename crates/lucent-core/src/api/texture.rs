// Copyright 2025 the Lucent authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Types describing GPU texture and sampler state.

/// A binding point for texture objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    /// An ordinary two-dimensional texture.
    Texture2D,
    /// A six-faced cube map.
    CubeMap,
}

/// One face of a cube map, in upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeMapFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeMapFace {
    /// All six faces in upload order.
    pub fn all() -> [CubeMapFace; 6] {
        [
            CubeMapFace::PositiveX,
            CubeMapFace::NegativeX,
            CubeMapFace::PositiveY,
            CubeMapFace::NegativeY,
            CubeMapFace::PositiveZ,
            CubeMapFace::NegativeZ,
        ]
    }
}

/// The target of a single 2D image upload or attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexImageTarget {
    /// The image of a 2D texture.
    D2,
    /// One face of a cube map.
    CubeFace(CubeMapFace),
}

impl TexImageTarget {
    /// The texture binding point this image target belongs to.
    pub fn texture_target(self) -> TextureTarget {
        match self {
            TexImageTarget::D2 => TextureTarget::Texture2D,
            TexImageTarget::CubeFace(_) => TextureTarget::CubeMap,
        }
    }
}

/// The channel layout of uploaded pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    Alpha,
    Luminance,
    LuminanceAlpha,
    Rgb,
    #[default]
    Rgba,
}

impl PixelFormat {
    /// Bytes per pixel for [`PixelType::UnsignedByte`] storage, used to
    /// detect rows that break the default unpack alignment.
    pub fn channel_count(self) -> u32 {
        match self {
            PixelFormat::Alpha | PixelFormat::Luminance => 1,
            PixelFormat::LuminanceAlpha => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// The storage type of each pixel channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelType {
    #[default]
    UnsignedByte,
    Float,
    HalfFloat,
}

/// The filtering configuration requested for a texture.
///
/// The mode expands to a concrete (mag, min) filter pair that depends on
/// whether the texture carries mipmaps; see [`SamplingMode::filters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplingMode {
    /// Point sampling.
    Nearest,
    /// Linear mag/min without inter-mip blending.
    Bilinear,
    /// Linear mag/min with linear mip interpolation.
    #[default]
    Trilinear,
}

/// Magnification filters the driver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagFilter {
    Nearest,
    Linear,
}

/// Minification filters (including mipmapped variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapLinear,
    LinearMipmapNearest,
    LinearMipmapLinear,
}

impl SamplingMode {
    /// Expands the sampling mode to driver filters, accounting for the
    /// presence of mipmaps.
    pub fn filters(self, has_mipmaps: bool) -> (MagFilter, MinFilter) {
        match (self, has_mipmaps) {
            (SamplingMode::Nearest, true) => (MagFilter::Nearest, MinFilter::NearestMipmapLinear),
            (SamplingMode::Nearest, false) => (MagFilter::Nearest, MinFilter::Nearest),
            (SamplingMode::Bilinear, true) => (MagFilter::Linear, MinFilter::LinearMipmapNearest),
            (SamplingMode::Bilinear, false) => (MagFilter::Linear, MinFilter::Linear),
            (SamplingMode::Trilinear, true) => (MagFilter::Linear, MinFilter::LinearMipmapLinear),
            (SamplingMode::Trilinear, false) => (MagFilter::Linear, MinFilter::Linear),
        }
    }
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Coordinates repeat.
    #[default]
    Wrap,
    /// Coordinates clamp to the edge texel.
    Clamp,
    /// Coordinates repeat, mirrored at integer boundaries.
    Mirror,
}

/// The texture coordinate axis a wrap mode applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapAxis {
    U,
    V,
}

/// A framebuffer attachment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Color0,
    Depth,
    DepthStencil,
}

/// Storage formats for depth/stencil renderbuffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderbufferFormat {
    Depth16,
    DepthStencil,
}

/// Configuration for render-target texture creation.
#[derive(Debug, Clone, Copy)]
pub struct RenderTargetOptions {
    /// Generate a mipmap chain for the color texture.
    pub generate_mipmaps: bool,
    /// Attach a depth renderbuffer.
    pub generate_depth_buffer: bool,
    /// Attach a combined depth/stencil renderbuffer. Implies depth.
    pub generate_stencil_buffer: bool,
    /// Requested sampling mode for the color texture.
    pub sampling_mode: SamplingMode,
    /// Requested storage type; may be downgraded when the context cannot
    /// render to floating-point targets.
    pub pixel_type: PixelType,
}

impl Default for RenderTargetOptions {
    fn default() -> Self {
        Self {
            generate_mipmaps: false,
            generate_depth_buffer: true,
            generate_stencil_buffer: false,
            sampling_mode: SamplingMode::Trilinear,
            pixel_type: PixelType::UnsignedByte,
        }
    }
}

/// An opaque id for an engine-managed, reference-counted GPU texture.
///
/// This identifies the engine-owned internal texture, distinct from any
/// higher-level material texture wrapper built on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// A decoded image handed to the engine by the asset-loading layer.
///
/// The engine is agnostic to container formats; it only ever consumes
/// dimensions plus RGBA pixel data once decode completes.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub pixels: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_filters_respect_mipmaps() {
        assert_eq!(
            SamplingMode::Trilinear.filters(true),
            (MagFilter::Linear, MinFilter::LinearMipmapLinear)
        );
        assert_eq!(
            SamplingMode::Trilinear.filters(false),
            (MagFilter::Linear, MinFilter::Linear)
        );
        assert_eq!(
            SamplingMode::Nearest.filters(false),
            (MagFilter::Nearest, MinFilter::Nearest)
        );
    }
}
