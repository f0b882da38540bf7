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

//! Closed enumerations for the mutable pipeline state the engine tracks.

/// A global capability that can be enabled or disabled on the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    DepthTest,
    CullFace,
    Blend,
    StencilTest,
}

/// The comparison function used for depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    /// Passes when the incoming value is less than or equal. The engine
    /// default for depth testing.
    #[default]
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// A blend factor for one operand of the blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

/// The operation applied to a stencil value when a test resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    #[default]
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

/// Which triangle faces are discarded by culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFaceMode {
    Front,
    #[default]
    Back,
    FrontAndBack,
}

/// The primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Triangles,
    Lines,
    Points,
}

/// The element-index width of an index buffer.
///
/// A mesh with any index above `u16::MAX` must use [`IndexKind::U32`];
/// uploading such a mesh as `U16` would silently wrap its indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexKind {
    #[default]
    U16,
    U32,
}

impl IndexKind {
    /// The size of one index in bytes, used to scale draw offsets.
    pub fn byte_width(self) -> usize {
        match self {
            IndexKind::U16 => 2,
            IndexKind::U32 => 4,
        }
    }
}

/// The closed set of alpha-blend modes the engine exposes.
///
/// Each mode maps to a fixed `(srcRGB, dstRGB, srcAlpha, dstAlpha)`
/// tuple; callers never pick raw factors directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlphaMode {
    /// Blending off; source fragments overwrite the target.
    #[default]
    Disable,
    /// Classic "over" compositing with the source alpha.
    Combine,
    /// Pure additive accumulation.
    Additive,
    /// Alpha-weighted additive.
    Add,
    /// Subtracts the source color from the destination.
    Subtract,
    /// Modulates the destination by the source color.
    Multiply,
    /// Brightness-maximizing additive blend.
    Maximize,
}

impl AlphaMode {
    /// The fixed blend-function tuple for this mode, or `None` for
    /// [`AlphaMode::Disable`].
    pub fn blend_function(self) -> Option<(BlendFactor, BlendFactor, BlendFactor, BlendFactor)> {
        use BlendFactor::*;
        match self {
            AlphaMode::Disable => None,
            AlphaMode::Combine => Some((SrcAlpha, OneMinusSrcAlpha, One, One)),
            AlphaMode::Additive => Some((One, One, Zero, One)),
            AlphaMode::Add => Some((SrcAlpha, One, Zero, One)),
            AlphaMode::Subtract => Some((Zero, OneMinusSrcColor, One, One)),
            AlphaMode::Multiply => Some((DstColor, Zero, One, One)),
            AlphaMode::Maximize => Some((SrcAlpha, OneMinusSrcColor, One, One)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_kind_byte_widths() {
        assert_eq!(IndexKind::U16.byte_width(), 2);
        assert_eq!(IndexKind::U32.byte_width(), 4);
    }

    #[test]
    fn alpha_mode_table_is_fixed() {
        assert!(AlphaMode::Disable.blend_function().is_none());
        assert_eq!(
            AlphaMode::Combine.blend_function(),
            Some((
                BlendFactor::SrcAlpha,
                BlendFactor::OneMinusSrcAlpha,
                BlendFactor::One,
                BlendFactor::One
            ))
        );
        assert_eq!(
            AlphaMode::Multiply.blend_function(),
            Some((
                BlendFactor::DstColor,
                BlendFactor::Zero,
                BlendFactor::One,
                BlendFactor::One
            ))
        );
    }
}
