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

//! Defines the hierarchy of error types for the abstraction layer.
//!
//! Resource-level failures never abort the frame or other resources;
//! only [`RenderError::InitializationFailed`] is unrecoverable for an
//! engine instance.

use crate::api::buffer::BufferId;
use crate::api::texture::TextureId;
use crate::driver::ShaderStage;
use std::fmt;

/// An error related to shader compilation or program linking.
#[derive(Debug)]
pub enum ShaderError {
    /// A shader stage failed to compile.
    CompilationError {
        /// Which stage was compiling.
        stage: ShaderStage,
        /// The effect key or source label being built.
        label: String,
        /// The driver's compiler diagnostic.
        details: String,
    },
    /// The vertex/fragment pair failed to link.
    LinkError {
        /// The effect key or source label being built.
        label: String,
        /// The driver's linker diagnostic.
        details: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError {
                stage,
                label,
                details,
            } => {
                write!(
                    f,
                    "{stage} shader compilation failed for '{label}': {details}"
                )
            }
            ShaderError::LinkError { label, details } => {
                write!(f, "Program link failed for '{label}': {details}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to buffer creation or use.
#[derive(Debug)]
pub enum BufferError {
    /// The index data contains a value above `u16::MAX` but the context
    /// has no 32-bit index support. Truncating would silently wrap the
    /// indices, so creation is refused instead.
    WideIndicesUnsupported {
        /// The first offending index value.
        index_value: u32,
    },
    /// The referenced buffer is not in the registry.
    NotFound {
        id: BufferId,
    },
    /// A sub-range update falls outside the source data.
    OutOfBounds,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::WideIndicesUnsupported { index_value } => {
                write!(
                    f,
                    "Index value {index_value} needs 32-bit indices, which this context does not support"
                )
            }
            BufferError::NotFound { id } => {
                write!(f, "Buffer not found for ID: {id:?}")
            }
            BufferError::OutOfBounds => {
                write!(f, "Buffer update range is out of bounds.")
            }
        }
    }
}

impl std::error::Error for BufferError {}

/// An error related to texture creation or use.
#[derive(Debug)]
pub enum TextureError {
    /// The container format cannot be decoded by this engine. Callers
    /// get an explicit failure instead of a silently broken texture.
    UnsupportedFormat {
        /// The url or format tag that was rejected.
        source: String,
    },
    /// The referenced texture is not in the registry.
    NotFound {
        id: TextureId,
    },
    /// The caller supplied no url candidates at all.
    EmptySourceList,
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::UnsupportedFormat { source } => {
                write!(f, "Unsupported texture format: '{source}'")
            }
            TextureError::NotFound { id } => {
                write!(f, "Texture not found for ID: {id:?}")
            }
            TextureError::EmptySourceList => {
                write!(f, "No texture source urls were provided.")
            }
        }
    }
}

impl std::error::Error for TextureError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A buffer-specific error occurred.
    Buffer(BufferError),
    /// A texture-specific error occurred.
    Texture(TextureError),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Buffer(err) => write!(f, "Buffer resource error: {err}"),
            ResourceError::Texture(err) => write!(f, "Texture resource error: {err}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Buffer(err) => Some(err),
            ResourceError::Texture(err) => Some(err),
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<BufferError> for ResourceError {
    fn from(err: BufferError) -> Self {
        ResourceError::Buffer(err)
    }
}

impl From<TextureError> for ResourceError {
    fn from(err: TextureError) -> Self {
        ResourceError::Texture(err)
    }
}

/// A high-level error from the engine itself.
#[derive(Debug)]
pub enum RenderError {
    /// The graphics context is unusable (missing or unsupported). The
    /// only unrecoverable error class for an engine instance.
    InitializationFailed(String),
    /// An error occurred while managing a GPU resource.
    Resource(ResourceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize graphics context: {msg}")
            }
            RenderError::Resource(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn shader_error_display() {
        let err = ShaderError::CompilationError {
            stage: ShaderStage::Vertex,
            label: "basic+basic@".to_string(),
            details: "Syntax error at line 5".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "vertex shader compilation failed for 'basic+basic@': Syntax error at line 5"
        );
    }

    #[test]
    fn wide_index_error_display() {
        let err = BufferError::WideIndicesUnsupported { index_value: 70000 };
        assert_eq!(
            format!("{err}"),
            "Index value 70000 needs 32-bit indices, which this context does not support"
        );
    }

    #[test]
    fn render_error_source_chain() {
        let shader_err = ShaderError::LinkError {
            label: "fx".to_string(),
            details: "mismatched varyings".to_string(),
        };
        let res_err: ResourceError = shader_err.into();
        let render_err: RenderError = res_err.into();
        assert_eq!(
            format!("{render_err}"),
            "Graphics resource operation failed: Shader resource error: Program link failed for 'fx': mismatched varyings"
        );
        assert!(render_err.source().unwrap().source().is_some());
    }
}
