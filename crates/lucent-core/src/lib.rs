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

//! Contracts and core types for the Lucent graphics abstraction layer.
//!
//! This crate holds everything both sides of the driver seam agree on:
//! the [`driver::GlDriver`] trait modeling a stateful GL-style context,
//! the opaque resource handles, the closed mode enumerations, the
//! immutable [`api::Capabilities`] record and the error hierarchy. The
//! engine implementation lives in `lucent-engine`.

pub mod api;
pub mod driver;
pub mod error;

pub use api::{
    AlphaMode, Attachment, BlendFactor, BufferId, BufferTarget, BufferUsage, Capabilities,
    CompareFunction, CubeMapFace, CullFaceMode, DrawMode, DriverInfo, ImageData, IndexKind,
    MagFilter, MinFilter, PixelFormat, PixelType, RenderTargetOptions, RenderbufferFormat,
    SamplingMode, StencilOperation, TexImageTarget, TextureId, TextureTarget, Toggle,
    VertexAttribType, WrapAxis, WrapMode,
};
pub use driver::{
    BufferHandle, FramebufferHandle, GlDriver, IntParameter, ProgramHandle, RenderbufferHandle,
    ShaderHandle, ShaderStage, StringParameter, TextureHandle, UniformHandle,
};
pub use error::{BufferError, RenderError, ResourceError, ShaderError, TextureError};
