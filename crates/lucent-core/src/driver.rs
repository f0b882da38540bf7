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

//! The seam between the engine and a concrete GL-style graphics context.
//!
//! Every driver call the engine issues flows through [`GlDriver`], so a
//! backend can be swapped out wholesale and tests can run against an
//! in-memory implementation that merely records calls. The trait mirrors
//! the shape of a bound-context API: operations act on the currently
//! bound buffer/texture/program rather than taking resource arguments.

use crate::api::buffer::{BufferTarget, BufferUsage, VertexAttribType};
use crate::api::pipeline::{
    BlendFactor, CompareFunction, CullFaceMode, DrawMode, IndexKind, StencilOperation, Toggle,
};
use crate::api::texture::{
    Attachment, MagFilter, MinFilter, PixelFormat, PixelType, RenderbufferFormat, TexImageTarget,
    TextureTarget, WrapAxis, WrapMode,
};
use std::fmt;

/// An opaque handle to a driver-side buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub usize);

/// An opaque handle to a driver-side texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub usize);

/// An opaque handle to a driver-side framebuffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(pub usize);

/// An opaque handle to a driver-side renderbuffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderbufferHandle(pub usize);

/// An opaque handle to a compiled (but not yet linked) shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub usize);

/// An opaque handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub usize);

/// An opaque handle to a uniform location within a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformHandle(pub usize);

/// Integer limits the engine queries once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntParameter {
    MaxTextureImageUnits,
    MaxTextureSize,
    MaxCubemapTextureSize,
    MaxRenderbufferSize,
    MaxVertexAttribs,
    MaxTextureAnisotropy,
}

/// Identification strings exposed by the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringParameter {
    Vendor,
    Renderer,
    Version,
}

/// The shader stage a source string compiles into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// A stateful, GL-style graphics context.
///
/// All methods take `&self`: a real backend owns mutable driver state
/// behind its own interior mutability, exactly as the context itself is
/// a big ball of hidden mutable state. The engine is the single mutator
/// thread; implementations only need `Send + Sync` so the engine can be
/// held behind an `Arc`.
pub trait GlDriver: Send + Sync + fmt::Debug + 'static {
    // --- Context queries ---

    /// Reads an integer limit. Never fails; unknown limits report 0.
    fn get_integer(&self, parameter: IntParameter) -> i32;

    /// Reads an identification string. An empty `Version` string means
    /// the context is unusable.
    fn get_string(&self, parameter: StringParameter) -> String;

    /// Lists the extension names the context supports.
    fn get_extensions(&self) -> Vec<String>;

    // --- Global toggles ---

    fn enable(&self, toggle: Toggle);
    fn disable(&self, toggle: Toggle);

    // --- Buffers ---

    fn create_buffer(&self) -> BufferHandle;
    fn delete_buffer(&self, buffer: BufferHandle);

    /// Binds `buffer` to `target`, or unbinds the target when `None`.
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Uploads `data` into the buffer currently bound to `target`.
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    /// Allocates `size` bytes of uninitialized storage for the buffer
    /// currently bound to `target`.
    fn buffer_reserve(&self, target: BufferTarget, size: usize, usage: BufferUsage);

    /// Overwrites a sub-range of the buffer currently bound to `target`.
    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);

    // --- Vertex attributes ---

    fn enable_vertex_attrib(&self, location: u32);
    fn disable_vertex_attrib(&self, location: u32);

    /// Points `location` at the array buffer currently bound.
    fn vertex_attrib_pointer(
        &self,
        location: u32,
        size: i32,
        kind: VertexAttribType,
        normalized: bool,
        stride: i32,
        offset: usize,
    );

    /// Sets the instancing divisor for `location` (0 = per vertex).
    fn vertex_attrib_divisor(&self, location: u32, divisor: u32);

    // --- Textures ---

    fn create_texture(&self) -> TextureHandle;
    fn delete_texture(&self, texture: TextureHandle);

    /// Selects the active texture unit.
    fn active_texture(&self, unit: u32);

    /// Binds `texture` to `target` on the active unit, or unbinds it.
    fn bind_texture(&self, target: TextureTarget, texture: Option<TextureHandle>);

    /// Uploads pixel data (or reserves storage when `data` is `None`)
    /// for the texture bound to the target `image_target` belongs to.
    fn tex_image_2d(
        &self,
        image_target: TexImageTarget,
        format: PixelFormat,
        width: u32,
        height: u32,
        pixel_type: PixelType,
        data: Option<&[u8]>,
    );

    fn set_texture_filters(&self, target: TextureTarget, mag: MagFilter, min: MinFilter);
    fn set_texture_wrap(&self, target: TextureTarget, axis: WrapAxis, mode: WrapMode);
    fn set_texture_anisotropy(&self, target: TextureTarget, level: u32);
    fn generate_mipmaps(&self, target: TextureTarget);

    /// Controls whether uploads flip rows vertically (unpack state).
    fn set_unpack_flip_y(&self, flip: bool);

    /// Sets the unpack row alignment in bytes (1, 2, 4 or 8).
    fn set_unpack_alignment(&self, alignment: i32);

    // --- Framebuffers and renderbuffers ---

    fn create_framebuffer(&self) -> FramebufferHandle;
    fn delete_framebuffer(&self, framebuffer: FramebufferHandle);
    fn bind_framebuffer(&self, framebuffer: Option<FramebufferHandle>);

    /// Attaches a texture image to the bound framebuffer.
    fn framebuffer_texture_2d(
        &self,
        attachment: Attachment,
        image_target: TexImageTarget,
        texture: TextureHandle,
    );

    fn create_renderbuffer(&self) -> RenderbufferHandle;
    fn delete_renderbuffer(&self, renderbuffer: RenderbufferHandle);
    fn bind_renderbuffer(&self, renderbuffer: Option<RenderbufferHandle>);

    /// Allocates storage for the bound renderbuffer.
    fn renderbuffer_storage(&self, format: RenderbufferFormat, width: u32, height: u32);

    /// Attaches the given renderbuffer to the bound framebuffer.
    fn framebuffer_renderbuffer(&self, attachment: Attachment, renderbuffer: RenderbufferHandle);

    // --- Shaders and programs ---

    /// Compiles one shader stage. `Err` carries the compiler diagnostic.
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String>;

    /// Links a vertex/fragment pair. `Err` carries the linker diagnostic.
    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String>;

    fn delete_shader(&self, shader: ShaderHandle);
    fn delete_program(&self, program: ProgramHandle);

    fn use_program(&self, program: Option<ProgramHandle>);

    /// Resolves an attribute name; `None` when the linker discarded it.
    fn get_attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Resolves a uniform name; `None` when it does not exist.
    fn get_uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformHandle>;

    fn set_uniform_int(&self, uniform: UniformHandle, value: i32);
    fn set_uniform_float(&self, uniform: UniformHandle, value: f32);
    fn set_uniform_float4(&self, uniform: UniformHandle, value: [f32; 4]);
    fn set_uniform_matrix4(&self, uniform: UniformHandle, value: &[f32; 16]);

    // --- Pipeline state ---

    fn depth_func(&self, func: CompareFunction);
    fn depth_mask(&self, write: bool);
    fn color_mask(&self, red: bool, green: bool, blue: bool, alpha: bool);
    fn cull_face(&self, mode: CullFaceMode);
    fn blend_func_separate(
        &self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );
    fn stencil_func(&self, func: CompareFunction, reference: i32, mask: u32);
    fn stencil_mask(&self, mask: u32);
    fn stencil_op(
        &self,
        fail: StencilOperation,
        depth_fail: StencilOperation,
        pass: StencilOperation,
    );

    // --- Framebuffer operations ---

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    /// Clears the bound framebuffer. `color` carries the clear color for
    /// the color planes; `depth`/`stencil` select the other planes.
    fn clear(&self, color: Option<[f32; 4]>, depth: bool, stencil: bool);

    // --- Draws ---

    fn draw_elements(&self, mode: DrawMode, count: i32, kind: IndexKind, byte_offset: usize);
    fn draw_elements_instanced(
        &self,
        mode: DrawMode,
        count: i32,
        kind: IndexKind,
        byte_offset: usize,
        instances: i32,
    );
    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32);
    fn draw_arrays_instanced(&self, mode: DrawMode, first: i32, count: i32, instances: i32);

    /// Forces submission of queued work (used for misbehaving drivers).
    fn flush(&self);
}
