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

//! An in-memory, call-counting [`GlDriver`] implementation.
//!
//! The headless driver backs the engine's test suite and any CI run that
//! has no windowing system: it allocates handles, tracks bindings and
//! counts every call by method name, so tests can assert that redundant
//! driver work was actually elided. It performs no rendering.

use lucent_core::api::buffer::{BufferTarget, BufferUsage, VertexAttribType};
use lucent_core::api::pipeline::{
    BlendFactor, CompareFunction, CullFaceMode, DrawMode, IndexKind, StencilOperation, Toggle,
};
use lucent_core::api::texture::{
    Attachment, MagFilter, MinFilter, PixelFormat, PixelType, RenderbufferFormat, TexImageTarget,
    TextureTarget, WrapAxis, WrapMode,
};
use lucent_core::driver::{
    BufferHandle, FramebufferHandle, GlDriver, IntParameter, ProgramHandle, RenderbufferHandle,
    ShaderHandle, ShaderStage, StringParameter, TextureHandle, UniformHandle,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Static configuration for a [`HeadlessDriver`].
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
    /// Extension strings the fake context reports.
    pub extensions: Vec<String>,
    pub max_texture_units: i32,
    pub max_texture_size: i32,
    pub max_cubemap_texture_size: i32,
    pub max_renderbuffer_size: i32,
    pub max_vertex_attribs: i32,
    pub max_anisotropy: i32,
    /// Names that fail to resolve as attributes or uniforms, emulating
    /// locations the linker discarded.
    pub unknown_names: Vec<String>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            vendor: "Lucent".to_string(),
            renderer: "Headless".to_string(),
            version: "1.0 headless".to_string(),
            extensions: vec![
                "OES_element_index_uint".to_string(),
                "ANGLE_instanced_arrays".to_string(),
                "EXT_texture_filter_anisotropic".to_string(),
                "OES_texture_float".to_string(),
                "OES_texture_float_linear".to_string(),
                "OES_texture_half_float".to_string(),
                "OES_texture_half_float_linear".to_string(),
                "WEBGL_draw_buffers".to_string(),
                "EXT_shader_texture_lod".to_string(),
                "OES_standard_derivatives".to_string(),
            ],
            max_texture_units: 16,
            max_texture_size: 16384,
            max_cubemap_texture_size: 16384,
            max_renderbuffer_size: 16384,
            max_vertex_attribs: 16,
            max_anisotropy: 16,
            unknown_names: Vec::new(),
        }
    }
}

impl HeadlessConfig {
    /// A context with no optional extensions at all, for exercising the
    /// conservative degradation paths.
    pub fn minimal() -> Self {
        Self {
            extensions: Vec::new(),
            max_anisotropy: 0,
            ..Self::default()
        }
    }

    /// A context whose `Version` string is empty, i.e. unusable.
    pub fn broken() -> Self {
        Self {
            version: String::new(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct HeadlessState {
    calls: Vec<&'static str>,
    counts: HashMap<&'static str, u32>,

    next_handle: usize,
    /// Deleted buffer names are handed out again first, the way GL name
    /// allocation recycles them.
    free_buffer_handles: Vec<BufferHandle>,
    live_buffers: HashSet<BufferHandle>,
    live_textures: HashSet<TextureHandle>,
    live_framebuffers: HashSet<FramebufferHandle>,
    live_renderbuffers: HashSet<RenderbufferHandle>,
    live_programs: HashSet<ProgramHandle>,

    bound_buffers: [Option<BufferHandle>; 2],
    bound_program: Option<ProgramHandle>,
    active_unit: u32,

    // Per-program location tables, assigned on first lookup.
    attrib_locations: HashMap<(ProgramHandle, String), u32>,
    uniform_locations: HashMap<(ProgramHandle, String), UniformHandle>,

    fail_next_compile: Option<String>,
    fail_next_link: Option<String>,
}

/// A [`GlDriver`] that records every call instead of rendering.
#[derive(Debug)]
pub struct HeadlessDriver {
    config: HeadlessConfig,
    state: Mutex<HeadlessState>,
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl HeadlessDriver {
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            config,
            state: Mutex::new(HeadlessState::default()),
        }
    }

    /// Number of times the named driver method has been called.
    pub fn call_count(&self, name: &str) -> u32 {
        let state = self.state.lock().unwrap();
        state.counts.get(name).copied().unwrap_or(0)
    }

    /// The full call sequence, by method name.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Forgets all recorded calls (handles and bindings are kept).
    pub fn reset_counts(&self) {
        let mut state = self.state.lock().unwrap();
        state.calls.clear();
        state.counts.clear();
    }

    /// Makes the next `compile_shader` fail with `diagnostic`.
    pub fn inject_compile_error(&self, diagnostic: &str) {
        self.state.lock().unwrap().fail_next_compile = Some(diagnostic.to_string());
    }

    /// Makes the next `link_program` fail with `diagnostic`.
    pub fn inject_link_error(&self, diagnostic: &str) {
        self.state.lock().unwrap().fail_next_link = Some(diagnostic.to_string());
    }

    /// How many buffer objects are currently alive.
    pub fn live_buffer_count(&self) -> usize {
        self.state.lock().unwrap().live_buffers.len()
    }

    /// How many texture objects are currently alive.
    pub fn live_texture_count(&self) -> usize {
        self.state.lock().unwrap().live_textures.len()
    }

    fn record(&self, name: &'static str) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(name);
        *state.counts.entry(name).or_insert(0) += 1;
    }

    fn next_handle(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        state.next_handle += 1;
        state.next_handle
    }
}

impl GlDriver for HeadlessDriver {
    fn get_integer(&self, parameter: IntParameter) -> i32 {
        match parameter {
            IntParameter::MaxTextureImageUnits => self.config.max_texture_units,
            IntParameter::MaxTextureSize => self.config.max_texture_size,
            IntParameter::MaxCubemapTextureSize => self.config.max_cubemap_texture_size,
            IntParameter::MaxRenderbufferSize => self.config.max_renderbuffer_size,
            IntParameter::MaxVertexAttribs => self.config.max_vertex_attribs,
            IntParameter::MaxTextureAnisotropy => self.config.max_anisotropy,
        }
    }

    fn get_string(&self, parameter: StringParameter) -> String {
        match parameter {
            StringParameter::Vendor => self.config.vendor.clone(),
            StringParameter::Renderer => self.config.renderer.clone(),
            StringParameter::Version => self.config.version.clone(),
        }
    }

    fn get_extensions(&self) -> Vec<String> {
        self.config.extensions.clone()
    }

    fn enable(&self, _toggle: Toggle) {
        self.record("enable");
    }

    fn disable(&self, _toggle: Toggle) {
        self.record("disable");
    }

    fn create_buffer(&self) -> BufferHandle {
        self.record("create_buffer");
        let mut state = self.state.lock().unwrap();
        let handle = match state.free_buffer_handles.pop() {
            Some(recycled) => recycled,
            None => {
                state.next_handle += 1;
                BufferHandle(state.next_handle)
            }
        };
        state.live_buffers.insert(handle);
        handle
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        self.record("delete_buffer");
        let mut state = self.state.lock().unwrap();
        state.live_buffers.remove(&buffer);
        state.free_buffer_handles.push(buffer);
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.record("bind_buffer");
        self.state.lock().unwrap().bound_buffers[target.cache_slot()] = buffer;
    }

    fn buffer_data(&self, _target: BufferTarget, _data: &[u8], _usage: BufferUsage) {
        self.record("buffer_data");
    }

    fn buffer_reserve(&self, _target: BufferTarget, _size: usize, _usage: BufferUsage) {
        self.record("buffer_reserve");
    }

    fn buffer_sub_data(&self, _target: BufferTarget, _offset: usize, _data: &[u8]) {
        self.record("buffer_sub_data");
    }

    fn enable_vertex_attrib(&self, _location: u32) {
        self.record("enable_vertex_attrib");
    }

    fn disable_vertex_attrib(&self, _location: u32) {
        self.record("disable_vertex_attrib");
    }

    fn vertex_attrib_pointer(
        &self,
        _location: u32,
        _size: i32,
        _kind: VertexAttribType,
        _normalized: bool,
        _stride: i32,
        _offset: usize,
    ) {
        self.record("vertex_attrib_pointer");
    }

    fn vertex_attrib_divisor(&self, _location: u32, _divisor: u32) {
        self.record("vertex_attrib_divisor");
    }

    fn create_texture(&self) -> TextureHandle {
        self.record("create_texture");
        let handle = TextureHandle(self.next_handle());
        self.state.lock().unwrap().live_textures.insert(handle);
        handle
    }

    fn delete_texture(&self, texture: TextureHandle) {
        self.record("delete_texture");
        self.state.lock().unwrap().live_textures.remove(&texture);
    }

    fn active_texture(&self, unit: u32) {
        self.record("active_texture");
        self.state.lock().unwrap().active_unit = unit;
    }

    fn bind_texture(&self, _target: TextureTarget, _texture: Option<TextureHandle>) {
        self.record("bind_texture");
    }

    fn tex_image_2d(
        &self,
        _image_target: TexImageTarget,
        _format: PixelFormat,
        _width: u32,
        _height: u32,
        _pixel_type: PixelType,
        _data: Option<&[u8]>,
    ) {
        self.record("tex_image_2d");
    }

    fn set_texture_filters(&self, _target: TextureTarget, _mag: MagFilter, _min: MinFilter) {
        self.record("set_texture_filters");
    }

    fn set_texture_wrap(&self, _target: TextureTarget, _axis: WrapAxis, _mode: WrapMode) {
        self.record("set_texture_wrap");
    }

    fn set_texture_anisotropy(&self, _target: TextureTarget, _level: u32) {
        self.record("set_texture_anisotropy");
    }

    fn generate_mipmaps(&self, target: TextureTarget) {
        match target {
            TextureTarget::Texture2D => self.record("generate_mipmaps"),
            TextureTarget::CubeMap => self.record("generate_mipmaps_cube"),
        }
    }

    fn set_unpack_flip_y(&self, _flip: bool) {
        self.record("set_unpack_flip_y");
    }

    fn set_unpack_alignment(&self, _alignment: i32) {
        self.record("set_unpack_alignment");
    }

    fn create_framebuffer(&self) -> FramebufferHandle {
        self.record("create_framebuffer");
        let handle = FramebufferHandle(self.next_handle());
        self.state.lock().unwrap().live_framebuffers.insert(handle);
        handle
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferHandle) {
        self.record("delete_framebuffer");
        self.state
            .lock()
            .unwrap()
            .live_framebuffers
            .remove(&framebuffer);
    }

    fn bind_framebuffer(&self, _framebuffer: Option<FramebufferHandle>) {
        self.record("bind_framebuffer");
    }

    fn framebuffer_texture_2d(
        &self,
        _attachment: Attachment,
        _image_target: TexImageTarget,
        _texture: TextureHandle,
    ) {
        self.record("framebuffer_texture_2d");
    }

    fn create_renderbuffer(&self) -> RenderbufferHandle {
        self.record("create_renderbuffer");
        let handle = RenderbufferHandle(self.next_handle());
        self.state.lock().unwrap().live_renderbuffers.insert(handle);
        handle
    }

    fn delete_renderbuffer(&self, renderbuffer: RenderbufferHandle) {
        self.record("delete_renderbuffer");
        self.state
            .lock()
            .unwrap()
            .live_renderbuffers
            .remove(&renderbuffer);
    }

    fn bind_renderbuffer(&self, _renderbuffer: Option<RenderbufferHandle>) {
        self.record("bind_renderbuffer");
    }

    fn renderbuffer_storage(&self, format: RenderbufferFormat, _width: u32, _height: u32) {
        match format {
            RenderbufferFormat::Depth16 => self.record("renderbuffer_storage"),
            RenderbufferFormat::DepthStencil => self.record("renderbuffer_storage_depth_stencil"),
        }
    }

    fn framebuffer_renderbuffer(
        &self,
        _attachment: Attachment,
        _renderbuffer: RenderbufferHandle,
    ) {
        self.record("framebuffer_renderbuffer");
    }

    fn compile_shader(&self, _stage: ShaderStage, _source: &str) -> Result<ShaderHandle, String> {
        self.record("compile_shader");
        if let Some(diagnostic) = self.state.lock().unwrap().fail_next_compile.take() {
            return Err(diagnostic);
        }
        Ok(ShaderHandle(self.next_handle()))
    }

    fn link_program(
        &self,
        _vertex: ShaderHandle,
        _fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String> {
        self.record("link_program");
        if let Some(diagnostic) = self.state.lock().unwrap().fail_next_link.take() {
            return Err(diagnostic);
        }
        let handle = ProgramHandle(self.next_handle());
        self.state.lock().unwrap().live_programs.insert(handle);
        Ok(handle)
    }

    fn delete_shader(&self, _shader: ShaderHandle) {
        self.record("delete_shader");
    }

    fn delete_program(&self, program: ProgramHandle) {
        self.record("delete_program");
        self.state.lock().unwrap().live_programs.remove(&program);
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.record("use_program");
        self.state.lock().unwrap().bound_program = program;
    }

    fn get_attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        if self.config.unknown_names.iter().any(|n| n == name) {
            return None;
        }
        let mut state = self.state.lock().unwrap();
        let next = state
            .attrib_locations
            .iter()
            .filter(|((p, _), _)| *p == program)
            .count() as u32;
        Some(
            *state
                .attrib_locations
                .entry((program, name.to_string()))
                .or_insert(next),
        )
    }

    fn get_uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformHandle> {
        if self.config.unknown_names.iter().any(|n| n == name) {
            return None;
        }
        let handle = UniformHandle(self.next_handle());
        let mut state = self.state.lock().unwrap();
        Some(
            *state
                .uniform_locations
                .entry((program, name.to_string()))
                .or_insert(handle),
        )
    }

    fn set_uniform_int(&self, _uniform: UniformHandle, _value: i32) {
        self.record("set_uniform_int");
    }

    fn set_uniform_float(&self, _uniform: UniformHandle, _value: f32) {
        self.record("set_uniform_float");
    }

    fn set_uniform_float4(&self, _uniform: UniformHandle, _value: [f32; 4]) {
        self.record("set_uniform_float4");
    }

    fn set_uniform_matrix4(&self, _uniform: UniformHandle, _value: &[f32; 16]) {
        self.record("set_uniform_matrix4");
    }

    fn depth_func(&self, _func: CompareFunction) {
        self.record("depth_func");
    }

    fn depth_mask(&self, _write: bool) {
        self.record("depth_mask");
    }

    fn color_mask(&self, _red: bool, _green: bool, _blue: bool, _alpha: bool) {
        self.record("color_mask");
    }

    fn cull_face(&self, _mode: CullFaceMode) {
        self.record("cull_face");
    }

    fn blend_func_separate(
        &self,
        _src_rgb: BlendFactor,
        _dst_rgb: BlendFactor,
        _src_alpha: BlendFactor,
        _dst_alpha: BlendFactor,
    ) {
        self.record("blend_func_separate");
    }

    fn stencil_func(&self, _func: CompareFunction, _reference: i32, _mask: u32) {
        self.record("stencil_func");
    }

    fn stencil_mask(&self, _mask: u32) {
        self.record("stencil_mask");
    }

    fn stencil_op(
        &self,
        _fail: StencilOperation,
        _depth_fail: StencilOperation,
        _pass: StencilOperation,
    ) {
        self.record("stencil_op");
    }

    fn viewport(&self, _x: i32, _y: i32, _width: i32, _height: i32) {
        self.record("viewport");
    }

    fn clear(&self, _color: Option<[f32; 4]>, _depth: bool, _stencil: bool) {
        self.record("clear");
    }

    fn draw_elements(&self, _mode: DrawMode, _count: i32, _kind: IndexKind, _byte_offset: usize) {
        self.record("draw_elements");
    }

    fn draw_elements_instanced(
        &self,
        _mode: DrawMode,
        _count: i32,
        _kind: IndexKind,
        _byte_offset: usize,
        _instances: i32,
    ) {
        self.record("draw_elements_instanced");
    }

    fn draw_arrays(&self, _mode: DrawMode, _first: i32, _count: i32) {
        self.record("draw_arrays");
    }

    fn draw_arrays_instanced(&self, _mode: DrawMode, _first: i32, _count: i32, _instances: i32) {
        self.record("draw_arrays_instanced");
    }

    fn flush(&self) {
        self.record("flush");
    }
}
