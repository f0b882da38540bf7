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

//! The immutable capability record probed once at context startup.

/// Identification strings reported by the graphics context.
#[derive(Debug, Clone, Default)]
pub struct DriverInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
}

/// Limits and optional features of the active context.
///
/// Produced once by the capability probe and never mutated; missing
/// extensions degrade to the conservative defaults below rather than
/// failing the probe.
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// Number of texture image units usable by a fragment shader.
    pub max_texture_units: u32,
    pub max_texture_size: u32,
    pub max_cubemap_texture_size: u32,
    pub max_render_texture_size: u32,
    pub max_vertex_attribs: u32,
    /// Maximum anisotropic filtering level; 0 when the extension is
    /// absent.
    pub max_anisotropy: u32,

    /// 32-bit element indices are available.
    pub uint_indices: bool,
    /// Instanced draw calls and attribute divisors are available.
    pub instanced_arrays: bool,
    /// Multiple color attachments can be drawn to at once.
    pub draw_buffers: bool,
    pub standard_derivatives: bool,
    /// Explicit texture LOD sampling in shaders.
    pub texture_lod: bool,

    pub texture_float: bool,
    pub texture_float_linear_filtering: bool,
    /// Float textures can be used as render-target storage.
    pub texture_float_render: bool,
    pub texture_half_float: bool,
    pub texture_half_float_linear_filtering: bool,
    pub texture_half_float_render: bool,

    pub high_precision_shader: bool,
}

impl Default for Capabilities {
    /// The conservative baseline used when a query is unavailable.
    fn default() -> Self {
        Self {
            max_texture_units: 8,
            max_texture_size: 1024,
            max_cubemap_texture_size: 512,
            max_render_texture_size: 1024,
            max_vertex_attribs: 8,
            max_anisotropy: 0,
            uint_indices: false,
            instanced_arrays: false,
            draw_buffers: false,
            standard_derivatives: false,
            texture_lod: false,
            texture_float: false,
            texture_float_linear_filtering: false,
            texture_float_render: false,
            texture_half_float: false,
            texture_half_float_linear_filtering: false,
            texture_half_float_render: false,
            high_precision_shader: false,
        }
    }
}
