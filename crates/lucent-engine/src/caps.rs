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

//! One-shot capability probing of the graphics context.

use lucent_core::api::caps::{Capabilities, DriverInfo};
use lucent_core::driver::{GlDriver, IntParameter, StringParameter};
use lucent_core::error::RenderError;

/// Queries limits and extensions exactly once.
///
/// Missing extensions degrade to conservative defaults; the only way
/// this fails is a context that reports no version string at all, which
/// is the fatal "no usable context" case.
pub fn probe(driver: &dyn GlDriver) -> Result<(Capabilities, DriverInfo), RenderError> {
    let version = driver.get_string(StringParameter::Version);
    if version.is_empty() {
        return Err(RenderError::InitializationFailed(
            "context reports no version string".to_string(),
        ));
    }

    let mut vendor = driver.get_string(StringParameter::Vendor);
    if vendor.is_empty() {
        vendor = "Unknown vendor".to_string();
    }
    let mut renderer = driver.get_string(StringParameter::Renderer);
    if renderer.is_empty() {
        renderer = "Unknown renderer".to_string();
    }
    let info = DriverInfo {
        vendor,
        renderer,
        version,
    };

    let extensions = driver.get_extensions();
    let has = |name: &str| extensions.iter().any(|e| e == name);

    let anisotropic = has("EXT_texture_filter_anisotropic");
    let caps = Capabilities {
        max_texture_units: driver.get_integer(IntParameter::MaxTextureImageUnits).max(1) as u32,
        max_texture_size: driver.get_integer(IntParameter::MaxTextureSize).max(1) as u32,
        max_cubemap_texture_size: driver
            .get_integer(IntParameter::MaxCubemapTextureSize)
            .max(1) as u32,
        max_render_texture_size: driver.get_integer(IntParameter::MaxRenderbufferSize).max(1)
            as u32,
        max_vertex_attribs: driver.get_integer(IntParameter::MaxVertexAttribs).max(1) as u32,
        max_anisotropy: if anisotropic {
            driver.get_integer(IntParameter::MaxTextureAnisotropy).max(0) as u32
        } else {
            0
        },
        uint_indices: has("OES_element_index_uint"),
        instanced_arrays: has("ANGLE_instanced_arrays"),
        draw_buffers: has("WEBGL_draw_buffers"),
        standard_derivatives: has("OES_standard_derivatives"),
        texture_lod: has("EXT_shader_texture_lod"),
        texture_float: has("OES_texture_float"),
        texture_float_linear_filtering: has("OES_texture_float_linear"),
        texture_float_render: has("OES_texture_float"),
        texture_half_float: has("OES_texture_half_float"),
        texture_half_float_linear_filtering: has("OES_texture_half_float_linear"),
        texture_half_float_render: has("OES_texture_half_float"),
        high_precision_shader: true,
    };

    log::info!(
        "Lucent engine started on {} / {} ({})",
        info.vendor,
        info.renderer,
        info.version
    );

    Ok((caps, info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessConfig, HeadlessDriver};

    #[test]
    fn probe_full_featured_context() {
        let driver = HeadlessDriver::default();
        let (caps, info) = probe(&driver).unwrap();
        assert!(caps.uint_indices);
        assert!(caps.instanced_arrays);
        assert_eq!(caps.max_anisotropy, 16);
        assert_eq!(info.vendor, "Lucent");
    }

    #[test]
    fn probe_degrades_without_extensions() {
        let driver = HeadlessDriver::new(HeadlessConfig::minimal());
        let (caps, _) = probe(&driver).unwrap();
        assert!(!caps.uint_indices);
        assert!(!caps.instanced_arrays);
        assert!(!caps.texture_float);
        assert_eq!(caps.max_anisotropy, 0);
    }

    #[test]
    fn probe_rejects_contextless_driver() {
        let driver = HeadlessDriver::new(HeadlessConfig::broken());
        assert!(matches!(
            probe(&driver),
            Err(RenderError::InitializationFailed(_))
        ));
    }
}
