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

//! Reference-counted GPU texture registry.
//!
//! Covers url-sourced, raw, dynamic and render-target textures plus per
//! texture sampler state. The manager never decodes image containers:
//! url textures are registered not-ready and completed later by the
//! asset layer through [`TextureManager::notify_image_loaded`].

use lucent_core::api::caps::Capabilities;
use lucent_core::api::texture::{
    Attachment, CubeMapFace, ImageData, PixelFormat, PixelType, RenderTargetOptions,
    RenderbufferFormat, SamplingMode, TexImageTarget, TextureId, TextureTarget, WrapAxis, WrapMode,
};
use lucent_core::driver::{FramebufferHandle, GlDriver, RenderbufferHandle, TextureHandle};
use lucent_core::error::TextureError;
use std::collections::HashMap;
use std::sync::Arc;

struct TextureRecord {
    handle: TextureHandle,
    target: TextureTarget,
    references: u32,
    width: u32,
    height: u32,
    /// Requested dimensions, before any power-of-two rounding.
    base_width: u32,
    base_height: u32,
    is_ready: bool,
    has_mipmaps: bool,
    sampling: SamplingMode,
    wrap_u: WrapMode,
    wrap_v: WrapMode,
    anisotropy: u32,
    framebuffer: Option<FramebufferHandle>,
    renderbuffer: Option<RenderbufferHandle>,
}

struct PendingLoad {
    invert_y: bool,
    no_mipmaps: bool,
    on_loaded: Vec<Box<dyn FnOnce() + Send>>,
    on_error: Option<Box<dyn FnOnce(&str) + Send>>,
}

/// Registry and sampler-state cache for all engine-managed textures.
pub struct TextureManager {
    driver: Arc<dyn GlDriver>,
    caps: Capabilities,
    textures: HashMap<TextureId, TextureRecord>,
    pending: HashMap<TextureId, PendingLoad>,
    next_id: u64,

    /// Per-unit binding memo; `None` entries are unbound or unknown.
    bound_units: Vec<Option<(TextureTarget, TextureHandle)>>,
    active_unit: Option<u32>,
}

fn unsupported_container(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.ends_with(".dds") || lower.ends_with(".tga")
}

fn pot_round_up(value: u32, max: u32) -> u32 {
    value.next_power_of_two().min(max)
}

impl TextureManager {
    pub fn new(driver: Arc<dyn GlDriver>, caps: &Capabilities) -> Self {
        Self {
            driver,
            caps: caps.clone(),
            textures: HashMap::new(),
            pending: HashMap::new(),
            next_id: 0,
            bound_units: vec![None; caps.max_texture_units as usize],
            active_unit: None,
        }
    }

    fn register(&mut self, record: TextureRecord) -> TextureId {
        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(id, record);
        id
    }

    /// Selects the active texture unit, eliding redundant switches.
    pub fn activate_texture(&mut self, unit: u32) {
        if self.active_unit != Some(unit) {
            self.driver.active_texture(unit);
            self.active_unit = Some(unit);
        }
    }

    fn bind_handle(&mut self, target: TextureTarget, handle: Option<TextureHandle>) {
        let unit = self.active_unit.unwrap_or(0) as usize;
        let entry = handle.map(|h| (target, h));
        if unit < self.bound_units.len() && self.bound_units[unit] == entry {
            return;
        }
        self.driver.bind_texture(target, handle);
        if unit < self.bound_units.len() {
            self.bound_units[unit] = entry;
        }
    }

    /// Binds a managed texture on the given unit, eliding redundant
    /// binds per unit. `None` unbinds the unit's 2D target.
    pub fn bind_texture(&mut self, unit: u32, id: Option<TextureId>) -> Result<(), TextureError> {
        let binding = match id {
            Some(id) => {
                let record = self.textures.get(&id).ok_or(TextureError::NotFound { id })?;
                Some((record.target, record.handle))
            }
            None => None,
        };
        self.activate_texture(unit);
        match binding {
            Some((target, handle)) => self.bind_handle(target, Some(handle)),
            None => self.bind_handle(TextureTarget::Texture2D, None),
        }
        Ok(())
    }

    /// Binds a texture on the active unit for parameter edits.
    fn bind_for_edit(&mut self, id: TextureId) -> Result<(TextureTarget, TextureHandle), TextureError> {
        let record = self.textures.get(&id).ok_or(TextureError::NotFound { id })?;
        let target = record.target;
        let handle = record.handle;
        self.bind_handle(target, Some(handle));
        Ok((target, handle))
    }

    /// Registers a url-sourced texture. Decoding happens in the asset
    /// layer; the texture stays not-ready until
    /// [`notify_image_loaded`](Self::notify_image_loaded) completes it.
    pub fn create_texture(
        &mut self,
        urls: &[&str],
        no_mipmaps: bool,
        invert_y: bool,
        sampling: SamplingMode,
        on_loaded: impl FnOnce() + Send + 'static,
        on_error: impl FnOnce(&str) + Send + 'static,
    ) -> Result<TextureId, TextureError> {
        let url = *urls.first().ok_or(TextureError::EmptySourceList)?;
        if unsupported_container(url) {
            return Err(TextureError::UnsupportedFormat {
                source: url.to_string(),
            });
        }

        let handle = self.driver.create_texture();
        let id = self.register(TextureRecord {
            handle,
            target: TextureTarget::Texture2D,
            references: 1,
            width: 0,
            height: 0,
            base_width: 0,
            base_height: 0,
            is_ready: false,
            has_mipmaps: !no_mipmaps,
            sampling,
            wrap_u: WrapMode::Wrap,
            wrap_v: WrapMode::Wrap,
            anisotropy: 0,
            framebuffer: None,
            renderbuffer: None,
        });
        self.pending.insert(
            id,
            PendingLoad {
                invert_y,
                no_mipmaps,
                on_loaded: vec![Box::new(on_loaded)],
                on_error: Some(Box::new(on_error)),
            },
        );
        Ok(id)
    }

    /// Cube maps from container files need a decoder this engine does
    /// not ship, so the request is refused explicitly.
    pub fn create_cube_texture_from_url(&mut self, url: &str) -> Result<TextureId, TextureError> {
        Err(TextureError::UnsupportedFormat {
            source: url.to_string(),
        })
    }

    /// Runs `callback` when the texture becomes ready, immediately if it
    /// already is.
    pub fn when_ready(
        &mut self,
        id: TextureId,
        callback: impl FnOnce() + Send + 'static,
    ) -> Result<(), TextureError> {
        let record = self.textures.get(&id).ok_or(TextureError::NotFound { id })?;
        if record.is_ready {
            callback();
        } else if let Some(pending) = self.pending.get_mut(&id) {
            pending.on_loaded.push(Box::new(callback));
        }
        Ok(())
    }

    /// Completes a pending url texture with decoded pixels, uploading
    /// them and firing every waiting callback.
    pub fn notify_image_loaded(
        &mut self,
        id: TextureId,
        image: &ImageData,
    ) -> Result<(), TextureError> {
        let pending = self.pending.remove(&id).ok_or(TextureError::NotFound { id })?;

        self.driver.set_unpack_flip_y(pending.invert_y);
        self.bind_for_edit(id)?;
        self.driver.tex_image_2d(
            TexImageTarget::D2,
            PixelFormat::Rgba,
            image.width,
            image.height,
            PixelType::UnsignedByte,
            Some(&image.pixels),
        );

        let record = self.textures.get_mut(&id).ok_or(TextureError::NotFound { id })?;
        record.width = image.width;
        record.height = image.height;
        record.base_width = image.width;
        record.base_height = image.height;
        record.is_ready = true;
        let sampling = record.sampling;
        let has_mipmaps = !pending.no_mipmaps;
        record.has_mipmaps = has_mipmaps;

        let (mag, min) = sampling.filters(has_mipmaps);
        self.driver
            .set_texture_filters(TextureTarget::Texture2D, mag, min);
        if has_mipmaps {
            self.driver.generate_mipmaps(TextureTarget::Texture2D);
        }

        for callback in pending.on_loaded {
            callback();
        }
        Ok(())
    }

    /// Fails a pending url texture, firing the caller's error callback.
    pub fn notify_load_failed(&mut self, id: TextureId, message: &str) -> Result<(), TextureError> {
        let pending = self.pending.remove(&id).ok_or(TextureError::NotFound { id })?;
        log::error!("Texture load failed: {message}");
        if let Some(on_error) = pending.on_error {
            on_error(message);
        }
        Ok(())
    }

    /// Creates a texture from raw pixel data already in memory.
    pub fn create_raw_texture(
        &mut self,
        data: Option<&[u8]>,
        width: u32,
        height: u32,
        format: PixelFormat,
        generate_mipmaps: bool,
        invert_y: bool,
        sampling: SamplingMode,
        compression: Option<&str>,
    ) -> Result<TextureId, TextureError> {
        if let Some(tag) = compression {
            return Err(TextureError::UnsupportedFormat {
                source: tag.to_string(),
            });
        }

        let handle = self.driver.create_texture();
        let id = self.register(TextureRecord {
            handle,
            target: TextureTarget::Texture2D,
            references: 1,
            width,
            height,
            base_width: width,
            base_height: height,
            is_ready: true,
            has_mipmaps: generate_mipmaps,
            sampling,
            wrap_u: WrapMode::Wrap,
            wrap_v: WrapMode::Wrap,
            anisotropy: 0,
            framebuffer: None,
            renderbuffer: None,
        });

        self.driver.set_unpack_flip_y(invert_y);
        // Rows that are not 4-byte multiples break the default unpack
        // alignment.
        if (width * format.channel_count()) % 4 != 0 {
            self.driver.set_unpack_alignment(1);
        } else {
            self.driver.set_unpack_alignment(4);
        }
        self.bind_for_edit(id)?;
        self.driver.tex_image_2d(
            TexImageTarget::D2,
            format,
            width,
            height,
            PixelType::UnsignedByte,
            data,
        );
        let (mag, min) = sampling.filters(generate_mipmaps);
        self.driver
            .set_texture_filters(TextureTarget::Texture2D, mag, min);
        if generate_mipmaps {
            self.driver.generate_mipmaps(TextureTarget::Texture2D);
        }
        Ok(id)
    }

    /// Creates an empty texture the caller will fill via
    /// [`update_dynamic_texture`](Self::update_dynamic_texture).
    ///
    /// Mipmapped dynamic textures get power-of-two storage, rounded up
    /// and clamped to the context's maximum size.
    pub fn create_dynamic_texture(
        &mut self,
        width: u32,
        height: u32,
        generate_mipmaps: bool,
        sampling: SamplingMode,
    ) -> TextureId {
        let (base_width, base_height) = (width, height);
        let (width, height) = if generate_mipmaps {
            (
                pot_round_up(width, self.caps.max_texture_size),
                pot_round_up(height, self.caps.max_texture_size),
            )
        } else {
            (width, height)
        };

        let handle = self.driver.create_texture();
        let id = self.register(TextureRecord {
            handle,
            target: TextureTarget::Texture2D,
            references: 1,
            width,
            height,
            base_width,
            base_height,
            is_ready: false,
            has_mipmaps: generate_mipmaps,
            sampling,
            wrap_u: WrapMode::Wrap,
            wrap_v: WrapMode::Wrap,
            anisotropy: 0,
            framebuffer: None,
            renderbuffer: None,
        });
        // bind_for_edit cannot fail for an id registered above.
        let _ = self.bind_for_edit(id);
        self.driver.tex_image_2d(
            TexImageTarget::D2,
            PixelFormat::Rgba,
            width,
            height,
            PixelType::UnsignedByte,
            None,
        );
        let (mag, min) = sampling.filters(generate_mipmaps);
        self.driver
            .set_texture_filters(TextureTarget::Texture2D, mag, min);
        id
    }

    /// Uploads new contents to a dynamic texture and marks it ready.
    pub fn update_dynamic_texture(
        &mut self,
        id: TextureId,
        data: &[u8],
        invert_y: bool,
    ) -> Result<(), TextureError> {
        self.driver.set_unpack_flip_y(invert_y);
        self.bind_for_edit(id)?;
        let record = self.textures.get_mut(&id).ok_or(TextureError::NotFound { id })?;
        let (width, height) = (record.width, record.height);
        let has_mipmaps = record.has_mipmaps;
        record.is_ready = true;
        self.driver.tex_image_2d(
            TexImageTarget::D2,
            PixelFormat::Rgba,
            width,
            height,
            PixelType::UnsignedByte,
            Some(data),
        );
        if has_mipmaps {
            self.driver.generate_mipmaps(TextureTarget::Texture2D);
        }
        Ok(())
    }

    /// Downgrades a render-target request to what the context can
    /// actually sample and render.
    fn resolve_render_target_options(
        &self,
        options: &RenderTargetOptions,
    ) -> (PixelType, SamplingMode) {
        let mut pixel_type = options.pixel_type;
        let mut sampling = options.sampling_mode;

        match pixel_type {
            PixelType::Float if !self.caps.texture_float_linear_filtering => {
                sampling = SamplingMode::Nearest;
            }
            PixelType::HalfFloat if !self.caps.texture_half_float_linear_filtering => {
                sampling = SamplingMode::Nearest;
            }
            _ => {}
        }
        let renderable = match pixel_type {
            PixelType::Float => self.caps.texture_float_render,
            PixelType::HalfFloat => self.caps.texture_half_float_render,
            PixelType::UnsignedByte => true,
        };
        if !renderable {
            log::warn!(
                "Render target requested {pixel_type:?} storage, which this context cannot render to; falling back to byte storage"
            );
            pixel_type = PixelType::UnsignedByte;
            sampling = options.sampling_mode;
        }
        (pixel_type, sampling)
    }

    fn attach_depth_storage(
        &mut self,
        options: &RenderTargetOptions,
        width: u32,
        height: u32,
    ) -> Option<RenderbufferHandle> {
        if !options.generate_depth_buffer && !options.generate_stencil_buffer {
            return None;
        }
        let renderbuffer = self.driver.create_renderbuffer();
        self.driver.bind_renderbuffer(Some(renderbuffer));
        if options.generate_stencil_buffer {
            self.driver
                .renderbuffer_storage(RenderbufferFormat::DepthStencil, width, height);
            self.driver
                .framebuffer_renderbuffer(Attachment::DepthStencil, renderbuffer);
        } else {
            self.driver
                .renderbuffer_storage(RenderbufferFormat::Depth16, width, height);
            self.driver
                .framebuffer_renderbuffer(Attachment::Depth, renderbuffer);
        }
        self.driver.bind_renderbuffer(None);
        Some(renderbuffer)
    }

    /// Creates a 2D texture that can be rendered into.
    pub fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
        options: &RenderTargetOptions,
    ) -> TextureId {
        let (pixel_type, sampling) = self.resolve_render_target_options(options);

        let handle = self.driver.create_texture();
        let id = self.register(TextureRecord {
            handle,
            target: TextureTarget::Texture2D,
            references: 1,
            width,
            height,
            base_width: width,
            base_height: height,
            is_ready: true,
            has_mipmaps: options.generate_mipmaps,
            sampling,
            wrap_u: WrapMode::Clamp,
            wrap_v: WrapMode::Clamp,
            anisotropy: 0,
            framebuffer: None,
            renderbuffer: None,
        });
        let _ = self.bind_for_edit(id);

        let (mag, min) = sampling.filters(options.generate_mipmaps);
        self.driver
            .set_texture_filters(TextureTarget::Texture2D, mag, min);
        self.driver
            .set_texture_wrap(TextureTarget::Texture2D, WrapAxis::U, WrapMode::Clamp);
        self.driver
            .set_texture_wrap(TextureTarget::Texture2D, WrapAxis::V, WrapMode::Clamp);
        self.driver.tex_image_2d(
            TexImageTarget::D2,
            PixelFormat::Rgba,
            width,
            height,
            pixel_type,
            None,
        );

        let framebuffer = self.driver.create_framebuffer();
        self.driver.bind_framebuffer(Some(framebuffer));
        self.driver
            .framebuffer_texture_2d(Attachment::Color0, TexImageTarget::D2, handle);
        let renderbuffer = self.attach_depth_storage(options, width, height);

        if options.generate_mipmaps {
            self.driver.generate_mipmaps(TextureTarget::Texture2D);
        }
        self.driver.bind_framebuffer(None);
        self.unbind_all_textures();

        if let Some(record) = self.textures.get_mut(&id) {
            record.framebuffer = Some(framebuffer);
            record.renderbuffer = renderbuffer;
        }
        id
    }

    /// Creates a cube map whose faces can be rendered into.
    pub fn create_render_target_cube(
        &mut self,
        size: u32,
        options: &RenderTargetOptions,
    ) -> TextureId {
        let (pixel_type, sampling) = self.resolve_render_target_options(options);

        let handle = self.driver.create_texture();
        let id = self.register(TextureRecord {
            handle,
            target: TextureTarget::CubeMap,
            references: 1,
            width: size,
            height: size,
            base_width: size,
            base_height: size,
            is_ready: true,
            has_mipmaps: options.generate_mipmaps,
            sampling,
            wrap_u: WrapMode::Clamp,
            wrap_v: WrapMode::Clamp,
            anisotropy: 0,
            framebuffer: None,
            renderbuffer: None,
        });
        let _ = self.bind_for_edit(id);

        let (mag, min) = sampling.filters(options.generate_mipmaps);
        self.driver
            .set_texture_filters(TextureTarget::CubeMap, mag, min);
        self.driver
            .set_texture_wrap(TextureTarget::CubeMap, WrapAxis::U, WrapMode::Clamp);
        self.driver
            .set_texture_wrap(TextureTarget::CubeMap, WrapAxis::V, WrapMode::Clamp);
        for face in CubeMapFace::all() {
            self.driver.tex_image_2d(
                TexImageTarget::CubeFace(face),
                PixelFormat::Rgba,
                size,
                size,
                pixel_type,
                None,
            );
        }

        let framebuffer = self.driver.create_framebuffer();
        self.driver.bind_framebuffer(Some(framebuffer));
        self.driver.framebuffer_texture_2d(
            Attachment::Color0,
            TexImageTarget::CubeFace(CubeMapFace::PositiveX),
            handle,
        );
        let renderbuffer = self.attach_depth_storage(options, size, size);

        if options.generate_mipmaps {
            self.driver.generate_mipmaps(TextureTarget::CubeMap);
        }
        self.driver.bind_framebuffer(None);
        self.unbind_all_textures();

        if let Some(record) = self.textures.get_mut(&id) {
            record.framebuffer = Some(framebuffer);
            record.renderbuffer = renderbuffer;
        }
        id
    }

    /// The framebuffer backing a render-target texture, if any.
    pub fn framebuffer_of(&self, id: TextureId) -> Option<FramebufferHandle> {
        self.textures.get(&id).and_then(|record| record.framebuffer)
    }

    /// The binding target the texture was created with.
    pub fn target_of(&self, id: TextureId) -> Option<TextureTarget> {
        self.textures.get(&id).map(|record| record.target)
    }

    /// Re-issues the texture's filter pair only when the mode changed.
    pub fn set_sampling_mode(
        &mut self,
        id: TextureId,
        sampling: SamplingMode,
    ) -> Result<(), TextureError> {
        let record = self.textures.get(&id).ok_or(TextureError::NotFound { id })?;
        if record.sampling == sampling {
            return Ok(());
        }
        let has_mipmaps = record.has_mipmaps;
        let (target, _) = self.bind_for_edit(id)?;
        let (mag, min) = sampling.filters(has_mipmaps);
        self.driver.set_texture_filters(target, mag, min);
        self.textures
            .get_mut(&id)
            .ok_or(TextureError::NotFound { id })?
            .sampling = sampling;
        Ok(())
    }

    /// Re-issues one axis's wrap mode only when it changed.
    pub fn set_wrap_mode(
        &mut self,
        id: TextureId,
        axis: WrapAxis,
        mode: WrapMode,
    ) -> Result<(), TextureError> {
        let record = self.textures.get(&id).ok_or(TextureError::NotFound { id })?;
        let current = match axis {
            WrapAxis::U => record.wrap_u,
            WrapAxis::V => record.wrap_v,
        };
        if current == mode {
            return Ok(());
        }
        let (target, _) = self.bind_for_edit(id)?;
        self.driver.set_texture_wrap(target, axis, mode);
        let record = self.textures.get_mut(&id).ok_or(TextureError::NotFound { id })?;
        match axis {
            WrapAxis::U => record.wrap_u = mode,
            WrapAxis::V => record.wrap_v = mode,
        }
        Ok(())
    }

    /// Applies anisotropic filtering, clamped to the context limit.
    /// Skipped when the extension is absent or the texture point
    /// samples.
    pub fn set_anisotropy(&mut self, id: TextureId, level: u32) -> Result<(), TextureError> {
        let record = self.textures.get(&id).ok_or(TextureError::NotFound { id })?;
        if self.caps.max_anisotropy == 0 || record.sampling == SamplingMode::Nearest {
            return Ok(());
        }
        let level = level.min(self.caps.max_anisotropy);
        if record.anisotropy == level {
            return Ok(());
        }
        let (target, _) = self.bind_for_edit(id)?;
        self.driver.set_texture_anisotropy(target, level);
        self.textures
            .get_mut(&id)
            .ok_or(TextureError::NotFound { id })?
            .anisotropy = level;
        Ok(())
    }

    /// Unbinds every unit that has a texture bound and clears the memo.
    pub fn unbind_all_textures(&mut self) {
        for unit in 0..self.bound_units.len() {
            if let Some((target, _)) = self.bound_units[unit] {
                self.activate_texture(unit as u32);
                self.driver.bind_texture(target, None);
                self.bound_units[unit] = None;
            }
        }
    }

    pub fn retain_texture(&mut self, id: TextureId) -> Result<(), TextureError> {
        let record = self
            .textures
            .get_mut(&id)
            .ok_or(TextureError::NotFound { id })?;
        record.references += 1;
        Ok(())
    }

    /// Drops one reference; at zero the framebuffer, renderbuffer and
    /// texture are destroyed in that order and every unit is unbound.
    pub fn release_texture(&mut self, id: TextureId) -> Result<bool, TextureError> {
        let record = self
            .textures
            .get_mut(&id)
            .ok_or(TextureError::NotFound { id })?;
        record.references -= 1;
        if record.references > 0 {
            return Ok(false);
        }
        let record = self
            .textures
            .remove(&id)
            .ok_or(TextureError::NotFound { id })?;
        self.pending.remove(&id);
        if let Some(framebuffer) = record.framebuffer {
            self.driver.bind_framebuffer(None);
            self.driver.delete_framebuffer(framebuffer);
        }
        if let Some(renderbuffer) = record.renderbuffer {
            self.driver.bind_renderbuffer(None);
            self.driver.delete_renderbuffer(renderbuffer);
        }
        self.driver.delete_texture(record.handle);
        self.unbind_all_textures();
        Ok(true)
    }

    pub fn references(&self, id: TextureId) -> Option<u32> {
        self.textures.get(&id).map(|record| record.references)
    }

    pub fn is_ready(&self, id: TextureId) -> Option<bool> {
        self.textures.get(&id).map(|record| record.is_ready)
    }

    pub fn has_mipmaps(&self, id: TextureId) -> Option<bool> {
        self.textures.get(&id).map(|record| record.has_mipmaps)
    }

    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures
            .get(&id)
            .map(|record| (record.width, record.height))
    }

    /// Dimensions as requested by the caller, before power-of-two
    /// rounding.
    pub fn texture_base_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures
            .get(&id)
            .map(|record| (record.base_width, record.base_height))
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Forgets all binding memos without touching the driver; used when
    /// external code may have corrupted the context state.
    pub fn reset_caches(&mut self) {
        for unit in &mut self.bound_units {
            *unit = None;
        }
        self.active_unit = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::probe;
    use crate::headless::{HeadlessConfig, HeadlessDriver};

    fn manager() -> (Arc<HeadlessDriver>, TextureManager) {
        let driver = Arc::new(HeadlessDriver::default());
        let (caps, _) = probe(driver.as_ref()).unwrap();
        let manager = TextureManager::new(driver.clone(), &caps);
        (driver, manager)
    }

    fn raw_texture(manager: &mut TextureManager) -> TextureId {
        manager
            .create_raw_texture(
                Some(&[0u8; 16]),
                2,
                2,
                PixelFormat::Rgba,
                false,
                false,
                SamplingMode::Trilinear,
                None,
            )
            .unwrap()
    }

    #[test]
    fn container_formats_are_rejected() {
        let (_, mut manager) = manager();
        let err = manager
            .create_texture(&["skin.DDS"], false, false, SamplingMode::Trilinear, || {}, |_| {})
            .unwrap_err();
        assert!(matches!(err, TextureError::UnsupportedFormat { .. }));
        assert!(matches!(
            manager.create_texture(&[], false, false, SamplingMode::Trilinear, || {}, |_| {}),
            Err(TextureError::EmptySourceList)
        ));
    }

    #[test]
    fn rebinding_the_bound_texture_is_elided() {
        let (driver, mut manager) = manager();
        let id = raw_texture(&mut manager);
        driver.reset_counts();

        manager.bind_texture(1, Some(id)).unwrap();
        manager.bind_texture(1, Some(id)).unwrap();
        assert_eq!(driver.call_count("bind_texture"), 1);
        assert_eq!(driver.call_count("active_texture"), 1);

        manager.bind_texture(2, Some(id)).unwrap();
        assert_eq!(driver.call_count("bind_texture"), 2);
    }

    #[test]
    fn release_deletes_exactly_once() {
        let (driver, mut manager) = manager();
        let id = raw_texture(&mut manager);
        manager.retain_texture(id).unwrap();

        assert!(!manager.release_texture(id).unwrap());
        assert_eq!(driver.call_count("delete_texture"), 0);
        assert!(manager.release_texture(id).unwrap());
        assert_eq!(driver.call_count("delete_texture"), 1);
        assert!(matches!(
            manager.release_texture(id),
            Err(TextureError::NotFound { .. })
        ));
    }

    #[test]
    fn mipmapped_dynamic_textures_round_to_powers_of_two() {
        let (_, mut manager) = manager();
        let id = manager.create_dynamic_texture(300, 200, true, SamplingMode::Trilinear);
        assert_eq!(manager.texture_size(id), Some((512, 256)));
        assert_eq!(manager.texture_base_size(id), Some((300, 200)));

        let exact = manager.create_dynamic_texture(300, 200, false, SamplingMode::Trilinear);
        assert_eq!(manager.texture_size(exact), Some((300, 200)));
    }

    #[test]
    fn pending_texture_completes_through_notify() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc as StdArc;

        let (_, mut manager) = manager();
        let loaded = StdArc::new(AtomicBool::new(false));
        let flag = loaded.clone();
        let id = manager
            .create_texture(
                &["albedo.png"],
                false,
                false,
                SamplingMode::Trilinear,
                move || flag.store(true, Ordering::SeqCst),
                |_| {},
            )
            .unwrap();
        assert_eq!(manager.is_ready(id), Some(false));

        let image = ImageData {
            width: 4,
            height: 4,
            pixels: vec![0; 64],
        };
        manager.notify_image_loaded(id, &image).unwrap();
        assert_eq!(manager.is_ready(id), Some(true));
        assert_eq!(manager.texture_size(id), Some((4, 4)));
        assert!(loaded.load(Ordering::SeqCst));
    }

    #[test]
    fn render_target_float_downgrades_without_support() {
        let driver = Arc::new(HeadlessDriver::new(HeadlessConfig::minimal()));
        let (caps, _) = probe(driver.as_ref()).unwrap();
        let mut manager = TextureManager::new(driver.clone(), &caps);

        let id = manager.create_render_target(
            128,
            128,
            &RenderTargetOptions {
                pixel_type: PixelType::Float,
                ..Default::default()
            },
        );
        assert!(manager.framebuffer_of(id).is_some());
        // Storage downgraded to bytes, so creation still succeeded with
        // a depth renderbuffer attached.
        assert_eq!(driver.call_count("renderbuffer_storage"), 1);
    }

    #[test]
    fn stencil_request_allocates_combined_depth_stencil_storage() {
        let (driver, mut manager) = manager();
        manager.create_render_target(
            32,
            32,
            &RenderTargetOptions {
                generate_depth_buffer: false,
                generate_stencil_buffer: true,
                ..Default::default()
            },
        );
        // A stencil plane always rides a packed depth+stencil
        // renderbuffer, never a depth-only one.
        assert_eq!(driver.call_count("renderbuffer_storage_depth_stencil"), 1);
        assert_eq!(driver.call_count("renderbuffer_storage"), 0);
    }

    #[test]
    fn anisotropy_is_skipped_without_the_extension() {
        let driver = Arc::new(HeadlessDriver::new(HeadlessConfig::minimal()));
        let (caps, _) = probe(driver.as_ref()).unwrap();
        let mut manager = TextureManager::new(driver.clone(), &caps);
        let id = raw_texture(&mut manager);

        manager.set_anisotropy(id, 8).unwrap();
        assert_eq!(driver.call_count("set_texture_anisotropy"), 0);
    }

    #[test]
    fn anisotropy_is_clamped_and_cached() {
        let (driver, mut manager) = manager();
        let id = raw_texture(&mut manager);
        driver.reset_counts();

        manager.set_anisotropy(id, 64).unwrap();
        manager.set_anisotropy(id, 16).unwrap();
        assert_eq!(driver.call_count("set_texture_anisotropy"), 1);
    }
}
