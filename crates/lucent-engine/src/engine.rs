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

//! The engine façade.
//!
//! One [`Engine`] owns one driver, one capability record and all the
//! resource managers; nothing is global, so two engines on different
//! contexts never share state. Scene-level code talks to the engine,
//! the engine talks to the driver.

use crate::buffers::{BufferManager, VertexBufferSet};
use crate::caps::probe;
use crate::draw::DrawDispatcher;
use crate::effects::{CompiledEffect, EffectCache};
use crate::frame_clock::FrameClock;
use crate::state::PipelineStates;
use crate::textures::TextureManager;
use lucent_core::api::buffer::BufferId;
use lucent_core::api::caps::{Capabilities, DriverInfo};
use lucent_core::api::pipeline::{AlphaMode, DrawMode, IndexKind};
use lucent_core::api::texture::TextureId;
use lucent_core::driver::{GlDriver, UniformHandle};
use lucent_core::error::{BufferError, RenderError, TextureError};
use std::sync::Arc;

/// Engine-level configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Reserve a stencil plane on the main framebuffer.
    pub stencil: bool,
    /// Flush the driver at every frame end; a workaround for drivers
    /// that queue work across frames.
    pub flush_on_frame_end: bool,
    /// Number of frame samples the FPS window holds.
    pub fps_window: usize,
    /// Keep running render callbacks while unfocused.
    pub render_in_background: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            stencil: false,
            flush_on_frame_end: false,
            fps_window: 60,
            render_in_background: true,
        }
    }
}

/// The UI shown while a scene's resources are still loading.
///
/// The engine never renders UI itself; it only drives a delegate the
/// application installs.
pub trait LoadingScreen: Send {
    fn show(&mut self);
    fn hide(&mut self);
    fn set_text(&mut self, text: &str);
    fn set_background_color(&mut self, color: [f32; 4]);
}

/// Identifies a registered render-loop callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderLoopId(u64);

type RenderCallback = Box<dyn FnMut(&mut Engine)>;
type ResizeObserver = Box<dyn FnMut(u32, u32)>;

/// The hardware abstraction layer over one graphics context.
pub struct Engine {
    driver: Arc<dyn GlDriver>,
    options: EngineOptions,
    caps: Capabilities,
    info: DriverInfo,

    states: PipelineStates,
    buffers: BufferManager,
    textures: TextureManager,
    effects: EffectCache,
    dispatcher: DrawDispatcher,
    clock: FrameClock,

    render_callbacks: Vec<(RenderLoopId, RenderCallback)>,
    stopped_loops: Vec<RenderLoopId>,
    next_loop_id: u64,
    resize_observers: Vec<ResizeObserver>,
    loading_screen: Option<Box<dyn LoadingScreen>>,

    window_background: bool,
    render_width: u32,
    render_height: u32,
    cached_viewport: Option<(i32, i32, i32, i32)>,
    alpha_mode: AlphaMode,
    color_write: bool,
}

impl Engine {
    /// Probes the context and builds all managers. Fails only when the
    /// context is unusable.
    pub fn new(driver: Arc<dyn GlDriver>, options: EngineOptions) -> Result<Self, RenderError> {
        let (caps, info) = probe(driver.as_ref())?;
        let buffers = BufferManager::new(driver.clone(), &caps);
        let textures = TextureManager::new(driver.clone(), &caps);
        let effects = EffectCache::new(driver.clone());
        let dispatcher = DrawDispatcher::new(driver.clone(), &caps);
        let clock = FrameClock::new(options.fps_window);
        Ok(Self {
            driver,
            options,
            caps,
            info,
            states: PipelineStates::new(),
            buffers,
            textures,
            effects,
            dispatcher,
            clock,
            render_callbacks: Vec::new(),
            stopped_loops: Vec::new(),
            next_loop_id: 0,
            resize_observers: Vec::new(),
            loading_screen: None,
            window_background: false,
            render_width: 0,
            render_height: 0,
            cached_viewport: None,
            alpha_mode: AlphaMode::Disable,
            color_write: true,
        })
    }

    // --- Diagnostics ---

    pub fn caps(&self) -> &Capabilities {
        &self.caps
    }

    pub fn driver_info(&self) -> &DriverInfo {
        &self.info
    }

    pub fn fps(&self) -> f64 {
        self.clock.fps()
    }

    /// Milliseconds between the two most recent frames.
    pub fn delta_time(&self) -> f64 {
        self.clock.delta_time()
    }

    /// Cumulative draw count since engine creation.
    pub fn draw_calls(&self) -> u64 {
        self.dispatcher.draw_calls()
    }

    // --- Managers ---

    pub fn buffers(&self) -> &BufferManager {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut BufferManager {
        &mut self.buffers
    }

    pub fn textures(&self) -> &TextureManager {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureManager {
        &mut self.textures
    }

    pub fn effects_mut(&mut self) -> &mut EffectCache {
        &mut self.effects
    }

    pub fn states_mut(&mut self) -> &mut PipelineStates {
        &mut self.states
    }

    // --- Render loop ---

    /// Registers a per-frame callback; it first runs on the next cycle.
    pub fn register_render_loop(
        &mut self,
        callback: impl FnMut(&mut Engine) + 'static,
    ) -> RenderLoopId {
        self.next_loop_id += 1;
        let id = RenderLoopId(self.next_loop_id);
        self.render_callbacks.push((id, Box::new(callback)));
        id
    }

    /// Unregisters a callback; takes effect at the next cycle boundary.
    pub fn stop_render_loop(&mut self, id: RenderLoopId) {
        self.stopped_loops.push(id);
    }

    /// Tells the engine whether the host window has lost focus. While
    /// backgrounded, frame cycles are skipped unless
    /// [`EngineOptions::render_in_background`] is set.
    pub fn set_window_background(&mut self, background: bool) {
        self.window_background = background;
    }

    /// Marks a frame boundary and samples the clock.
    pub fn begin_frame(&mut self) {
        self.clock.tick();
    }

    /// Ends the frame, flushing the driver when configured to.
    pub fn end_frame(&mut self) {
        if self.options.flush_on_frame_end {
            self.driver.flush();
        }
    }

    /// Runs one full frame cycle: begin, every registered callback in
    /// registration order, end. Skipped entirely while the window is
    /// backgrounded, unless configured otherwise.
    pub fn render_frame(&mut self) {
        if self.window_background && !self.options.render_in_background {
            return;
        }
        if !self.stopped_loops.is_empty() {
            let stopped = std::mem::take(&mut self.stopped_loops);
            self.render_callbacks.retain(|(id, _)| !stopped.contains(id));
        }

        self.begin_frame();
        // Callbacks receive `&mut Engine`, so the list is moved out for
        // the duration of the cycle; registrations made by a callback
        // land in the (now empty) field and are appended afterwards.
        let mut callbacks = std::mem::take(&mut self.render_callbacks);
        for (_, callback) in &mut callbacks {
            callback(self);
        }
        let added = std::mem::take(&mut self.render_callbacks);
        self.render_callbacks = callbacks;
        self.render_callbacks.extend(added);
        self.end_frame();
    }

    // --- Framebuffer operations ---

    /// Clears the bound framebuffer. Pipeline state is flushed first so
    /// a pending depth-write change applies to this clear.
    pub fn clear(&mut self, color: Option<[f32; 4]>, depth: bool, stencil: bool) {
        self.states.apply_all(self.driver.as_ref());
        self.driver
            .clear(color, depth, stencil && self.options.stencil);
    }

    /// Sets the backbuffer size and notifies resize observers.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.render_width == width && self.render_height == height {
            return;
        }
        self.render_width = width;
        self.render_height = height;
        self.cached_viewport = None;
        for observer in &mut self.resize_observers {
            observer(width, height);
        }
    }

    pub fn render_size(&self) -> (u32, u32) {
        (self.render_width, self.render_height)
    }

    /// Registers an observer called whenever the render size changes.
    pub fn on_resize(&mut self, observer: impl FnMut(u32, u32) + 'static) {
        self.resize_observers.push(Box::new(observer));
    }

    /// Applies a viewport given in normalized coordinates, scaled by
    /// the current render size. Redundant viewports are elided.
    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let pixels = (
            (x * self.render_width as f32) as i32,
            (y * self.render_height as f32) as i32,
            (width * self.render_width as f32) as i32,
            (height * self.render_height as f32) as i32,
        );
        if self.cached_viewport == Some(pixels) {
            return;
        }
        self.cached_viewport = Some(pixels);
        self.driver.viewport(pixels.0, pixels.1, pixels.2, pixels.3);
    }

    /// Applies a viewport in raw pixels, bypassing the cache.
    pub fn set_direct_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.cached_viewport = None;
        self.driver.viewport(x, y, width, height);
    }

    /// Redirects rendering into a render-target texture.
    pub fn bind_framebuffer(&mut self, id: TextureId) -> Result<(), TextureError> {
        let framebuffer = self
            .textures
            .framebuffer_of(id)
            .ok_or(TextureError::NotFound { id })?;
        let (width, height) = self
            .textures
            .texture_size(id)
            .ok_or(TextureError::NotFound { id })?;
        self.driver.bind_framebuffer(Some(framebuffer));
        self.cached_viewport = None;
        self.driver.viewport(0, 0, width as i32, height as i32);
        Ok(())
    }

    /// Returns rendering to the main framebuffer, regenerating the
    /// target's mipmap chain unless suppressed.
    pub fn unbind_framebuffer(
        &mut self,
        id: TextureId,
        disable_mipmap_generation: bool,
    ) -> Result<(), TextureError> {
        self.driver.bind_framebuffer(None);
        let has_mipmaps = self
            .textures
            .has_mipmaps(id)
            .ok_or(TextureError::NotFound { id })?;
        if has_mipmaps && !disable_mipmap_generation {
            let target = self
                .textures
                .target_of(id)
                .ok_or(TextureError::NotFound { id })?;
            self.textures.bind_texture(0, Some(id))?;
            self.driver.generate_mipmaps(target);
            self.textures.bind_texture(0, None)?;
        }
        self.cached_viewport = None;
        Ok(())
    }

    // --- Pipeline state surface ---

    /// Switches the blend mode per the fixed mode table. Unchanged
    /// modes are ignored. Depth writes follow the mode (off while
    /// blending) unless `no_depth_write_change`.
    pub fn set_alpha_mode(&mut self, mode: AlphaMode, no_depth_write_change: bool) {
        if self.alpha_mode == mode {
            return;
        }
        match mode.blend_function() {
            Some((src, dst, src_alpha, dst_alpha)) => {
                self.states.alpha.set_blend_function(src, dst, src_alpha, dst_alpha);
                self.states.alpha.set_alpha_blend(true);
            }
            None => {
                self.states.alpha.set_alpha_blend(false);
            }
        }
        if !no_depth_write_change {
            self.states
                .depth_cull
                .set_depth_mask(mode == AlphaMode::Disable);
        }
        self.alpha_mode = mode;
    }

    pub fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    /// Toggles color-plane writes, elided when unchanged.
    pub fn set_color_write(&mut self, enable: bool) {
        if self.color_write != enable {
            self.color_write = enable;
            self.driver.color_mask(enable, enable, enable, enable);
        }
    }

    // --- Geometry and effects ---

    /// Binds an effect's vertex streams and index buffer.
    pub fn bind_buffers(
        &mut self,
        set: &VertexBufferSet,
        index_buffer: Option<BufferId>,
        effect: &CompiledEffect,
    ) -> Result<(), BufferError> {
        self.buffers.bind_buffers(set, index_buffer, effect)
    }

    /// Makes an effect current and runs the caller's bind hook.
    pub fn enable_effect(
        &mut self,
        effect: &Arc<CompiledEffect>,
        on_bind: impl FnOnce(&CompiledEffect),
    ) {
        self.effects.enable_effect(effect, on_bind);
    }

    // --- Uniform passthroughs ---
    //
    // `None` locations come from uniforms the linker discarded; the
    // setters ignore them so material code stays branch-free.

    pub fn set_int(&self, uniform: Option<UniformHandle>, value: i32) {
        if let Some(uniform) = uniform {
            self.driver.set_uniform_int(uniform, value);
        }
    }

    pub fn set_float(&self, uniform: Option<UniformHandle>, value: f32) {
        if let Some(uniform) = uniform {
            self.driver.set_uniform_float(uniform, value);
        }
    }

    pub fn set_float4(&self, uniform: Option<UniformHandle>, value: [f32; 4]) {
        if let Some(uniform) = uniform {
            self.driver.set_uniform_float4(uniform, value);
        }
    }

    pub fn set_matrix(&self, uniform: Option<UniformHandle>, value: &[f32; 16]) {
        if let Some(uniform) = uniform {
            self.driver.set_uniform_matrix4(uniform, value);
        }
    }

    // --- Draws ---

    /// Draws from the bound index buffer; element width follows the
    /// buffer manager's tracked binding.
    pub fn draw_indexed(
        &mut self,
        mode: DrawMode,
        index_start: usize,
        index_count: i32,
        instances: i32,
    ) {
        let kind = self.buffers.current_index_kind().unwrap_or(IndexKind::U16);
        self.dispatcher.draw_indexed(
            &mut self.states,
            mode,
            kind,
            index_start,
            index_count,
            instances,
        );
    }

    /// Draws straight from the bound vertex streams.
    pub fn draw_unindexed(&mut self, mode: DrawMode, first: i32, count: i32, instances: i32) {
        self.dispatcher
            .draw_unindexed(&mut self.states, mode, first, count, instances);
    }

    // --- Recovery ---

    /// Forgets every binding memo and forces all pipeline state to be
    /// re-issued; the recovery path after foreign code touched the
    /// context.
    pub fn wipe_caches(&mut self) {
        self.buffers.reset_caches();
        self.textures.reset_caches();
        self.effects.reset_binding();
        self.states.reset_all();
    }

    // --- Loading screen ---

    pub fn set_loading_screen(&mut self, screen: Box<dyn LoadingScreen>) {
        self.loading_screen = Some(screen);
    }

    pub fn display_loading_ui(&mut self) {
        if let Some(screen) = &mut self.loading_screen {
            screen.show();
        }
    }

    pub fn hide_loading_ui(&mut self) {
        if let Some(screen) = &mut self.loading_screen {
            screen.hide();
        }
    }

    pub fn set_loading_ui_text(&mut self, text: &str) {
        if let Some(screen) = &mut self.loading_screen {
            screen.set_text(text);
        }
    }

    pub fn set_loading_ui_background_color(&mut self, color: [f32; 4]) {
        if let Some(screen) = &mut self.loading_screen {
            screen.set_background_color(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessConfig, HeadlessDriver};

    fn engine() -> (Arc<HeadlessDriver>, Engine) {
        let driver = Arc::new(HeadlessDriver::default());
        let engine = Engine::new(driver.clone(), EngineOptions::default()).unwrap();
        (driver, engine)
    }

    #[test]
    fn construction_fails_on_unusable_context() {
        let driver = Arc::new(HeadlessDriver::new(HeadlessConfig::broken()));
        assert!(matches!(
            Engine::new(driver, EngineOptions::default()),
            Err(RenderError::InitializationFailed(_))
        ));
    }

    #[test]
    fn alpha_mode_change_is_elided_and_couples_depth_write() {
        let (driver, mut engine) = engine();
        engine.clear(None, true, false);
        driver.reset_counts();

        engine.set_alpha_mode(AlphaMode::Combine, false);
        engine.set_alpha_mode(AlphaMode::Combine, false);
        engine.clear(None, true, false);
        assert_eq!(driver.call_count("blend_func_separate"), 1);
        // Depth writes turned off along with the blend enable.
        assert_eq!(driver.call_count("depth_mask"), 1);
        assert!(!engine.states_mut().depth_cull.depth_mask());

        engine.set_alpha_mode(AlphaMode::Disable, false);
        engine.clear(None, true, false);
        assert!(engine.states_mut().depth_cull.depth_mask());
    }

    #[test]
    fn viewport_is_scaled_and_elided() {
        let (driver, mut engine) = engine();
        engine.set_size(800, 600);
        engine.set_viewport(0.0, 0.0, 1.0, 0.5);
        engine.set_viewport(0.0, 0.0, 1.0, 0.5);
        assert_eq!(driver.call_count("viewport"), 1);

        engine.set_size(400, 300);
        engine.set_viewport(0.0, 0.0, 1.0, 0.5);
        assert_eq!(driver.call_count("viewport"), 2);
    }

    #[test]
    fn resize_notifies_observers_once_per_change() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let (_, mut engine) = engine();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        engine.on_resize(move |w, h| sink.borrow_mut().push((w, h)));

        engine.set_size(640, 480);
        engine.set_size(640, 480);
        engine.set_size(1280, 720);
        assert_eq!(*seen.borrow(), vec![(640, 480), (1280, 720)]);
    }

    #[test]
    fn color_write_toggle_is_cached() {
        let (driver, mut engine) = engine();
        engine.set_color_write(true);
        assert_eq!(driver.call_count("color_mask"), 0);
        engine.set_color_write(false);
        engine.set_color_write(false);
        assert_eq!(driver.call_count("color_mask"), 1);
    }

    #[test]
    fn cube_target_unbind_regenerates_the_cube_mipmap_chain() {
        use lucent_core::api::texture::RenderTargetOptions;

        let (driver, mut engine) = engine();
        let cube = engine.textures_mut().create_render_target_cube(
            64,
            &RenderTargetOptions {
                generate_mipmaps: true,
                ..Default::default()
            },
        );
        driver.reset_counts();

        engine.bind_framebuffer(cube).unwrap();
        engine.unbind_framebuffer(cube, false).unwrap();
        assert_eq!(driver.call_count("generate_mipmaps_cube"), 1);
        assert_eq!(driver.call_count("generate_mipmaps"), 0);

        engine.bind_framebuffer(cube).unwrap();
        engine.unbind_framebuffer(cube, true).unwrap();
        assert_eq!(driver.call_count("generate_mipmaps_cube"), 1);
    }

    #[test]
    fn wipe_caches_forces_state_reissue() {
        let (driver, mut engine) = engine();
        engine.clear(None, true, false);
        driver.reset_counts();

        engine.clear(None, true, false);
        assert_eq!(driver.call_count("depth_func"), 0);

        engine.wipe_caches();
        engine.clear(None, true, false);
        assert_eq!(driver.call_count("depth_func"), 1);
    }
}
