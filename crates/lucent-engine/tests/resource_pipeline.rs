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

//! End-to-end resource flow: geometry binding through an effect, the
//! per-set binding cache and full pipeline-state recovery.

use lucent_core::api::buffer::{BufferUsage, VertexAttribType};
use lucent_core::api::pipeline::DrawMode;
use lucent_engine::headless::HeadlessDriver;
use lucent_engine::{
    Engine, EngineOptions, EffectDescriptor, VertexAttributeBinding, VertexBufferSet,
};
use std::sync::Arc;

const LIT: EffectDescriptor<'static> = EffectDescriptor {
    vertex_name: "lit",
    fragment_name: "lit",
    vertex_source: "void main() {}",
    fragment_source: "void main() {}",
    defines: "#define DIFFUSE",
    attributes: &["position", "normal"],
    uniforms: &["worldViewProjection"],
    samplers: &["diffuseSampler"],
};

fn engine() -> (Arc<HeadlessDriver>, Engine) {
    let _ = env_logger::builder().is_test(true).try_init();
    let driver = Arc::new(HeadlessDriver::default());
    let engine = Engine::new(driver.clone(), EngineOptions::default()).unwrap();
    (driver, engine)
}

/// A mesh-shaped bundle: one interleaved vertex buffer feeding two
/// attributes plus an index buffer.
fn quad(engine: &mut Engine) -> (VertexBufferSet, lucent_core::api::buffer::BufferId) {
    let vertices = engine
        .buffers_mut()
        .create_vertex_buffer(&[0.0; 24], BufferUsage::Static);
    let indices = engine
        .buffers_mut()
        .create_index_buffer(&[0, 1, 2, 2, 1, 3])
        .unwrap();

    let mut set = VertexBufferSet::new();
    set.set(
        "position",
        VertexAttributeBinding {
            buffer: vertices,
            components: 3,
            kind: VertexAttribType::Float,
            normalized: false,
            stride: 24,
            offset: 0,
        },
    );
    set.set(
        "normal",
        VertexAttributeBinding {
            buffer: vertices,
            components: 3,
            kind: VertexAttribType::Float,
            normalized: false,
            stride: 24,
            offset: 12,
        },
    );
    (set, indices)
}

#[test]
fn repeated_bind_buffers_skips_attribute_setup() {
    let (driver, mut engine) = engine();
    let effect = engine.effects_mut().create_effect(&LIT).unwrap();
    let (set, indices) = quad(&mut engine);

    engine.bind_buffers(&set, Some(indices), &effect).unwrap();
    let pointers = driver.call_count("vertex_attrib_pointer");
    let binds = driver.call_count("bind_buffer");
    assert_eq!(pointers, 2);

    engine.bind_buffers(&set, Some(indices), &effect).unwrap();
    engine.bind_buffers(&set, Some(indices), &effect).unwrap();
    assert_eq!(driver.call_count("vertex_attrib_pointer"), pointers);
    assert_eq!(driver.call_count("bind_buffer"), binds);
}

#[test]
fn switching_sets_rebinds_then_caches_again() {
    let (driver, mut engine) = engine();
    let effect = engine.effects_mut().create_effect(&LIT).unwrap();
    let (first, indices) = quad(&mut engine);
    let (second, _) = quad(&mut engine);

    engine.bind_buffers(&first, Some(indices), &effect).unwrap();
    let after_first = driver.call_count("vertex_attrib_pointer");

    engine.bind_buffers(&second, Some(indices), &effect).unwrap();
    assert_eq!(driver.call_count("vertex_attrib_pointer"), after_first + 2);

    engine.bind_buffers(&second, Some(indices), &effect).unwrap();
    assert_eq!(driver.call_count("vertex_attrib_pointer"), after_first + 2);
}

#[test]
fn full_draw_flow_issues_one_draw() {
    let (driver, mut engine) = engine();
    let effect = engine.effects_mut().create_effect(&LIT).unwrap();
    let (set, indices) = quad(&mut engine);

    engine.enable_effect(&effect, |_| {});
    engine.bind_buffers(&set, Some(indices), &effect).unwrap();
    engine.set_matrix(effect.uniform("worldViewProjection"), &[0.0; 16]);
    engine.draw_indexed(DrawMode::Triangles, 0, 6, 0);

    assert_eq!(driver.call_count("draw_elements"), 1);
    assert_eq!(driver.call_count("set_uniform_matrix4"), 1);
    assert_eq!(engine.draw_calls(), 1);
}

#[test]
fn discarded_uniforms_are_ignored_by_setters() {
    let (driver, mut engine) = engine();
    let effect = engine.effects_mut().create_effect(&LIT).unwrap();

    engine.set_matrix(effect.uniform("unrequestedUniform"), &[0.0; 16]);
    engine.set_float(effect.uniform("unrequestedUniform"), 1.0);
    assert_eq!(driver.call_count("set_uniform_matrix4"), 0);
    assert_eq!(driver.call_count("set_uniform_float"), 0);
}

#[test]
fn state_recovery_reissues_every_field_exactly_once() {
    let (driver, mut engine) = engine();
    // Settle all pipeline state, then corrupt-and-recover.
    engine.clear(None, true, false);
    engine.wipe_caches();
    driver.reset_counts();

    engine.clear(None, true, false);
    // depth test + culling enables, stencil + blend disables.
    assert_eq!(driver.call_count("enable") + driver.call_count("disable"), 4);
    assert_eq!(driver.call_count("depth_func"), 1);
    assert_eq!(driver.call_count("depth_mask"), 1);
    assert_eq!(driver.call_count("cull_face"), 1);
    assert_eq!(driver.call_count("stencil_mask"), 1);
    assert_eq!(driver.call_count("stencil_func"), 1);
    assert_eq!(driver.call_count("stencil_op"), 1);
    assert_eq!(driver.call_count("blend_func_separate"), 0);

    driver.reset_counts();
    engine.clear(None, true, false);
    assert_eq!(driver.call_count("depth_func"), 0);
    assert_eq!(driver.call_count("stencil_func"), 0);
}

#[test]
fn recycled_buffer_handles_do_not_hit_stale_pointer_memos() {
    let (driver, mut engine) = engine();
    let effect = engine.effects_mut().create_effect(&LIT).unwrap();
    let (set, indices) = quad(&mut engine);
    let position = set.get("position").unwrap().buffer;

    engine.bind_buffers(&set, Some(indices), &effect).unwrap();
    assert_eq!(driver.call_count("vertex_attrib_pointer"), 2);

    // Releasing the vertex buffer frees its driver name; the headless
    // driver hands that name to the next buffer, as GL does. The new
    // buffer's identical layout must still be issued.
    engine.buffers_mut().release_buffer(position).unwrap();
    let (replacement, _) = quad(&mut engine);
    engine
        .bind_buffers(&replacement, Some(indices), &effect)
        .unwrap();
    assert_eq!(driver.call_count("vertex_attrib_pointer"), 4);
}

#[test]
fn released_geometry_leaves_no_live_buffers() {
    let (driver, mut engine) = engine();
    let (set, indices) = quad(&mut engine);
    let position = set.get("position").unwrap().buffer;

    // The interleaved vertex buffer feeds two attributes but is one
    // resource with one reference.
    assert_eq!(engine.buffers().references(position), Some(1));
    assert!(engine.buffers_mut().release_buffer(position).unwrap());
    assert!(engine.buffers_mut().release_buffer(indices).unwrap());
    assert_eq!(engine.buffers().buffer_count(), 0);
    assert_eq!(driver.live_buffer_count(), 0);
}
