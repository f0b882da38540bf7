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

//! Frame-cycle behavior: render-loop callback ordering, unregistration
//! timing and the cumulative draw counter.

use lucent_core::api::pipeline::DrawMode;
use lucent_engine::headless::HeadlessDriver;
use lucent_engine::{Engine, EngineOptions};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

fn engine_with(options: EngineOptions) -> (Arc<HeadlessDriver>, Engine) {
    let driver = Arc::new(HeadlessDriver::default());
    let engine = Engine::new(driver.clone(), options).unwrap();
    (driver, engine)
}

#[test]
fn callbacks_run_in_registration_order() {
    let (_, mut engine) = engine_with(EngineOptions::default());
    let order = Rc::new(RefCell::new(Vec::new()));

    let sink = order.clone();
    engine.register_render_loop(move |_| sink.borrow_mut().push("shadow pass"));
    let sink = order.clone();
    engine.register_render_loop(move |_| sink.borrow_mut().push("main pass"));

    engine.render_frame();
    engine.render_frame();
    assert_eq!(
        *order.borrow(),
        vec!["shadow pass", "main pass", "shadow pass", "main pass"]
    );
}

#[test]
fn stopping_a_loop_takes_effect_next_cycle() {
    let (_, mut engine) = engine_with(EngineOptions::default());
    let runs = Rc::new(Cell::new(0u32));

    let counter = runs.clone();
    let id = engine.register_render_loop(move |_| counter.set(counter.get() + 1));

    engine.render_frame();
    engine.stop_render_loop(id);
    // Stop was requested mid-stream, so the callback does not run again.
    engine.render_frame();
    engine.render_frame();
    assert_eq!(runs.get(), 1);
}

#[test]
fn callbacks_registered_mid_cycle_start_next_cycle() {
    let (_, mut engine) = engine_with(EngineOptions::default());
    let order = Rc::new(RefCell::new(Vec::new()));
    let registered = Rc::new(Cell::new(false));

    let sink = order.clone();
    let once = registered.clone();
    engine.register_render_loop(move |engine| {
        sink.borrow_mut().push("first");
        if !once.get() {
            once.set(true);
            let late_sink = sink.clone();
            engine.register_render_loop(move |_| late_sink.borrow_mut().push("late"));
        }
    });

    engine.render_frame();
    assert_eq!(*order.borrow(), vec!["first"]);
    engine.render_frame();
    assert_eq!(*order.borrow(), vec!["first", "first", "late"]);
}

#[test]
fn draw_counter_accumulates_across_kinds() {
    let (driver, mut engine) = engine_with(EngineOptions::default());
    let indices = engine.buffers_mut().create_index_buffer(&[0, 1, 2]).unwrap();
    engine.buffers_mut().bind_index_buffer(indices).unwrap();

    for _ in 0..5 {
        engine.draw_indexed(DrawMode::Triangles, 0, 3, 0);
    }
    for _ in 0..3 {
        engine.draw_unindexed(DrawMode::Lines, 0, 2, 0);
    }
    assert_eq!(engine.draw_calls(), 8);
    assert_eq!(driver.call_count("draw_elements"), 5);
    assert_eq!(driver.call_count("draw_arrays"), 3);
}

#[test]
fn backgrounded_frames_are_skipped_unless_configured() {
    let (_, mut engine) = engine_with(EngineOptions {
        render_in_background: false,
        ..Default::default()
    });
    let runs = Rc::new(Cell::new(0u32));
    let counter = runs.clone();
    engine.register_render_loop(move |_| counter.set(counter.get() + 1));

    engine.set_window_background(true);
    engine.render_frame();
    assert_eq!(runs.get(), 0);

    engine.set_window_background(false);
    engine.render_frame();
    assert_eq!(runs.get(), 1);

    // The default keeps rendering while backgrounded.
    let (_, mut engine) = engine_with(EngineOptions::default());
    let counter = runs.clone();
    engine.register_render_loop(move |_| counter.set(counter.get() + 1));
    engine.set_window_background(true);
    engine.render_frame();
    assert_eq!(runs.get(), 2);
}

#[test]
fn frame_end_flushes_only_when_configured() {
    let (driver, mut engine) = engine_with(EngineOptions::default());
    engine.render_frame();
    assert_eq!(driver.call_count("flush"), 0);

    let (driver, mut engine) = engine_with(EngineOptions {
        flush_on_frame_end: true,
        ..Default::default()
    });
    engine.render_frame();
    engine.render_frame();
    assert_eq!(driver.call_count("flush"), 2);
}

#[test]
fn clearing_honors_the_stencil_option() {
    // Without a stencil plane on the main buffer the stencil flag of a
    // clear is dropped; the call still goes through.
    let (driver, mut engine) = engine_with(EngineOptions::default());
    engine.clear(Some([0.0, 0.0, 0.0, 1.0]), true, true);
    assert_eq!(driver.call_count("clear"), 1);
}
