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

//! Draw submission and the cumulative draw-call counter.

use crate::state::PipelineStates;
use lucent_core::api::caps::Capabilities;
use lucent_core::api::pipeline::{DrawMode, IndexKind};
use lucent_core::driver::GlDriver;
use std::sync::Arc;

/// Issues draws, flushing pending pipeline state first.
///
/// The counter only ever increments; per-frame figures come from the
/// caller snapshotting it at frame boundaries.
#[derive(Debug)]
pub struct DrawDispatcher {
    driver: Arc<dyn GlDriver>,
    instanced_arrays: bool,
    draw_calls: u64,
}

impl DrawDispatcher {
    pub fn new(driver: Arc<dyn GlDriver>, caps: &Capabilities) -> Self {
        Self {
            driver,
            instanced_arrays: caps.instanced_arrays,
            draw_calls: 0,
        }
    }

    /// Total draws issued over the dispatcher's lifetime.
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    fn instanced(&self, instances: i32) -> bool {
        if instances > 0 && !self.instanced_arrays {
            log::warn!("Instanced draw requested without instancing support; drawing one instance");
            return false;
        }
        instances > 0
    }

    /// Draws from the currently bound index buffer. `index_start` is in
    /// elements; the byte offset follows from the index width. `kind`
    /// must be the width the buffer manager tracked at bind time, so
    /// only [`Engine::draw_indexed`](crate::Engine::draw_indexed)
    /// reaches this.
    pub(crate) fn draw_indexed(
        &mut self,
        states: &mut PipelineStates,
        mode: DrawMode,
        kind: IndexKind,
        index_start: usize,
        index_count: i32,
        instances: i32,
    ) {
        states.apply_all(self.driver.as_ref());
        self.draw_calls += 1;
        let byte_offset = index_start * kind.byte_width();
        if self.instanced(instances) {
            self.driver
                .draw_elements_instanced(mode, index_count, kind, byte_offset, instances);
        } else {
            self.driver.draw_elements(mode, index_count, kind, byte_offset);
        }
    }

    /// Draws straight from the bound vertex streams.
    pub fn draw_unindexed(
        &mut self,
        states: &mut PipelineStates,
        mode: DrawMode,
        first: i32,
        count: i32,
        instances: i32,
    ) {
        states.apply_all(self.driver.as_ref());
        self.draw_calls += 1;
        if self.instanced(instances) {
            self.driver.draw_arrays_instanced(mode, first, count, instances);
        } else {
            self.driver.draw_arrays(mode, first, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::probe;
    use crate::headless::{HeadlessConfig, HeadlessDriver};

    #[test]
    fn states_are_flushed_before_each_draw() {
        let driver = Arc::new(HeadlessDriver::default());
        let (caps, _) = probe(driver.as_ref()).unwrap();
        let mut dispatcher = DrawDispatcher::new(driver.clone(), &caps);
        let mut states = PipelineStates::new();

        dispatcher.draw_indexed(&mut states, DrawMode::Triangles, IndexKind::U16, 0, 3, 0);
        assert_eq!(driver.call_count("depth_func"), 1);
        driver.reset_counts();

        states.depth_cull.set_depth_test(false);
        dispatcher.draw_unindexed(&mut states, DrawMode::Lines, 0, 2, 0);
        assert_eq!(driver.call_count("disable"), 1);
        assert_eq!(dispatcher.draw_calls(), 2);
    }

    #[test]
    fn instancing_falls_back_without_support() {
        let driver = Arc::new(HeadlessDriver::new(HeadlessConfig::minimal()));
        let (caps, _) = probe(driver.as_ref()).unwrap();
        let mut dispatcher = DrawDispatcher::new(driver.clone(), &caps);
        let mut states = PipelineStates::new();

        dispatcher.draw_indexed(&mut states, DrawMode::Triangles, IndexKind::U16, 0, 3, 8);
        assert_eq!(driver.call_count("draw_elements_instanced"), 0);
        assert_eq!(driver.call_count("draw_elements"), 1);
    }
}
