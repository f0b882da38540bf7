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

//! Pipeline state caches.
//!
//! Three independent state machines track desired vs. applied global
//! pipeline state. Setters only mutate the desired configuration and
//! mark fields dirty; `apply` reconciles with the driver by issuing one
//! call per changed field, and `reset` restores engine defaults while
//! marking every field dirty so the next `apply` re-issues everything
//! (the recovery path after external state corruption).

mod alpha;
mod depth_cull;
mod stencil;

pub use alpha::AlphaState;
pub use depth_cull::DepthCullingState;
pub use stencil::StencilState;

use lucent_core::driver::GlDriver;

/// The complete set of tracked pipeline state machines.
#[derive(Debug, Default)]
pub struct PipelineStates {
    pub depth_cull: DepthCullingState,
    pub stencil: StencilState,
    pub alpha: AlphaState,
}

impl PipelineStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flushes all three caches; called once before every draw or clear.
    pub fn apply_all(&mut self, driver: &dyn GlDriver) {
        self.depth_cull.apply(driver);
        self.stencil.apply(driver);
        self.alpha.apply(driver);
    }

    /// Forces every cache back to defaults and marks all fields dirty.
    pub fn reset_all(&mut self) {
        self.depth_cull.reset();
        self.stencil.reset();
        self.alpha.reset();
    }
}
