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

//! Depth-test and face-culling state cache.

use lucent_core::api::pipeline::{CompareFunction, CullFaceMode, Toggle};
use lucent_core::driver::GlDriver;

/// Tracked depth/cull state with per-field dirty flags.
#[derive(Debug)]
pub struct DepthCullingState {
    depth_test: bool,
    depth_test_dirty: bool,
    depth_mask: bool,
    depth_mask_dirty: bool,
    depth_func: CompareFunction,
    depth_func_dirty: bool,
    cull_enabled: bool,
    cull_enabled_dirty: bool,
    cull_face: CullFaceMode,
    cull_face_dirty: bool,
}

impl Default for DepthCullingState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_test_dirty: true,
            depth_mask: true,
            depth_mask_dirty: true,
            depth_func: CompareFunction::LessEqual,
            depth_func_dirty: true,
            cull_enabled: true,
            cull_enabled_dirty: true,
            cull_face: CullFaceMode::Back,
            cull_face_dirty: true,
        }
    }
}

impl DepthCullingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        if self.depth_test != enabled {
            self.depth_test = enabled;
            self.depth_test_dirty = true;
        }
    }

    pub fn depth_mask(&self) -> bool {
        self.depth_mask
    }

    pub fn set_depth_mask(&mut self, write: bool) {
        if self.depth_mask != write {
            self.depth_mask = write;
            self.depth_mask_dirty = true;
        }
    }

    pub fn depth_func(&self) -> CompareFunction {
        self.depth_func
    }

    pub fn set_depth_func(&mut self, func: CompareFunction) {
        if self.depth_func != func {
            self.depth_func = func;
            self.depth_func_dirty = true;
        }
    }

    pub fn cull_enabled(&self) -> bool {
        self.cull_enabled
    }

    pub fn set_cull_enabled(&mut self, enabled: bool) {
        if self.cull_enabled != enabled {
            self.cull_enabled = enabled;
            self.cull_enabled_dirty = true;
        }
    }

    pub fn cull_face(&self) -> CullFaceMode {
        self.cull_face
    }

    pub fn set_cull_face(&mut self, mode: CullFaceMode) {
        if self.cull_face != mode {
            self.cull_face = mode;
            self.cull_face_dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.depth_test_dirty
            || self.depth_mask_dirty
            || self.depth_func_dirty
            || self.cull_enabled_dirty
            || self.cull_face_dirty
    }

    fn mark_all_dirty(&mut self) {
        self.depth_test_dirty = true;
        self.depth_mask_dirty = true;
        self.depth_func_dirty = true;
        self.cull_enabled_dirty = true;
        self.cull_face_dirty = true;
    }

    /// Restores engine defaults and marks every field dirty.
    pub fn reset(&mut self) {
        self.depth_test = true;
        self.depth_mask = true;
        self.depth_func = CompareFunction::LessEqual;
        self.cull_enabled = true;
        self.cull_face = CullFaceMode::Back;
        self.mark_all_dirty();
    }

    /// Issues one driver call per dirty field, then clears the flags.
    pub fn apply(&mut self, driver: &dyn GlDriver) {
        if !self.is_dirty() {
            return;
        }

        if self.cull_enabled_dirty {
            if self.cull_enabled {
                driver.enable(Toggle::CullFace);
            } else {
                driver.disable(Toggle::CullFace);
            }
            self.cull_enabled_dirty = false;
        }
        if self.cull_face_dirty {
            driver.cull_face(self.cull_face);
            self.cull_face_dirty = false;
        }
        if self.depth_test_dirty {
            if self.depth_test {
                driver.enable(Toggle::DepthTest);
            } else {
                driver.disable(Toggle::DepthTest);
            }
            self.depth_test_dirty = false;
        }
        if self.depth_mask_dirty {
            driver.depth_mask(self.depth_mask);
            self.depth_mask_dirty = false;
        }
        if self.depth_func_dirty {
            driver.depth_func(self.depth_func);
            self.depth_func_dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessDriver;

    #[test]
    fn apply_is_idempotent_without_changes() {
        let driver = HeadlessDriver::default();
        let mut state = DepthCullingState::new();
        state.apply(&driver);
        let first = driver.calls().len();
        state.apply(&driver);
        assert_eq!(driver.calls().len(), first, "clean apply must be a no-op");
    }

    #[test]
    fn setter_marks_only_changed_field() {
        let driver = HeadlessDriver::default();
        let mut state = DepthCullingState::new();
        state.apply(&driver);
        driver.reset_counts();

        state.set_depth_func(CompareFunction::Greater);
        state.set_depth_func(CompareFunction::Greater);
        state.apply(&driver);
        assert_eq!(driver.call_count("depth_func"), 1);
        assert_eq!(driver.call_count("depth_mask"), 0);
    }
}
