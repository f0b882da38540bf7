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

//! Alpha blending state cache.

use lucent_core::api::pipeline::{BlendFactor, Toggle};
use lucent_core::driver::GlDriver;

/// Tracked blend state.
///
/// The factor quadruple is `None` until a blend mode sets it, so a
/// freshly-reset cache never issues a `blend_func_separate` call for a
/// pipeline that keeps blending disabled.
#[derive(Debug)]
pub struct AlphaState {
    alpha_blend: bool,
    blend_dirty: bool,
    blend_function: Option<(BlendFactor, BlendFactor, BlendFactor, BlendFactor)>,
    function_dirty: bool,
}

impl Default for AlphaState {
    fn default() -> Self {
        Self {
            alpha_blend: false,
            blend_dirty: true,
            blend_function: None,
            function_dirty: false,
        }
    }
}

impl AlphaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alpha_blend(&self) -> bool {
        self.alpha_blend
    }

    pub fn set_alpha_blend(&mut self, enabled: bool) {
        if self.alpha_blend != enabled {
            self.alpha_blend = enabled;
            self.blend_dirty = true;
        }
    }

    pub fn blend_function(
        &self,
    ) -> Option<(BlendFactor, BlendFactor, BlendFactor, BlendFactor)> {
        self.blend_function
    }

    pub fn set_blend_function(
        &mut self,
        src: BlendFactor,
        dst: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        let next = Some((src, dst, src_alpha, dst_alpha));
        if self.blend_function != next {
            self.blend_function = next;
            self.function_dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.blend_dirty || self.function_dirty
    }

    /// Restores engine defaults and marks the enable flag dirty.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Issues one driver call per dirty field, then clears the flags.
    pub fn apply(&mut self, driver: &dyn GlDriver) {
        if !self.is_dirty() {
            return;
        }

        if self.blend_dirty {
            if self.alpha_blend {
                driver.enable(Toggle::Blend);
            } else {
                driver.disable(Toggle::Blend);
            }
            self.blend_dirty = false;
        }
        if self.function_dirty {
            if let Some((src, dst, src_alpha, dst_alpha)) = self.blend_function {
                driver.blend_func_separate(src, dst, src_alpha, dst_alpha);
            }
            self.function_dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessDriver;

    #[test]
    fn no_blend_func_call_until_a_function_is_set() {
        let driver = HeadlessDriver::default();
        let mut state = AlphaState::new();
        state.apply(&driver);
        assert_eq!(driver.call_count("blend_func_separate"), 0);

        state.set_blend_function(
            BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha,
            BlendFactor::One,
            BlendFactor::One,
        );
        state.apply(&driver);
        assert_eq!(driver.call_count("blend_func_separate"), 1);
    }

    #[test]
    fn repeated_function_is_elided() {
        let driver = HeadlessDriver::default();
        let mut state = AlphaState::new();
        state.set_blend_function(
            BlendFactor::One,
            BlendFactor::One,
            BlendFactor::Zero,
            BlendFactor::One,
        );
        state.apply(&driver);
        driver.reset_counts();

        state.set_blend_function(
            BlendFactor::One,
            BlendFactor::One,
            BlendFactor::Zero,
            BlendFactor::One,
        );
        state.apply(&driver);
        assert_eq!(driver.call_count("blend_func_separate"), 0);
    }
}
