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

//! Stencil state cache.
//!
//! The function triple (func, reference, read mask) and the operation
//! triple (fail, depth-fail, pass) each map to a single driver call, so
//! each triple shares one dirty flag.

use lucent_core::api::pipeline::{CompareFunction, StencilOperation, Toggle};
use lucent_core::driver::GlDriver;

/// Tracked stencil state with grouped dirty flags.
#[derive(Debug)]
pub struct StencilState {
    stencil_test: bool,
    test_dirty: bool,
    write_mask: u32,
    write_mask_dirty: bool,
    func: CompareFunction,
    func_ref: i32,
    func_mask: u32,
    func_dirty: bool,
    op_fail: StencilOperation,
    op_depth_fail: StencilOperation,
    op_pass: StencilOperation,
    op_dirty: bool,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            stencil_test: false,
            test_dirty: true,
            write_mask: 0xFF,
            write_mask_dirty: true,
            func: CompareFunction::Always,
            func_ref: 1,
            func_mask: 0xFF,
            func_dirty: true,
            op_fail: StencilOperation::Keep,
            op_depth_fail: StencilOperation::Keep,
            op_pass: StencilOperation::Replace,
            op_dirty: true,
        }
    }
}

impl StencilState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stencil_test(&self) -> bool {
        self.stencil_test
    }

    pub fn set_stencil_test(&mut self, enabled: bool) {
        if self.stencil_test != enabled {
            self.stencil_test = enabled;
            self.test_dirty = true;
        }
    }

    pub fn write_mask(&self) -> u32 {
        self.write_mask
    }

    pub fn set_write_mask(&mut self, mask: u32) {
        if self.write_mask != mask {
            self.write_mask = mask;
            self.write_mask_dirty = true;
        }
    }

    pub fn func(&self) -> CompareFunction {
        self.func
    }

    pub fn set_func(&mut self, func: CompareFunction) {
        if self.func != func {
            self.func = func;
            self.func_dirty = true;
        }
    }

    pub fn func_ref(&self) -> i32 {
        self.func_ref
    }

    pub fn set_func_ref(&mut self, reference: i32) {
        if self.func_ref != reference {
            self.func_ref = reference;
            self.func_dirty = true;
        }
    }

    pub fn func_mask(&self) -> u32 {
        self.func_mask
    }

    pub fn set_func_mask(&mut self, mask: u32) {
        if self.func_mask != mask {
            self.func_mask = mask;
            self.func_dirty = true;
        }
    }

    pub fn op_fail(&self) -> StencilOperation {
        self.op_fail
    }

    pub fn set_op_fail(&mut self, operation: StencilOperation) {
        if self.op_fail != operation {
            self.op_fail = operation;
            self.op_dirty = true;
        }
    }

    pub fn op_depth_fail(&self) -> StencilOperation {
        self.op_depth_fail
    }

    pub fn set_op_depth_fail(&mut self, operation: StencilOperation) {
        if self.op_depth_fail != operation {
            self.op_depth_fail = operation;
            self.op_dirty = true;
        }
    }

    pub fn op_pass(&self) -> StencilOperation {
        self.op_pass
    }

    pub fn set_op_pass(&mut self, operation: StencilOperation) {
        if self.op_pass != operation {
            self.op_pass = operation;
            self.op_dirty = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.test_dirty || self.write_mask_dirty || self.func_dirty || self.op_dirty
    }

    /// Restores engine defaults and marks every field dirty.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Issues one driver call per dirty field group, then clears flags.
    pub fn apply(&mut self, driver: &dyn GlDriver) {
        if !self.is_dirty() {
            return;
        }

        if self.test_dirty {
            if self.stencil_test {
                driver.enable(Toggle::StencilTest);
            } else {
                driver.disable(Toggle::StencilTest);
            }
            self.test_dirty = false;
        }
        if self.write_mask_dirty {
            driver.stencil_mask(self.write_mask);
            self.write_mask_dirty = false;
        }
        if self.func_dirty {
            driver.stencil_func(self.func, self.func_ref, self.func_mask);
            self.func_dirty = false;
        }
        if self.op_dirty {
            driver.stencil_op(self.op_fail, self.op_depth_fail, self.op_pass);
            self.op_dirty = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessDriver;

    #[test]
    fn func_triple_shares_one_driver_call() {
        let driver = HeadlessDriver::default();
        let mut state = StencilState::new();
        state.apply(&driver);
        driver.reset_counts();

        state.set_func(CompareFunction::Equal);
        state.set_func_ref(3);
        state.set_func_mask(0x0F);
        state.apply(&driver);
        assert_eq!(driver.call_count("stencil_func"), 1);
        assert_eq!(driver.call_count("stencil_op"), 0);
    }
}
