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

//! Shader program compilation and the keyed effect cache.
//!
//! Effects are identified by `"{vertex}+{fragment}@{defines}"`, so two
//! materials sharing sources and defines share one linked program. A
//! failed compile or link is logged and produces no cache entry; every
//! other effect stays usable.

use lucent_core::driver::{GlDriver, ProgramHandle, ShaderHandle, ShaderStage, UniformHandle};
use lucent_core::error::ShaderError;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything needed to build (or look up) an effect.
#[derive(Debug, Clone, Copy)]
pub struct EffectDescriptor<'a> {
    /// Name of the vertex source, used in the cache key.
    pub vertex_name: &'a str,
    /// Name of the fragment source, used in the cache key.
    pub fragment_name: &'a str,
    pub vertex_source: &'a str,
    pub fragment_source: &'a str,
    /// Preprocessor block prepended verbatim to both sources.
    pub defines: &'a str,
    /// Attribute names, in the slot order draw code will use.
    pub attributes: &'a [&'a str],
    pub uniforms: &'a [&'a str],
    /// Sampler uniforms, assigned texture units in list order.
    pub samplers: &'a [&'a str],
}

impl EffectDescriptor<'_> {
    pub fn key(&self) -> String {
        format!("{}+{}@{}", self.vertex_name, self.fragment_name, self.defines)
    }
}

/// A linked program with its resolved attribute and uniform locations.
#[derive(Debug)]
pub struct CompiledEffect {
    key: String,
    program: ProgramHandle,
    attribute_names: Vec<String>,
    /// Indexed by descriptor slot; `None` where the linker discarded
    /// the attribute.
    attribute_locations: Vec<Option<u32>>,
    uniforms: HashMap<String, UniformHandle>,
    samplers: Vec<String>,
}

impl CompiledEffect {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    pub fn attribute_location(&self, slot: usize) -> Option<u32> {
        self.attribute_locations.get(slot).copied().flatten()
    }

    /// Resolved location of a uniform or sampler, `None` when the
    /// linker discarded it.
    pub fn uniform(&self, name: &str) -> Option<UniformHandle> {
        self.uniforms.get(name).copied()
    }

    pub fn samplers(&self) -> &[String] {
        &self.samplers
    }
}

/// Cache of linked effects plus the current-program binding memo.
#[derive(Debug)]
pub struct EffectCache {
    driver: Arc<dyn GlDriver>,
    effects: HashMap<String, Arc<CompiledEffect>>,
    current_program: Option<ProgramHandle>,
}

impl EffectCache {
    pub fn new(driver: Arc<dyn GlDriver>) -> Self {
        Self {
            driver,
            effects: HashMap::new(),
            current_program: None,
        }
    }

    /// Returns the cached effect for the descriptor's key, building it
    /// on a miss. Compile or link failure is logged and yields `None`.
    pub fn create_effect(&mut self, descriptor: &EffectDescriptor<'_>) -> Option<Arc<CompiledEffect>> {
        let key = descriptor.key();
        if let Some(effect) = self.effects.get(&key) {
            return Some(effect.clone());
        }
        match self.build(descriptor, &key) {
            Ok(effect) => {
                let effect = Arc::new(effect);
                self.effects.insert(key, effect.clone());
                Some(effect)
            }
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }

    fn build(
        &self,
        descriptor: &EffectDescriptor<'_>,
        key: &str,
    ) -> Result<CompiledEffect, ShaderError> {
        let vertex = self.compile(ShaderStage::Vertex, descriptor.vertex_source, descriptor, key)?;
        let fragment = match self.compile(
            ShaderStage::Fragment,
            descriptor.fragment_source,
            descriptor,
            key,
        ) {
            Ok(handle) => handle,
            Err(err) => {
                self.driver.delete_shader(vertex);
                return Err(err);
            }
        };

        let program = match self.driver.link_program(vertex, fragment) {
            Ok(program) => program,
            Err(details) => {
                self.driver.delete_shader(vertex);
                self.driver.delete_shader(fragment);
                return Err(ShaderError::LinkError {
                    label: key.to_string(),
                    details,
                });
            }
        };
        self.driver.delete_shader(vertex);
        self.driver.delete_shader(fragment);

        let attribute_names: Vec<String> =
            descriptor.attributes.iter().map(|n| n.to_string()).collect();
        let attribute_locations = attribute_names
            .iter()
            .map(|name| self.driver.get_attrib_location(program, name))
            .collect();

        let mut uniforms = HashMap::new();
        for name in descriptor.uniforms.iter().chain(descriptor.samplers) {
            if let Some(handle) = self.driver.get_uniform_location(program, name) {
                uniforms.insert(name.to_string(), handle);
            }
        }

        Ok(CompiledEffect {
            key: key.to_string(),
            program,
            attribute_names,
            attribute_locations,
            uniforms,
            samplers: descriptor.samplers.iter().map(|n| n.to_string()).collect(),
        })
    }

    fn compile(
        &self,
        stage: ShaderStage,
        source: &str,
        descriptor: &EffectDescriptor<'_>,
        key: &str,
    ) -> Result<ShaderHandle, ShaderError> {
        let full = format!("{}\n{}", descriptor.defines, source);
        self.driver
            .compile_shader(stage, &full)
            .map_err(|details| ShaderError::CompilationError {
                stage,
                label: key.to_string(),
                details,
            })
    }

    /// Makes the effect's program current, skipping the driver call
    /// when it already is, then runs the caller's post-bind hook.
    pub fn enable_effect(
        &mut self,
        effect: &Arc<CompiledEffect>,
        on_bind: impl FnOnce(&CompiledEffect),
    ) {
        if self.current_program != Some(effect.program()) {
            self.driver.use_program(Some(effect.program()));
            self.current_program = Some(effect.program());
        }
        on_bind(effect);
    }

    /// Assigns texture units 0..n to the effect's sampler uniforms in
    /// declaration order.
    pub fn bind_samplers(&self, effect: &CompiledEffect) {
        for (unit, name) in effect.samplers().iter().enumerate() {
            if let Some(handle) = effect.uniform(name) {
                self.driver.set_uniform_int(handle, unit as i32);
            }
        }
    }

    /// Drops a cache entry and destroys its program.
    pub fn release_effect(&mut self, key: &str) {
        if let Some(effect) = self.effects.remove(key) {
            if self.current_program == Some(effect.program()) {
                self.driver.use_program(None);
                self.current_program = None;
            }
            self.driver.delete_program(effect.program());
        }
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Forgets the current-program memo; used when external code may
    /// have corrupted the context state.
    pub fn reset_binding(&mut self) {
        self.current_program = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessDriver;

    const BASIC: EffectDescriptor<'static> = EffectDescriptor {
        vertex_name: "basic",
        fragment_name: "basic",
        vertex_source: "void main() {}",
        fragment_source: "void main() {}",
        defines: "",
        attributes: &["position", "normal"],
        uniforms: &["world"],
        samplers: &["diffuseSampler"],
    };

    #[test]
    fn identical_descriptors_share_one_program() {
        let driver = Arc::new(HeadlessDriver::default());
        let mut cache = EffectCache::new(driver.clone());
        let first = cache.create_effect(&BASIC).unwrap();
        let second = cache.create_effect(&BASIC).unwrap();
        assert_eq!(first.program(), second.program());
        assert_eq!(driver.call_count("compile_shader"), 2);
        assert_eq!(driver.call_count("link_program"), 1);
    }

    #[test]
    fn defines_distinguish_cache_entries() {
        let driver = Arc::new(HeadlessDriver::default());
        let mut cache = EffectCache::new(driver);
        let plain = cache.create_effect(&BASIC).unwrap();
        let lit = cache
            .create_effect(&EffectDescriptor {
                defines: "#define LIGHTING",
                ..BASIC
            })
            .unwrap();
        assert_ne!(plain.program(), lit.program());
        assert_eq!(cache.effect_count(), 2);
    }

    #[test]
    fn compile_failure_leaves_other_entries_intact() {
        let driver = Arc::new(HeadlessDriver::default());
        let mut cache = EffectCache::new(driver.clone());
        cache.create_effect(&BASIC).unwrap();

        driver.inject_compile_error("Syntax error at line 3");
        let broken = cache.create_effect(&EffectDescriptor {
            fragment_name: "broken",
            ..BASIC
        });
        assert!(broken.is_none());
        assert_eq!(cache.effect_count(), 1);
        assert!(cache.create_effect(&BASIC).is_some());
    }

    #[test]
    fn enable_effect_elides_redundant_program_switches() {
        let driver = Arc::new(HeadlessDriver::default());
        let mut cache = EffectCache::new(driver.clone());
        let effect = cache.create_effect(&BASIC).unwrap();
        cache.enable_effect(&effect, |_| {});
        cache.enable_effect(&effect, |_| {});
        assert_eq!(driver.call_count("use_program"), 1);
    }

    #[test]
    fn samplers_get_sequential_units() {
        let driver = Arc::new(HeadlessDriver::default());
        let mut cache = EffectCache::new(driver.clone());
        let effect = cache
            .create_effect(&EffectDescriptor {
                samplers: &["diffuseSampler", "bumpSampler"],
                ..BASIC
            })
            .unwrap();
        cache.bind_samplers(&effect);
        assert_eq!(driver.call_count("set_uniform_int"), 2);
    }
}
