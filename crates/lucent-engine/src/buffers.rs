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

//! Reference-counted GPU buffer registry and vertex-stream binding cache.
//!
//! The manager owns every vertex, index and instancing buffer the engine
//! creates. Binding goes through per-target caches so rebinding the
//! already-bound buffer costs nothing, and attribute pointer setup is
//! memoized per location as well as per (vertex set, program) pair.

use crate::effects::CompiledEffect;
use lucent_core::api::buffer::{BufferId, BufferTarget, BufferUsage, VertexAttribType};
use lucent_core::api::caps::Capabilities;
use lucent_core::api::pipeline::IndexKind;
use lucent_core::driver::{BufferHandle, GlDriver, ProgramHandle};
use lucent_core::error::BufferError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One attribute stream sourced from a managed vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttributeBinding {
    pub buffer: BufferId,
    /// Component count per vertex (1 to 4).
    pub components: i32,
    pub kind: VertexAttribType,
    pub normalized: bool,
    /// Byte distance between consecutive vertices; 0 = tightly packed.
    pub stride: i32,
    /// Byte offset of the first component inside the buffer.
    pub offset: usize,
}

static NEXT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// A named collection of attribute streams, bound as a unit.
///
/// Each set carries a process-unique id so the binding cache can compare
/// identity in O(1) instead of comparing every stream.
#[derive(Debug)]
pub struct VertexBufferSet {
    id: u64,
    attributes: Vec<(String, VertexAttributeBinding)>,
}

impl VertexBufferSet {
    pub fn new() -> Self {
        Self {
            id: NEXT_SET_ID.fetch_add(1, Ordering::Relaxed),
            attributes: Vec::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, binding: VertexAttributeBinding) {
        let name = name.into();
        if let Some(entry) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = binding;
        } else {
            self.attributes.push((name, binding));
        }
    }

    pub fn get(&self, name: &str) -> Option<&VertexAttributeBinding> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
    }

    pub fn unique_id(&self) -> u64 {
        self.id
    }
}

impl Default for VertexBufferSet {
    fn default() -> Self {
        Self::new()
    }
}

/// An instanced attribute stream descriptor, consumed in declaration
/// order with a running byte offset.
#[derive(Debug, Clone, Copy)]
pub struct InstancingAttribute {
    pub location: u32,
    /// Float component count for this attribute.
    pub components: i32,
}

#[derive(Debug)]
struct GpuBuffer {
    handle: BufferHandle,
    references: u32,
    capacity: usize,
    usage: BufferUsage,
    /// Only meaningful for index buffers.
    is_32_bits: bool,
}

/// The last pointer configuration issued for an attribute location.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BufferPointer {
    buffer: BufferHandle,
    components: i32,
    kind: VertexAttribType,
    normalized: bool,
    stride: i32,
    offset: usize,
}

/// Registry and binding cache for all engine-managed buffers.
#[derive(Debug)]
pub struct BufferManager {
    driver: Arc<dyn GlDriver>,
    uint_indices: bool,
    buffers: HashMap<BufferId, GpuBuffer>,
    next_id: u64,

    bound: [Option<BufferHandle>; 2],
    attrib_pointers: Vec<Option<BufferPointer>>,
    enabled_attribs: Vec<bool>,
    instanced_locations: Vec<u32>,

    cached_set: Option<(u64, ProgramHandle)>,
    cached_index_buffer: Option<BufferId>,
    current_index_kind: Option<IndexKind>,
}

impl BufferManager {
    pub fn new(driver: Arc<dyn GlDriver>, caps: &Capabilities) -> Self {
        let attrib_count = caps.max_vertex_attribs as usize;
        Self {
            driver,
            uint_indices: caps.uint_indices,
            buffers: HashMap::new(),
            next_id: 0,
            bound: [None; 2],
            attrib_pointers: vec![None; attrib_count],
            enabled_attribs: vec![false; attrib_count],
            instanced_locations: Vec::new(),
            cached_set: None,
            cached_index_buffer: None,
            current_index_kind: None,
        }
    }

    fn register(&mut self, buffer: GpuBuffer) -> BufferId {
        self.next_id += 1;
        let id = BufferId(self.next_id);
        self.buffers.insert(id, buffer);
        id
    }

    fn bind_handle(&mut self, target: BufferTarget, handle: Option<BufferHandle>) {
        let slot = target.cache_slot();
        if self.bound[slot] != handle {
            self.driver.bind_buffer(target, handle);
            self.bound[slot] = handle;
        }
    }

    /// Creates a vertex buffer and uploads `data` immediately.
    pub fn create_vertex_buffer(&mut self, data: &[f32], usage: BufferUsage) -> BufferId {
        let handle = self.driver.create_buffer();
        self.bind_handle(BufferTarget::Array, Some(handle));
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.driver.buffer_data(BufferTarget::Array, bytes, usage);
        self.bind_handle(BufferTarget::Array, None);
        self.register(GpuBuffer {
            handle,
            references: 1,
            capacity: bytes.len(),
            usage,
            is_32_bits: false,
        })
    }

    /// Creates an index buffer, widening to 32-bit storage when the data
    /// needs it and the context allows it.
    pub fn create_index_buffer(&mut self, indices: &[u32]) -> Result<BufferId, BufferError> {
        let needs_32_bits = indices.iter().copied().find(|&i| i > u16::MAX as u32);
        let is_32_bits = match needs_32_bits {
            Some(index_value) if !self.uint_indices => {
                return Err(BufferError::WideIndicesUnsupported { index_value });
            }
            Some(_) => true,
            None => false,
        };

        let handle = self.driver.create_buffer();
        self.bind_handle(BufferTarget::ElementArray, Some(handle));
        let capacity;
        if is_32_bits {
            let bytes: &[u8] = bytemuck::cast_slice(indices);
            capacity = bytes.len();
            self.driver
                .buffer_data(BufferTarget::ElementArray, bytes, BufferUsage::Static);
        } else {
            let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
            let bytes: &[u8] = bytemuck::cast_slice(&narrow);
            capacity = bytes.len();
            self.driver
                .buffer_data(BufferTarget::ElementArray, bytes, BufferUsage::Static);
        }
        self.bind_handle(BufferTarget::ElementArray, None);
        Ok(self.register(GpuBuffer {
            handle,
            references: 1,
            capacity,
            usage: BufferUsage::Static,
            is_32_bits,
        }))
    }

    /// Bumps the reference count for a buffer shared by another submesh.
    pub fn retain_buffer(&mut self, id: BufferId) -> Result<(), BufferError> {
        let buffer = self
            .buffers
            .get_mut(&id)
            .ok_or(BufferError::NotFound { id })?;
        buffer.references += 1;
        Ok(())
    }

    /// Drops one reference; returns `true` when the buffer was
    /// physically destroyed.
    pub fn release_buffer(&mut self, id: BufferId) -> Result<bool, BufferError> {
        let buffer = self
            .buffers
            .get_mut(&id)
            .ok_or(BufferError::NotFound { id })?;
        buffer.references -= 1;
        if buffer.references > 0 {
            return Ok(false);
        }
        let handle = buffer.handle;
        self.buffers.remove(&id);
        for slot in &mut self.bound {
            if *slot == Some(handle) {
                *slot = None;
            }
        }
        // The driver may hand the freed name to the next buffer it
        // creates; a memo still naming this handle would then elide
        // pointer setup for unrelated data.
        for pointer in &mut self.attrib_pointers {
            if matches!(pointer, Some(p) if p.buffer == handle) {
                *pointer = None;
            }
        }
        self.cached_set = None;
        if self.cached_index_buffer == Some(id) {
            self.cached_index_buffer = None;
            self.current_index_kind = None;
        }
        self.driver.delete_buffer(handle);
        Ok(true)
    }

    pub fn references(&self, id: BufferId) -> Option<u32> {
        self.buffers.get(&id).map(|b| b.references)
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Binds a vertex buffer to the array target, eliding redundant binds.
    pub fn bind_array_buffer(&mut self, id: BufferId) -> Result<(), BufferError> {
        let handle = self
            .buffers
            .get(&id)
            .ok_or(BufferError::NotFound { id })?
            .handle;
        self.bind_handle(BufferTarget::Array, Some(handle));
        Ok(())
    }

    /// Binds an index buffer and tracks its element width for draws.
    pub fn bind_index_buffer(&mut self, id: BufferId) -> Result<(), BufferError> {
        let buffer = self.buffers.get(&id).ok_or(BufferError::NotFound { id })?;
        let handle = buffer.handle;
        let kind = if buffer.is_32_bits {
            IndexKind::U32
        } else {
            IndexKind::U16
        };
        self.bind_handle(BufferTarget::ElementArray, Some(handle));
        self.cached_index_buffer = Some(id);
        self.current_index_kind = Some(kind);
        Ok(())
    }

    /// Element width of the most recently bound index buffer.
    pub fn current_index_kind(&self) -> Option<IndexKind> {
        self.current_index_kind
    }

    /// Replaces the full contents of a dynamic buffer.
    pub fn update_dynamic_buffer(
        &mut self,
        id: BufferId,
        data: &[f32],
    ) -> Result<(), BufferError> {
        self.update_dynamic_buffer_at(id, 0, data)
    }

    /// Overwrites a byte range of a dynamic buffer starting at
    /// `byte_offset`.
    pub fn update_dynamic_buffer_at(
        &mut self,
        id: BufferId,
        byte_offset: usize,
        data: &[f32],
    ) -> Result<(), BufferError> {
        let buffer = self.buffers.get(&id).ok_or(BufferError::NotFound { id })?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if byte_offset + bytes.len() > buffer.capacity {
            return Err(BufferError::OutOfBounds);
        }
        let handle = buffer.handle;
        let usage = buffer.usage;
        let capacity = buffer.capacity;
        self.bind_handle(BufferTarget::Array, Some(handle));
        if byte_offset == 0 && bytes.len() == capacity {
            self.driver.buffer_data(BufferTarget::Array, bytes, usage);
        } else {
            self.driver
                .buffer_sub_data(BufferTarget::Array, byte_offset, bytes);
        }
        self.bind_handle(BufferTarget::Array, None);
        Ok(())
    }

    /// Overwrites a dynamic buffer from a sub-slice of `data`, selected
    /// by element `start` and `count`.
    pub fn update_dynamic_buffer_slice(
        &mut self,
        id: BufferId,
        data: &[f32],
        start: usize,
        count: usize,
    ) -> Result<(), BufferError> {
        let end = start.checked_add(count).ok_or(BufferError::OutOfBounds)?;
        if end > data.len() {
            return Err(BufferError::OutOfBounds);
        }
        self.update_dynamic_buffer_at(id, start * 4, &data[start..end])
    }

    /// Binds the vertex streams an effect consumes plus the index
    /// buffer. A repeated call with the same set and program skips all
    /// attribute work.
    pub fn bind_buffers(
        &mut self,
        set: &VertexBufferSet,
        index_buffer: Option<BufferId>,
        effect: &CompiledEffect,
    ) -> Result<(), BufferError> {
        let key = (set.unique_id(), effect.program());
        if self.cached_set != Some(key) {
            self.cached_set = Some(key);

            for (slot, name) in effect.attribute_names().iter().enumerate() {
                let Some(location) = effect.attribute_location(slot) else {
                    continue;
                };
                let Some(binding) = set.get(name) else {
                    continue;
                };
                self.bind_attribute(location, binding)?;
            }
        }

        if let Some(index) = index_buffer {
            if self.cached_index_buffer != Some(index)
                || self.bound[BufferTarget::ElementArray.cache_slot()].is_none()
            {
                self.bind_index_buffer(index)?;
            }
        }
        Ok(())
    }

    fn bind_attribute(
        &mut self,
        location: u32,
        binding: &VertexAttributeBinding,
    ) -> Result<(), BufferError> {
        let handle = self
            .buffers
            .get(&binding.buffer)
            .ok_or(BufferError::NotFound { id: binding.buffer })?
            .handle;

        let slot = location as usize;
        if slot < self.enabled_attribs.len() && !self.enabled_attribs[slot] {
            self.driver.enable_vertex_attrib(location);
            self.enabled_attribs[slot] = true;
        }

        let pointer = BufferPointer {
            buffer: handle,
            components: binding.components,
            kind: binding.kind,
            normalized: binding.normalized,
            stride: binding.stride,
            offset: binding.offset,
        };
        if slot < self.attrib_pointers.len() && self.attrib_pointers[slot] == Some(pointer) {
            return Ok(());
        }

        self.bind_handle(BufferTarget::Array, Some(handle));
        self.driver.vertex_attrib_pointer(
            location,
            binding.components,
            binding.kind,
            binding.normalized,
            binding.stride,
            binding.offset,
        );
        if slot < self.attrib_pointers.len() {
            self.attrib_pointers[slot] = Some(pointer);
        }
        Ok(())
    }

    /// Creates an uninitialized dynamic buffer for per-instance data.
    pub fn create_instances_buffer(&mut self, capacity: usize) -> BufferId {
        let handle = self.driver.create_buffer();
        self.bind_handle(BufferTarget::Array, Some(handle));
        self.driver
            .buffer_reserve(BufferTarget::Array, capacity, BufferUsage::Dynamic);
        self.bind_handle(BufferTarget::Array, None);
        self.register(GpuBuffer {
            handle,
            references: 1,
            capacity,
            usage: BufferUsage::Dynamic,
            is_32_bits: false,
        })
    }

    /// Uploads per-instance data and wires the instanced attribute
    /// streams with divisor 1.
    pub fn update_and_bind_instances_buffer(
        &mut self,
        id: BufferId,
        data: &[f32],
        attributes: &[InstancingAttribute],
    ) -> Result<(), BufferError> {
        let buffer = self.buffers.get(&id).ok_or(BufferError::NotFound { id })?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.len() > buffer.capacity {
            return Err(BufferError::OutOfBounds);
        }
        let handle = buffer.handle;
        self.bind_handle(BufferTarget::Array, Some(handle));
        self.driver.buffer_sub_data(BufferTarget::Array, 0, bytes);

        let stride: i32 = attributes.iter().map(|a| a.components * 4).sum();
        let mut offset = 0usize;
        for attribute in attributes {
            let location = attribute.location;
            let slot = location as usize;
            if slot < self.enabled_attribs.len() && !self.enabled_attribs[slot] {
                self.driver.enable_vertex_attrib(location);
                self.enabled_attribs[slot] = true;
            }
            self.driver.vertex_attrib_pointer(
                location,
                attribute.components,
                VertexAttribType::Float,
                false,
                stride,
                offset,
            );
            self.driver.vertex_attrib_divisor(location, 1);
            if slot < self.attrib_pointers.len() {
                // Instanced pointers share locations with per-vertex
                // streams across draws, so the memo must not keep them.
                self.attrib_pointers[slot] = None;
            }
            if !self.instanced_locations.contains(&location) {
                self.instanced_locations.push(location);
            }
            offset += attribute.components as usize * 4;
        }
        Ok(())
    }

    /// Restores divisor 0 on every location used for instancing.
    pub fn unbind_instance_attributes(&mut self) {
        for location in self.instanced_locations.drain(..) {
            self.driver.vertex_attrib_divisor(location, 0);
        }
        self.cached_set = None;
    }

    /// Disables every currently enabled attribute location.
    pub fn unbind_all_attributes(&mut self) {
        for (slot, enabled) in self.enabled_attribs.iter_mut().enumerate() {
            if *enabled {
                self.driver.disable_vertex_attrib(slot as u32);
                *enabled = false;
            }
        }
        self.cached_set = None;
    }

    /// Forgets all binding memos without touching the driver; used when
    /// external code may have corrupted the context state.
    pub fn reset_caches(&mut self) {
        self.bound = [None; 2];
        for pointer in &mut self.attrib_pointers {
            *pointer = None;
        }
        for enabled in &mut self.enabled_attribs {
            *enabled = false;
        }
        self.cached_set = None;
        self.cached_index_buffer = None;
        self.current_index_kind = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::probe;
    use crate::headless::{HeadlessConfig, HeadlessDriver};

    fn manager() -> (Arc<HeadlessDriver>, BufferManager) {
        let driver = Arc::new(HeadlessDriver::default());
        let (caps, _) = probe(driver.as_ref()).unwrap();
        let manager = BufferManager::new(driver.clone(), &caps);
        (driver, manager)
    }

    #[test]
    fn rebinding_the_bound_buffer_is_elided() {
        let (driver, mut manager) = manager();
        let id = manager.create_vertex_buffer(&[0.0; 12], BufferUsage::Static);
        driver.reset_counts();

        manager.bind_array_buffer(id).unwrap();
        manager.bind_array_buffer(id).unwrap();
        manager.bind_array_buffer(id).unwrap();
        assert_eq!(driver.call_count("bind_buffer"), 1);
    }

    #[test]
    fn narrow_indices_stay_16_bits() {
        let (_, mut manager) = manager();
        let id = manager.create_index_buffer(&[0, 1, 2, 65535]).unwrap();
        manager.bind_index_buffer(id).unwrap();
        assert_eq!(manager.current_index_kind(), Some(IndexKind::U16));
    }

    #[test]
    fn wide_indices_widen_when_supported() {
        let (_, mut manager) = manager();
        let id = manager.create_index_buffer(&[0, 70000]).unwrap();
        manager.bind_index_buffer(id).unwrap();
        assert_eq!(manager.current_index_kind(), Some(IndexKind::U32));
    }

    #[test]
    fn wide_indices_fail_without_uint_support() {
        let driver = Arc::new(HeadlessDriver::new(HeadlessConfig::minimal()));
        let (caps, _) = probe(driver.as_ref()).unwrap();
        let mut manager = BufferManager::new(driver, &caps);
        let err = manager.create_index_buffer(&[0, 70000]).unwrap_err();
        assert!(matches!(
            err,
            BufferError::WideIndicesUnsupported { index_value: 70000 }
        ));
    }

    #[test]
    fn release_deletes_exactly_once_at_zero_references() {
        let (driver, mut manager) = manager();
        let id = manager.create_vertex_buffer(&[1.0, 2.0], BufferUsage::Static);
        manager.retain_buffer(id).unwrap();

        assert!(!manager.release_buffer(id).unwrap());
        assert_eq!(driver.call_count("delete_buffer"), 0);
        assert!(manager.release_buffer(id).unwrap());
        assert_eq!(driver.call_count("delete_buffer"), 1);
        assert!(matches!(
            manager.release_buffer(id),
            Err(BufferError::NotFound { .. })
        ));
    }

    #[test]
    fn dynamic_update_rejects_out_of_bounds_ranges() {
        let (_, mut manager) = manager();
        let id = manager.create_vertex_buffer(&[0.0; 4], BufferUsage::Dynamic);
        assert!(matches!(
            manager.update_dynamic_buffer_at(id, 8, &[0.0; 4]),
            Err(BufferError::OutOfBounds)
        ));
        manager.update_dynamic_buffer_at(id, 8, &[0.0; 2]).unwrap();
    }

    #[test]
    fn instancing_divisors_are_restored_on_unbind() {
        let (driver, mut manager) = manager();
        let id = manager.create_instances_buffer(256);
        let layout = [
            InstancingAttribute {
                location: 4,
                components: 4,
            },
            InstancingAttribute {
                location: 5,
                components: 4,
            },
        ];
        manager
            .update_and_bind_instances_buffer(id, &[0.0; 8], &layout)
            .unwrap();
        driver.reset_counts();

        manager.unbind_instance_attributes();
        assert_eq!(driver.call_count("vertex_attrib_divisor"), 2);
        manager.unbind_instance_attributes();
        assert_eq!(driver.call_count("vertex_attrib_divisor"), 2);
    }
}
