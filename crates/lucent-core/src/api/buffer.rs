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

//! Types describing GPU buffer resources and vertex streams.

/// A binding point for buffer objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex data (`ARRAY_BUFFER`).
    Array,
    /// Element indices (`ELEMENT_ARRAY_BUFFER`).
    ElementArray,
}

impl BufferTarget {
    /// Dense index used by per-target binding caches.
    pub fn cache_slot(self) -> usize {
        match self {
            BufferTarget::Array => 0,
            BufferTarget::ElementArray => 1,
        }
    }
}

/// An upload usage hint for buffer storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    Static,
    /// Rewritten frequently from the CPU.
    Dynamic,
}

/// The component type of a vertex attribute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribType {
    Float,
    UnsignedByte,
    Short,
}

/// An opaque id for an engine-managed, reference-counted GPU buffer.
///
/// Returned by the buffer manager and shared by every submesh that
/// reuses the same vertex or index data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);
