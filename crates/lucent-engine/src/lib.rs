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

//! The Lucent rendering engine.
//!
//! A hardware abstraction layer over a stateful GL-style context:
//! capability probing, pipeline state caching, reference-counted buffer
//! and texture management, an effect cache and draw dispatch, all
//! behind the [`Engine`] façade. The concrete context lives behind the
//! `GlDriver` trait from `lucent-core`; the [`headless`] module ships an
//! in-memory implementation used by the test suite and CI.

pub mod buffers;
pub mod caps;
pub mod draw;
pub mod effects;
pub mod engine;
pub mod frame_clock;
pub mod headless;
pub mod state;
pub mod textures;

pub use buffers::{BufferManager, InstancingAttribute, VertexAttributeBinding, VertexBufferSet};
pub use draw::DrawDispatcher;
pub use effects::{CompiledEffect, EffectCache, EffectDescriptor};
pub use engine::{Engine, EngineOptions, LoadingScreen, RenderLoopId};
pub use frame_clock::FrameClock;
pub use headless::{HeadlessConfig, HeadlessDriver};
pub use state::{AlphaState, DepthCullingState, PipelineStates, StencilState};
pub use textures::TextureManager;
