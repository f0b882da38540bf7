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

//! Frame pacing measurements over a rolling sample window.

use std::collections::VecDeque;
use std::time::Instant;

/// The FPS reported until enough samples exist to measure anything.
const DEFAULT_FPS: f64 = 60.0;

/// Rolling-window FPS and frame-delta measurement.
///
/// One timestamp is recorded per frame; the window holds the most
/// recent `window` samples and older ones fall off the front. FPS is
/// only recomputed from a full window; until then the last stable
/// value is reported, never a partial average.
#[derive(Debug)]
pub struct FrameClock {
    origin: Instant,
    samples: VecDeque<f64>,
    window: usize,
    fps: f64,
}

impl FrameClock {
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            origin: Instant::now(),
            samples: VecDeque::with_capacity(window),
            window,
            fps: DEFAULT_FPS,
        }
    }

    /// Records a frame boundary at the current monotonic time.
    pub fn tick(&mut self) {
        let millis = self.origin.elapsed().as_secs_f64() * 1000.0;
        self.tick_at(millis);
    }

    /// Records a frame boundary at an explicit millisecond timestamp.
    pub fn tick_at(&mut self, millis: f64) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(millis);

        if self.samples.len() == self.window {
            let span = self.samples[self.window - 1] - self.samples[0];
            if span > 0.0 {
                self.fps = (self.window as f64 - 1.0) * 1000.0 / span;
            }
        }
    }

    /// Milliseconds between the two most recent frames; 0 before the
    /// second frame.
    pub fn delta_time(&self) -> f64 {
        let len = self.samples.len();
        if len < 2 {
            return 0.0;
        }
        self.samples[len - 1] - self.samples[len - 2]
    }

    /// Mean frame rate over the most recent full window.
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60)
    }
}
