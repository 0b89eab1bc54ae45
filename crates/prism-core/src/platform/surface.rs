// Copyright 2025 eraflo
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

use crate::math::Extent2D;

/// A trait that abstracts the presentation surface a swap chain renders into.
///
/// Any windowing backend can implement this trait. The render system only
/// borrows the surface: destroying a swap chain releases its binding to the
/// surface but never the surface itself.
pub trait Surface: Send + Sync {
    /// Pumps pending platform events. Returns `false` once the application
    /// was asked to quit.
    fn process_events(&self) -> bool;

    /// Returns the size of the drawable area in pixels.
    fn content_size(&self) -> Extent2D;

    /// Returns a channel that receives the new content size on every resize.
    fn subscribe_resize(&self) -> flume::Receiver<Extent2D>;

    /// Returns the display refresh rate in hertz, if known.
    fn refresh_rate(&self) -> Option<f32> {
        None
    }
}
