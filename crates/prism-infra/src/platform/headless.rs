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

//! A window-less [`Surface`] for tests, tools and off-screen rendering.

use prism_core::math::Extent2D;
use prism_core::platform::Surface;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// A surface with a fixed content size that only changes through [`HeadlessSurface::resize`].
///
/// Without a refresh rate, swap chains presenting to it never wait for
/// vertical blanks.
#[derive(Debug)]
pub struct HeadlessSurface {
    size: Mutex<Extent2D>,
    refresh_rate: Option<f32>,
    subscribers: Mutex<Vec<flume::Sender<Extent2D>>>,
    open: AtomicBool,
}

impl HeadlessSurface {
    /// Creates an open surface of the given size.
    pub fn new(size: Extent2D) -> Self {
        Self {
            size: Mutex::new(size),
            refresh_rate: None,
            subscribers: Mutex::new(Vec::new()),
            open: AtomicBool::new(true),
        }
    }

    /// Simulates a display refreshing `hz` times per second.
    pub fn with_refresh_rate(mut self, hz: f32) -> Self {
        self.refresh_rate = (hz.is_finite() && hz > 0.0).then_some(hz);
        self
    }

    /// Changes the content size and notifies every subscriber.
    pub fn resize(&self, size: Extent2D) {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner) = size;
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(size).is_ok());
        log::debug!(
            "Headless surface resized to {}x{} ({} subscribers)",
            size.width,
            size.height,
            subscribers.len()
        );
    }

    /// Requests the application to exit; `process_events` returns `false` afterwards.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

impl Surface for HeadlessSurface {
    fn process_events(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn content_size(&self) -> Extent2D {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe_resize(&self) -> flume::Receiver<Extent2D> {
        let (tx, rx) = flume::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    fn refresh_rate(&self) -> Option<f32> {
        self.refresh_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_reaches_live_subscribers() {
        let surface = HeadlessSurface::new(Extent2D::new(64, 64));
        let first = surface.subscribe_resize();
        let dropped = surface.subscribe_resize();
        drop(dropped);

        surface.resize(Extent2D::new(32, 16));
        assert_eq!(first.try_recv().unwrap(), Extent2D::new(32, 16));
        assert_eq!(surface.content_size(), Extent2D::new(32, 16));
        assert_eq!(surface.subscribers.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_close_ends_event_loop() {
        let surface = HeadlessSurface::new(Extent2D::new(1, 1)).with_refresh_rate(60.0);
        assert!(surface.process_events());
        surface.close();
        assert!(!surface.process_events());
        assert_eq!(surface.refresh_rate(), Some(60.0));
    }
}
