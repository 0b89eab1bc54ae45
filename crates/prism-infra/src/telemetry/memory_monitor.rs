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

//! Device Memory Resource Monitor
//!
//! Provides memory monitoring for render systems whose buffers and textures
//! live in host memory. Backends feed a [`MemoryTracker`] on every allocation
//! and release; a [`MemoryMonitor`] exposes it through the
//! [`ResourceMonitor`] contract.

use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prism_core::telemetry::{
    MemoryReport, MonitoredResourceType, ResourceMonitor, ResourceUsageReport,
};

/// The kind of allocation a tracker records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocationKind {
    /// Buffer storage.
    Buffer,
    /// Texture storage, all mip levels.
    Texture,
}

/// Shared allocation counters. Cloning shares the counters.
#[derive(Debug, Clone, Default)]
pub struct MemoryTracker {
    report: Arc<Mutex<MemoryReport>>,
}

impl MemoryTracker {
    /// Creates a tracker with no allocations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new allocation of `bytes`.
    pub fn allocate(&self, kind: AllocationKind, bytes: u64) {
        let mut report = self.lock();
        match kind {
            AllocationKind::Buffer => {
                report.buffer_bytes += bytes;
                report.live_buffers += 1;
            }
            AllocationKind::Texture => {
                report.texture_bytes += bytes;
                report.live_textures += 1;
            }
        }
        report.total_allocations += 1;
        report.peak_bytes = report.peak_bytes.max(report.current_bytes());
    }

    /// Records the release of an allocation of `bytes`.
    pub fn release(&self, kind: AllocationKind, bytes: u64) {
        let mut report = self.lock();
        match kind {
            AllocationKind::Buffer => {
                report.buffer_bytes = report.buffer_bytes.saturating_sub(bytes);
                report.live_buffers = report.live_buffers.saturating_sub(1);
            }
            AllocationKind::Texture => {
                report.texture_bytes = report.texture_bytes.saturating_sub(bytes);
                report.live_textures = report.live_textures.saturating_sub(1);
            }
        }
        report.total_releases += 1;
    }

    /// Resets the peak to the current usage.
    pub fn reset_peak(&self) {
        let mut report = self.lock();
        report.peak_bytes = report.current_bytes();
    }

    /// Returns a copy of the counters.
    pub fn snapshot(&self) -> MemoryReport {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryReport> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Device memory resource monitor.
///
/// Reads the counters of a [`MemoryTracker`] and keeps the last sampled
/// report for tools that poll at their own rate.
#[derive(Debug)]
pub struct MemoryMonitor {
    id: String,
    tracker: MemoryTracker,
    last_report: Mutex<Option<MemoryReport>>,
    sample_count: Mutex<u64>,
}

impl MemoryMonitor {
    /// Creates a monitor over `tracker`.
    pub fn new(id: String, tracker: MemoryTracker) -> Self {
        Self {
            id,
            tracker,
            last_report: Mutex::new(None),
            sample_count: Mutex::new(0),
        }
    }

    /// Returns the report taken by the latest [`ResourceMonitor::update`].
    pub fn get_memory_report(&self) -> Option<MemoryReport> {
        *self
            .last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The number of samples taken so far.
    pub fn sample_count(&self) -> u64 {
        *self
            .sample_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Resets the peak usage counter to the current memory usage.
    pub fn reset_peak_usage(&self) {
        self.tracker.reset_peak();
    }

    fn update_internal_stats(&self) {
        let report = self.tracker.snapshot();
        *self
            .sample_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        *self
            .last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(report);
    }
}

impl ResourceMonitor for MemoryMonitor {
    fn monitor_id(&self) -> Cow<'static, str> {
        Cow::Owned(self.id.clone())
    }

    fn resource_type(&self) -> MonitoredResourceType {
        MonitoredResourceType::DeviceMemory
    }

    fn get_usage_report(&self) -> ResourceUsageReport {
        self.tracker.snapshot().into()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn update(&self) {
        self.update_internal_stats();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_monitor_creation() {
        let monitor = MemoryMonitor::new("TestMemory".to_string(), MemoryTracker::new());
        assert_eq!(monitor.monitor_id(), "TestMemory");
        assert_eq!(monitor.resource_type(), MonitoredResourceType::DeviceMemory);
        assert!(monitor.get_memory_report().is_none());
    }

    #[test]
    fn memory_monitor_tracks_allocations() {
        let tracker = MemoryTracker::new();
        let monitor = MemoryMonitor::new("TestMemory".to_string(), tracker.clone());

        tracker.allocate(AllocationKind::Buffer, 256);
        tracker.allocate(AllocationKind::Texture, 1024);
        monitor.update();

        let report = monitor.get_memory_report().unwrap();
        assert_eq!(report.buffer_bytes, 256);
        assert_eq!(report.texture_bytes, 1024);
        assert_eq!(report.live_buffers, 1);
        assert_eq!(monitor.sample_count(), 1);

        tracker.release(AllocationKind::Texture, 1024);
        let usage = monitor.get_usage_report();
        assert_eq!(usage.current_bytes, 256);
        assert_eq!(usage.peak_bytes, Some(1280));
    }

    #[test]
    fn memory_monitor_reset_peak() {
        let tracker = MemoryTracker::new();
        let monitor = MemoryMonitor::new("TestMemory".to_string(), tracker.clone());

        tracker.allocate(AllocationKind::Buffer, 4096);
        tracker.release(AllocationKind::Buffer, 4096);
        assert_eq!(monitor.get_usage_report().peak_bytes, Some(4096));

        monitor.reset_peak_usage();
        monitor.update();
        let report = monitor.get_memory_report().unwrap();
        assert_eq!(report.peak_bytes, 0);
        assert_eq!(report.total_allocations, 1);
        assert_eq!(report.total_releases, 1);
    }
}
