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

//! Provides traits and data structures for active resource monitoring.
//!
//! A monitor is polled for a snapshot of a resource's state, as opposed to the
//! event-based counters of a [`super::FrameProfile`].

use std::any::Any;
use std::borrow::Cow;
use std::fmt::Debug;

/// The core trait for a resource monitor.
///
/// Backends implement this for the memory their objects hold. Tools poll
/// [`ResourceMonitor::get_usage_report`] at their own rate.
pub trait ResourceMonitor: Send + Sync + Debug + 'static {
    /// Returns a unique, human-readable identifier for this monitor instance.
    fn monitor_id(&self) -> Cow<'static, str>;

    /// Returns the general type of resource being monitored.
    fn resource_type(&self) -> MonitoredResourceType;

    /// Returns a snapshot of the current usage data for the monitored resource.
    fn get_usage_report(&self) -> ResourceUsageReport;

    /// Allows downcasting to a concrete `ResourceMonitor` type.
    fn as_any(&self) -> &dyn Any;

    /// Triggers the monitor to update its internal state by polling the resource.
    /// This default implementation does nothing, for monitors that update passively.
    fn update(&self) {}
}

/// An enumeration of the types of resources that can be monitored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitoredResourceType {
    /// Memory owned by the device: buffers and textures.
    DeviceMemory,
    /// Main system RAM.
    SystemRam,
}

/// A generic, unified report of resource usage, typically in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceUsageReport {
    /// The number of bytes currently in use.
    pub current_bytes: u64,
    /// The peak number of bytes ever in use simultaneously, if tracked.
    pub peak_bytes: Option<u64>,
    /// The total capacity of the resource in bytes, if known.
    pub total_capacity_bytes: Option<u64>,
}

/// A breakdown of the memory held by a render system's resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryReport {
    /// Bytes held by live buffers.
    pub buffer_bytes: u64,
    /// Bytes held by live textures, all mip levels included.
    pub texture_bytes: u64,
    /// The peak of `buffer_bytes + texture_bytes`.
    pub peak_bytes: u64,
    /// The number of live buffers.
    pub live_buffers: u64,
    /// The number of live textures.
    pub live_textures: u64,
    /// The number of resources allocated since the system was created.
    pub total_allocations: u64,
    /// The number of resources released since the system was created.
    pub total_releases: u64,
}

impl MemoryReport {
    /// Returns the bytes currently in use.
    pub fn current_bytes(&self) -> u64 {
        self.buffer_bytes + self.texture_bytes
    }

    /// Returns the current memory usage in megabytes (MB).
    pub fn current_usage_mb(&self) -> f64 {
        self.current_bytes() as f64 / (1024.0 * 1024.0)
    }

    /// Returns the peak memory usage in megabytes (MB).
    pub fn peak_usage_mb(&self) -> f64 {
        self.peak_bytes as f64 / (1024.0 * 1024.0)
    }
}

impl From<MemoryReport> for ResourceUsageReport {
    fn from(report: MemoryReport) -> Self {
        ResourceUsageReport {
            current_bytes: report.current_bytes(),
            peak_bytes: Some(report.peak_bytes),
            total_capacity_bytes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_memory_report_conversions() {
        let report = MemoryReport {
            buffer_bytes: 512 * 1024,
            texture_bytes: 512 * 1024,
            peak_bytes: 2 * 1024 * 1024,
            ..Default::default()
        };
        assert_relative_eq!(report.current_usage_mb(), 1.0);
        assert_relative_eq!(report.peak_usage_mb(), 2.0);
        let usage = ResourceUsageReport::from(report);
        assert_eq!(usage.current_bytes, 1024 * 1024);
        assert_eq!(usage.peak_bytes, Some(2 * 1024 * 1024));
    }
}
