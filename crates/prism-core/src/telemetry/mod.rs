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

//! Telemetry contracts: resource monitors, frame profiles and the rendering debugger.

pub mod debugger;
pub mod monitoring;
pub mod profile;

pub use self::debugger::{
    CaptureSession, DebugMessage, ErrorKind, MessageKind, RenderingDebugger, WarningKind,
};
pub use self::monitoring::{
    MemoryReport, MonitoredResourceType, ResourceMonitor, ResourceUsageReport,
};
pub use self::profile::{
    FrameProfile, ProfileCommandBufferRecord, ProfileCommandQueueRecord, ProfileTimeRecord,
};
