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

//! Fences: CPU-visible completion markers placed on a queue timeline.

use super::timeline::QueueTimeline;
use crate::impl_backend_object;
use crate::renderer::api::core::{BackendBinding, ObjectCore};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// An opaque, backend-assigned fence ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FenceId(pub usize);

struct FenceInner {
    core: ObjectCore,
    marker: Mutex<Option<(QueueTimeline, u64)>>,
}

/// A reference-counted handle to a fence.
///
/// Submitting a fence places it after all earlier work on the queue. It is
/// signaled once that work completes. Fences can be submitted again; each
/// submission replaces the previous marker.
#[derive(Clone)]
pub struct Fence {
    inner: Arc<FenceInner>,
}

impl Fence {
    /// Creates an unsubmitted fence. Called by backends.
    pub fn new(binding: BackendBinding) -> Self {
        Self {
            inner: Arc::new(FenceInner {
                core: ObjectCore::new(binding, None),
                marker: Mutex::new(None),
            }),
        }
    }

    /// The backend-assigned ID.
    pub fn id(&self) -> FenceId {
        FenceId(self.inner.core.binding().id())
    }

    /// Places the fence at `ticket` of `timeline`. Called by queues on submit.
    pub fn mark_submitted(&self, timeline: &QueueTimeline, ticket: u64) {
        *self.lock() = Some((timeline.clone(), ticket));
    }

    /// Returns `true` if the fence was ever submitted.
    pub fn is_submitted(&self) -> bool {
        self.lock().is_some()
    }

    /// Returns `true` if the fence was submitted and all work before it completed.
    pub fn is_signaled(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|(timeline, ticket)| timeline.is_complete(*ticket))
    }

    /// Blocks until the fence is signaled or `timeout` elapses. `None` waits forever.
    ///
    /// A fence that was never submitted cannot signal, so this returns `false`
    /// at once.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let marker = self.lock().clone();
        match marker {
            Some((timeline, ticket)) => timeline.wait(ticket, timeout),
            None => {
                log::warn!("Waiting on fence {} that was never submitted", self.id().0);
                false
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<(QueueTimeline, u64)>> {
        self.inner
            .marker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl_backend_object!(Fence);

impl fmt::Debug for Fence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fence")
            .field("id", &self.id())
            .field("signaled", &self.is_signaled())
            .finish()
    }
}
