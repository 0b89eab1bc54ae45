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

use super::command::NullCommandBuffer;
use super::executor::{ExecutionStats, Executor, Job};
use super::storage::NullStorage;
use crossbeam_channel::Sender;
use prism_core::renderer::{
    BackendOwned, CommandBuffer, CommandError, CommandQueue, Fence, ObjectKind, QueryHeap,
    QueueTimeline, SystemId, INFINITE_TIMEOUT,
};
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

/// The single queue of a Null render system.
///
/// Submissions take a ticket on the queue timeline and are executed by a
/// worker thread in ticket order.
#[derive(Debug)]
pub struct NullCommandQueue {
    system: SystemId,
    timeline: QueueTimeline,
    sender: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<Mutex<ExecutionStats>>,
}

impl NullCommandQueue {
    pub(crate) fn new(system: SystemId, storage: Arc<NullStorage>) -> io::Result<Self> {
        let timeline = QueueTimeline::new();
        let stats = Arc::new(Mutex::new(ExecutionStats::default()));
        let (tx, rx) = crossbeam_channel::unbounded();
        let worker =
            Executor::new(storage, timeline.clone(), Arc::clone(&stats)).spawn(rx)?;
        Ok(Self {
            system,
            timeline,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            stats,
        })
    }

    /// A snapshot of the work executed so far.
    pub fn stats(&self) -> ExecutionStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The timeline submissions are ordered on.
    pub fn timeline(&self) -> &QueueTimeline {
        &self.timeline
    }

    pub(crate) fn submit_null(&self, buffer: &mut NullCommandBuffer) -> Result<(), CommandError> {
        if buffer.system_id() != self.system {
            return Err(CommandError::BackendMismatch {
                kind: ObjectKind::CommandBuffer,
            });
        }
        let commands = buffer.prepare_submit()?;
        let ticket = self.enqueue(|ticket| Job::Execute { commands, ticket });
        buffer.mark_pending(&self.timeline, ticket);
        Ok(())
    }

    /// Queues a present after all earlier work and returns its ticket.
    pub(crate) fn present(&self) -> u64 {
        self.enqueue(|ticket| Job::Present { ticket })
    }

    fn enqueue(&self, job: impl FnOnce(u64) -> Job) -> u64 {
        // Tickets are taken under the sender lock so jobs arrive in ticket order.
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let ticket = self.timeline.next_ticket();
        let sent = sender
            .as_ref()
            .is_some_and(|tx| tx.send(job(ticket)).is_ok());
        if !sent {
            log::error!("Null queue worker is gone; ticket {ticket} completes without running");
            self.timeline.complete(ticket);
        }
        ticket
    }
}

impl CommandQueue for NullCommandQueue {
    fn submit(&self, command_buffer: &mut dyn CommandBuffer) -> Result<(), CommandError> {
        let kind = command_buffer.object_kind();
        let buffer = command_buffer
            .as_any_mut()
            .downcast_mut::<NullCommandBuffer>()
            .ok_or(CommandError::BackendMismatch { kind })?;
        self.submit_null(buffer)
    }

    fn submit_fence(&self, fence: &Fence) -> Result<(), CommandError> {
        if fence.system_id() != self.system {
            return Err(CommandError::BackendMismatch {
                kind: ObjectKind::Fence,
            });
        }
        let ticket = self.enqueue(|ticket| Job::Signal { ticket });
        fence.mark_submitted(&self.timeline, ticket);
        Ok(())
    }

    fn wait_fence(&self, fence: &Fence, timeout_nanos: u64) -> bool {
        let timeout = (timeout_nanos != INFINITE_TIMEOUT).then(|| Duration::from_nanos(timeout_nanos));
        fence.wait(timeout)
    }

    fn wait_idle(&self) {
        self.timeline.wait_idle();
    }

    fn query_result(&self, heap: &QueryHeap, first: u32, out: &mut [u64]) -> bool {
        heap.read(first, out)
    }
}

impl Drop for NullCommandQueue {
    fn drop(&mut self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                log::error!("Null queue worker panicked");
            }
        }
    }
}
