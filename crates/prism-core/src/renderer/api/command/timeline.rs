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

//! A monotonic submission timeline shared by a queue, its fences and its command buffers.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Tickets {
    submitted: u64,
    completed: u64,
}

#[derive(Debug, Default)]
struct TimelineInner {
    tickets: Mutex<Tickets>,
    completion: Condvar,
}

/// Tickets handed out in submission order and completed in the same order.
///
/// Every submission (command buffer, fence signal, present) takes the next
/// ticket. A ticket is complete once the executor has finished it and every
/// ticket before it.
#[derive(Debug, Clone, Default)]
pub struct QueueTimeline {
    inner: Arc<TimelineInner>,
}

impl QueueTimeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next ticket.
    pub fn next_ticket(&self) -> u64 {
        let mut tickets = self.lock();
        tickets.submitted += 1;
        tickets.submitted
    }

    /// Marks `ticket` and everything before it as complete.
    pub fn complete(&self, ticket: u64) {
        let mut tickets = self.lock();
        if ticket > tickets.completed {
            tickets.completed = ticket;
            self.inner.completion.notify_all();
        }
    }

    /// The last completed ticket.
    pub fn completed(&self) -> u64 {
        self.lock().completed
    }

    /// The last submitted ticket.
    pub fn submitted(&self) -> u64 {
        self.lock().submitted
    }

    /// Returns `true` once `ticket` has completed.
    pub fn is_complete(&self, ticket: u64) -> bool {
        self.lock().completed >= ticket
    }

    /// Blocks until `ticket` completes or `timeout` elapses. `None` waits forever.
    ///
    /// Returns whether the ticket completed.
    pub fn wait(&self, ticket: u64, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut tickets = self.lock();
        while tickets.completed < ticket {
            tickets = match (timeout, deadline) {
                (None, _) | (Some(_), None) => self
                    .inner
                    .completion
                    .wait(tickets)
                    .unwrap_or_else(PoisonError::into_inner),
                (Some(_), Some(deadline)) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    self.inner
                        .completion
                        .wait_timeout(tickets, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
        true
    }

    /// Blocks until every ticket submitted so far has completed.
    pub fn wait_idle(&self) {
        let target = self.submitted();
        self.wait(target, None);
    }

    fn lock(&self) -> MutexGuard<'_, Tickets> {
        self.inner
            .tickets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_tickets_complete_in_order() {
        let timeline = QueueTimeline::new();
        let a = timeline.next_ticket();
        let b = timeline.next_ticket();
        assert_eq!((a, b), (1, 2));
        timeline.complete(a);
        assert!(timeline.is_complete(a));
        assert!(!timeline.is_complete(b));
        timeline.complete(b);
        timeline.complete(a);
        assert_eq!(timeline.completed(), 2);
    }

    #[test]
    fn test_wait_times_out_then_succeeds() {
        let timeline = QueueTimeline::new();
        let ticket = timeline.next_ticket();
        assert!(!timeline.wait(ticket, Some(Duration::from_millis(5))));

        let worker = timeline.clone();
        let handle = thread::spawn(move || worker.complete(ticket));
        assert!(timeline.wait(ticket, None));
        handle.join().unwrap();
        timeline.wait_idle();
    }
}
