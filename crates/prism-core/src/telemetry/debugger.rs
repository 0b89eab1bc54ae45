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

//! The rendering debugger: validation messages and frame capture sessions.
//!
//! A [`RenderingDebugger`] is attached to a render system when it is loaded.
//! The debug layer reports every validation message to it and, while a
//! [`CaptureSession`] is open, accumulates a [`FrameProfile`].

use super::profile::{FrameProfile, ProfileTimeRecord};
use crate::diagnostics::{self, Severity};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// The category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An argument is out of range or malformed.
    InvalidArgument,
    /// The call is not legal in the current state.
    InvalidState,
    /// The call needs a feature the backend does not support.
    UnsupportedFeature,
    /// The call leads to undefined behavior on at least one native API.
    UndefinedBehavior,
}

/// The category of a validation warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// An argument is legal but probably not what was intended.
    ImproperArgument,
    /// The state is legal but probably not what was intended.
    ImproperState,
    /// The call has no effect.
    PointlessOperation,
    /// The call behaves differently across backends.
    VaryingBehavior,
}

/// An error or warning category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A validation error; the command was rejected.
    Error(ErrorKind),
    /// A validation warning; the command was recorded.
    Warning(WarningKind),
}

impl MessageKind {
    /// The diagnostics severity of the category.
    pub fn severity(&self) -> Severity {
        match self {
            MessageKind::Error(_) => Severity::Error,
            MessageKind::Warning(_) => Severity::Warning,
        }
    }
}

/// One distinct validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugMessage {
    /// The category.
    pub kind: MessageKind,
    /// The function that produced the message, e.g. `"draw"`.
    pub source: String,
    /// The message text.
    pub text: String,
    /// How many times the message was reported.
    pub occurrences: u32,
}

impl fmt::Display for DebugMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, category) = match self.kind {
            MessageKind::Error(kind) => ("error", format!("{kind:?}")),
            MessageKind::Warning(kind) => ("warning", format!("{kind:?}")),
        };
        write!(f, "{label} ({category}) in '{}': {}", self.source, self.text)
    }
}

struct Capture {
    id: u64,
    started: Instant,
    profile: FrameProfile,
}

#[derive(Default)]
struct DebuggerInner {
    messages: Mutex<Vec<DebugMessage>>,
    capture: Mutex<Option<Capture>>,
    next_capture: AtomicU64,
}

/// Collects validation messages and frame profiles. Cloning shares the debugger.
#[derive(Clone, Default)]
pub struct RenderingDebugger {
    inner: Arc<DebuggerInner>,
}

impl RenderingDebugger {
    /// Creates a debugger with no messages and no capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a validation error.
    pub fn post_error(&self, kind: ErrorKind, source: &str, text: impl Into<String>) {
        self.post(MessageKind::Error(kind), source, text.into());
    }

    /// Reports a validation warning.
    pub fn post_warning(&self, kind: WarningKind, source: &str, text: impl Into<String>) {
        self.post(MessageKind::Warning(kind), source, text.into());
    }

    /// Returns a copy of the distinct messages reported so far.
    pub fn messages(&self) -> Vec<DebugMessage> {
        self.lock_messages().clone()
    }

    /// Removes and returns the messages reported so far.
    pub fn take_messages(&self) -> Vec<DebugMessage> {
        std::mem::take(&mut *self.lock_messages())
    }

    /// Returns `true` if any error was reported.
    pub fn has_errors(&self) -> bool {
        self.lock_messages()
            .iter()
            .any(|m| matches!(m.kind, MessageKind::Error(_)))
    }

    /// Opens a capture session.
    ///
    /// Returns `None` if a session is already open.
    pub fn begin_capture(&self) -> Option<CaptureSession> {
        let mut capture = self.lock_capture();
        if capture.is_some() {
            log::warn!("A frame capture is already in progress");
            return None;
        }
        let id = self.inner.next_capture.fetch_add(1, Ordering::Relaxed);
        *capture = Some(Capture {
            id,
            started: Instant::now(),
            profile: FrameProfile::default(),
        });
        log::debug!("Frame capture {id} started");
        Some(CaptureSession {
            debugger: self.clone(),
            id,
        })
    }

    /// Returns `true` while a capture session is open.
    pub fn is_capturing(&self) -> bool {
        self.lock_capture().is_some()
    }

    /// Updates the profile of the open capture. Does nothing without one.
    pub fn record(&self, update: impl FnOnce(&mut FrameProfile)) {
        if let Some(capture) = self.lock_capture().as_mut() {
            update(&mut capture.profile);
        }
    }

    /// Adds a CPU time record for a command that ran from `start` to `end`.
    /// Does nothing without an open capture.
    pub fn record_time(&self, annotation: &str, start: Instant, end: Instant) {
        if let Some(capture) = self.lock_capture().as_mut() {
            let since = |t: Instant| t.saturating_duration_since(capture.started).as_nanos() as u64;
            capture.profile.time_records.push(ProfileTimeRecord {
                annotation: annotation.to_owned(),
                cpu_start_nanos: since(start),
                cpu_end_nanos: since(end),
            });
        }
    }

    fn flush(&self, id: u64) -> FrameProfile {
        match self.lock_capture().as_mut() {
            Some(capture) if capture.id == id => std::mem::take(&mut capture.profile),
            _ => FrameProfile::default(),
        }
    }

    fn end_capture(&self, id: u64) -> Option<FrameProfile> {
        let mut capture = self.lock_capture();
        if capture.as_ref().is_some_and(|c| c.id == id) {
            log::debug!("Frame capture {id} finished");
            capture.take().map(|c| c.profile)
        } else {
            None
        }
    }

    fn post(&self, kind: MessageKind, source: &str, text: String) {
        let mut messages = self.lock_messages();
        if let Some(existing) = messages
            .iter_mut()
            .find(|m| m.kind == kind && m.source == source && m.text == text)
        {
            existing.occurrences += 1;
            return;
        }
        let message = DebugMessage {
            kind,
            source: source.to_owned(),
            text,
            occurrences: 1,
        };
        let line = message.to_string();
        messages.push(message);
        drop(messages);
        diagnostics::post(kind.severity(), &line);
    }

    fn lock_messages(&self) -> MutexGuard<'_, Vec<DebugMessage>> {
        self.inner
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_capture(&self) -> MutexGuard<'_, Option<Capture>> {
        self.inner
            .capture
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RenderingDebugger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingDebugger")
            .field("messages", &self.lock_messages().len())
            .field("capturing", &self.is_capturing())
            .finish()
    }
}

/// An open frame capture. Dropping it discards the profile.
#[must_use = "the capture ends when the session is dropped"]
#[derive(Debug)]
pub struct CaptureSession {
    debugger: RenderingDebugger,
    id: u64,
}

impl CaptureSession {
    /// Takes the profile accumulated since the session started or was last
    /// flushed, and keeps capturing. Call once per frame boundary.
    pub fn flush(&self) -> FrameProfile {
        self.debugger.flush(self.id)
    }

    /// Ends the session and returns the remaining profile.
    pub fn finish(self) -> FrameProfile {
        self.debugger.end_capture(self.id).unwrap_or_default()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.debugger.end_capture(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_deduplicated() {
        let debugger = RenderingDebugger::new();
        debugger.post_warning(WarningKind::PointlessOperation, "draw", "zero vertices");
        debugger.post_warning(WarningKind::PointlessOperation, "draw", "zero vertices");
        assert!(!debugger.has_errors());
        debugger.post_error(ErrorKind::InvalidState, "draw", "no pipeline");

        let messages = debugger.take_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].occurrences, 2);
        assert_eq!(
            messages[1].to_string(),
            "error (InvalidState) in 'draw': no pipeline"
        );
        assert!(debugger.messages().is_empty());
    }

    #[test]
    fn test_capture_session_lifecycle() {
        let debugger = RenderingDebugger::new();
        debugger.record(|p| p.command_buffer.draw_commands += 1);

        let session = debugger.begin_capture().unwrap();
        assert!(debugger.begin_capture().is_none());
        debugger.record(|p| p.command_buffer.draw_commands += 1);
        let start = Instant::now();
        debugger.record_time("draw", start, Instant::now());

        let frame = session.flush();
        assert_eq!(frame.command_buffer.draw_commands, 1);
        assert_eq!(frame.time_records.len(), 1);

        debugger.record(|p| p.command_queue.presents += 1);
        let rest = session.finish();
        assert_eq!(rest.command_queue.presents, 1);
        assert_eq!(rest.command_buffer.draw_commands, 0);
        assert!(!debugger.is_capturing());
    }

    #[test]
    fn test_dropped_session_ends_capture() {
        let debugger = RenderingDebugger::new();
        drop(debugger.begin_capture());
        assert!(!debugger.is_capturing());
        assert!(debugger.begin_capture().is_some());
    }
}
