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

//! Process-wide diagnostic capture.
//!
//! Every message posted through [`post`] is forwarded to the `log` facade and to
//! each callback registered with [`register_callback`]. Backends post load
//! failures, validation messages and failed compilation reports here, so tools
//! can capture them without installing a global logger.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// The severity of a posted diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// Informational output, e.g. a backend was loaded.
    Info,
    /// Something suspicious that does not invalidate the operation.
    Warning,
    /// An operation failed or was rejected.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

type Callback = Arc<dyn Fn(Severity, &str) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    callbacks: RwLock<Vec<(u64, Callback)>>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::default)
}

/// Keeps a diagnostic callback registered. Dropping it unregisters the callback.
#[must_use = "the callback is unregistered when the handle is dropped"]
#[derive(Debug)]
pub struct CallbackHandle {
    id: u64,
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        let mut callbacks = registry()
            .callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        callbacks.retain(|(id, _)| *id != self.id);
    }
}

/// Registers a callback receiving every message posted with [`post`].
pub fn register_callback<F>(callback: F) -> CallbackHandle
where
    F: Fn(Severity, &str) + Send + Sync + 'static,
{
    let registry = registry();
    let id = registry.next_id.fetch_add(1, Ordering::Relaxed);
    registry
        .callbacks
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push((id, Arc::new(callback)));
    CallbackHandle { id }
}

/// Posts a diagnostic message to the `log` facade and to all registered callbacks.
pub fn post(severity: Severity, message: &str) {
    match severity {
        Severity::Info => log::info!(target: "prism", "{message}"),
        Severity::Warning => log::warn!(target: "prism", "{message}"),
        Severity::Error => log::error!(target: "prism", "{message}"),
    }

    // Snapshot so a callback may register or drop handles without deadlocking.
    let callbacks: Vec<Callback> = registry()
        .callbacks
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|(_, cb)| Arc::clone(cb))
        .collect();
    for callback in callbacks {
        callback(severity, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_callback_receives_messages_until_dropped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = register_callback(move |severity, msg| {
            if msg.starts_with("diag-test:") {
                sink.lock().unwrap().push((severity, msg.to_owned()));
            }
        });

        post(Severity::Warning, "diag-test: first");
        drop(handle);
        post(Severity::Error, "diag-test: second");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], (Severity::Warning, "diag-test: first".to_owned()));
    }
}
