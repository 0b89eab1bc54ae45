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

//! Diagnostic reports attached to shaders, pipeline states and backend loads.

use crate::diagnostics::{self, Severity};
use serde::Serialize;
use std::fmt;

/// Accumulated diagnostic text plus an error flag.
///
/// Creation calls that compile something (shaders, pipeline states) return a
/// valid object carrying a `Report` instead of failing outright. Callers are
/// expected to check [`Report::has_errors`] after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    text: String,
    has_errors: bool,
}

impl Report {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a report holding a single error line.
    pub fn with_error(message: impl AsRef<str>) -> Self {
        let mut report = Self::new();
        report.error(message);
        report
    }

    /// Appends an informational line.
    pub fn info(&mut self, message: impl AsRef<str>) {
        self.push_line(message.as_ref());
    }

    /// Appends an error line and marks the report as failed.
    pub fn error(&mut self, message: impl AsRef<str>) {
        self.push_line(message.as_ref());
        self.has_errors = true;
    }

    /// Appends every line of `other`, keeping its error flag.
    pub fn merge(&mut self, other: &Report) {
        for line in other.lines() {
            self.push_line(line);
        }
        self.has_errors |= other.has_errors;
    }

    /// Returns `true` if at least one error was recorded.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Returns the accumulated text, one message per line.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Iterates over the recorded messages.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Clears the text and the error flag.
    pub fn reset(&mut self) {
        self.text.clear();
        self.has_errors = false;
    }

    /// Posts every line to the process-wide diagnostics, prefixed with `context`.
    pub fn post(&self, context: &str) {
        let severity = if self.has_errors {
            Severity::Error
        } else {
            Severity::Info
        };
        for line in self.lines() {
            diagnostics::post(severity, &format!("{context}: {line}"));
        }
    }

    fn push_line(&mut self, message: &str) {
        for line in message.lines().filter(|l| !l.trim().is_empty()) {
            self.text.push_str(line.trim_end());
            self.text.push('\n');
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_sets_flag_and_info_does_not() {
        let mut report = Report::new();
        report.info("compiled vs_main");
        assert!(!report.has_errors());
        report.error("missing binding @group(0) @binding(1)");
        assert!(report.has_errors());
        assert_eq!(report.lines().count(), 2);
    }

    #[test]
    fn test_merge_keeps_error_flag_and_multiline_messages() {
        let mut a = Report::new();
        a.info("a");
        let b = Report::with_error("first\nsecond\n");
        a.merge(&b);
        assert!(a.has_errors());
        assert_eq!(a.to_string(), "a\nfirst\nsecond");
        a.reset();
        assert!(a.is_empty());
        assert!(!a.has_errors());
    }
}
