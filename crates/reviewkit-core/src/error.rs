// Copyright 2025 Fernando Borretti
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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

/// Broad classification of an error, so callers can decide how to react
/// (e.g. retry the whole rating on a concurrent modification).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A quality value outside the recognized levels.
    InvalidQuality,
    /// The persistence layer does not know the item.
    UnknownItem,
    /// The persistence layer does not know the learner.
    UnknownLearner,
    /// The stored state changed between read and write.
    ConcurrentModification,
    /// Any other failure of the persistence layer.
    Storage,
    /// Invalid or unreadable configuration.
    Config,
    Other,
}

#[derive(Debug, PartialEq)]
pub struct ErrorReport {
    kind: ErrorKind,
    message: String,
}

impl ErrorReport {
    pub fn new(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Other, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: impl Into<String>) -> Self {
        ErrorReport {
            kind,
            message: msg.into(),
        }
    }

    pub fn invalid_quality(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::InvalidQuality, msg)
    }

    pub fn concurrent_modification(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::ConcurrentModification, msg)
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Storage, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the caller should re-read, recompute, and re-write.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::ConcurrentModification
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport::new(format!("I/O error: {value:#?}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport::new(format!("JSON error: {value:#?}"))
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(msg: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ErrorReport::invalid_quality("invalid quality: 7");
        assert_eq!(err.to_string(), "error: invalid quality: 7");
        assert_eq!(err.kind(), ErrorKind::InvalidQuality);
    }

    #[test]
    fn test_only_concurrent_modification_is_retryable() {
        assert!(ErrorReport::concurrent_modification("stale").is_retryable());
        assert!(!ErrorReport::storage("disk full").is_retryable());
        assert!(!ErrorReport::new("oops").is_retryable());
    }

    #[test]
    fn test_fail() {
        let result: Fallible<()> = fail("nope");
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(err.message(), "nope");
    }
}
