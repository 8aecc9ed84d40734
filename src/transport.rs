//! Submission transport seam.
//!
//! The editor only needs "send this collection, tell me if it worked". The
//! HTTP client lives outside this crate; this module defines the trait it
//! implements plus a file-backed sink used by the replay tool.

use std::path::{Path, PathBuf};

use crate::format::Submission;

/// Errors reported by a submission sink.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// I/O error while writing the payload
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be serialized
    #[error("Failed to serialize submission: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Receiver refused the submission
    #[error("Submission rejected: {message}")]
    Rejected {
        /// Reason given by the receiver
        message: String,
    },
}

/// Receiver of finished submissions.
pub trait SubmissionSink {
    /// Deliver one submission.
    fn send(&mut self, submission: &Submission) -> Result<(), TransportError>;
}

/// Writes each submission as pretty-printed JSON to a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SubmissionSink for JsonFileSink {
    fn send(&mut self, submission: &Submission) -> Result<(), TransportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(submission)?;
        std::fs::write(&self.path, json)?;
        log::info!(
            "Wrote submission with {} predictions to {:?}",
            submission.prediction_count(),
            self.path
        );
        Ok(())
    }
}

/// Keeps submissions in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub sent: Vec<Submission>,
    /// When set, every send fails with this message.
    pub reject_with: Option<String>,
}

impl SubmissionSink for MemorySink {
    fn send(&mut self, submission: &Submission) -> Result<(), TransportError> {
        if let Some(message) = &self.reject_with {
            return Err(TransportError::Rejected {
                message: message.clone(),
            });
        }
        self.sent.push(submission.clone());
        Ok(())
    }
}
