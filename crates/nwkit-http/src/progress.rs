//! Transfer progress reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Size of the pieces an upload body is cut into.
const CHUNK_SIZE: usize = 64 * 1024;

/// Bytes transferred so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub completed: u64,
    /// Expected size, when known.
    pub total: Option<u64>,
}

impl Progress {
    /// Completed share in `0.0..=1.0`, if the total is known and non-zero.
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.completed as f64 / total as f64),
            _ => None,
        }
    }
}

/// Callback receiving progress updates.
pub type ProgressHandler = Arc<dyn Fn(Progress) + Send + Sync>;

/// Accumulates progress across one or more bodies of the same transfer.
#[derive(Clone)]
pub(crate) struct ProgressTracker {
    completed: Arc<AtomicU64>,
    total: Option<u64>,
    handler: Option<ProgressHandler>,
}

impl ProgressTracker {
    pub(crate) fn new(total: Option<u64>, handler: Option<ProgressHandler>) -> Self {
        Self {
            completed: Arc::new(AtomicU64::new(0)),
            total,
            handler,
        }
    }

    pub(crate) fn advance(&self, bytes: u64) -> Progress {
        let completed = self.completed.fetch_add(bytes, Ordering::SeqCst) + bytes;
        let progress = Progress {
            completed,
            total: self.total,
        };
        if let Some(handler) = &self.handler {
            handler(progress);
        }
        progress
    }

    /// A request body read from `file` in chunks, each reported as the
    /// transport pulls it.
    pub(crate) fn file_body(&self, file: File) -> reqwest::Body {
        let tracker = self.clone();
        let stream = ReaderStream::with_capacity(file, CHUNK_SIZE).inspect(move |chunk| {
            if let Ok(chunk) = chunk {
                tracker.advance(chunk.len() as u64);
            }
        });
        reqwest::Body::wrap_stream(stream)
    }
}
