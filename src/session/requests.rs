//! Correlation of asynchronous buffer / export replies.
//!
//! Every request gets a [`RequestId`] before its command is sent.  The
//! callback is parked in [`PendingRequests`] under that id and the worker
//! echoes the id back with its reply, so overlapping requests resolve to
//! the right caller whatever order they complete in.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use super::recorder::RecorderError;
use crate::audio::ChannelBuffers;
use crate::wav::WavBlob;

/// Identifier handed out for each buffer or export request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receives the merged per-channel buffers.
pub type BufferCallback = Box<dyn FnOnce(ChannelBuffers) + Send>;

/// Receives the encoded WAV, or the reason encoding failed.
pub type WavCallback = Box<dyn FnOnce(Result<WavBlob, RecorderError>) + Send>;

pub(crate) enum Pending {
    Buffer(BufferCallback),
    Wav(WavCallback),
}

#[derive(Debug)]
pub(crate) enum Reply {
    Buffer(ChannelBuffers),
    Wav(Result<WavBlob, RecorderError>),
}

#[derive(Debug)]
pub(crate) struct Response {
    pub id: RequestId,
    pub reply: Reply,
}

// ---------------------------------------------------------------------------
// PendingRequests
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct PendingRequests {
    next_id: AtomicU64,
    waiting: Mutex<HashMap<RequestId, Pending>>,
}

impl PendingRequests {
    pub fn register(&self, pending: Pending) -> RequestId {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, pending);
        id
    }

    /// Forget a request whose command never reached the worker.
    pub fn cancel(&self, id: RequestId) -> bool {
        self.waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Hand `response` to the callback registered under its id.
    pub fn resolve(&self, response: Response) {
        let pending = self
            .waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&response.id);

        match (pending, response.reply) {
            (Some(Pending::Buffer(cb)), Reply::Buffer(buffers)) => cb(buffers),
            (Some(Pending::Wav(cb)), Reply::Wav(result)) => cb(result),
            (Some(_), _) => {
                log::warn!("requests: reply kind does not match request {}", response.id);
            }
            (None, _) => {
                log::warn!("requests: reply for unknown request {}", response.id);
            }
        }
    }
}

/// Resolve replies until the worker's response channel closes.
pub(crate) async fn dispatch(
    pending: std::sync::Arc<PendingRequests>,
    mut responses: mpsc::UnboundedReceiver<Response>,
) {
    while let Some(response) = responses.recv().await {
        pending.resolve(response);
    }
    log::debug!("requests: response channel closed, {} request(s) unanswered", pending.len());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
