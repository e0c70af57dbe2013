//! # Selected-Stream Registry
//!
//! The set of streams whose decoders are currently active. Discontinuity
//! broadcasts walk this set, and the host is told through
//! [`StreamRegistry::mark_changed`] whenever it changes.
//!
//! The registry stores shared handles to each stream's Fifo rather than the
//! stream itself, so a broadcast can reach every active decoder without
//! borrowing the pipeline's stream descriptors.

use crate::error::{DecodeError, Result};
use crate::fifo::DecoderFifo;
use crate::fourcc::FourCc;
use crate::stream::{StreamCategory, StreamId};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// Registry entry for an active stream.
#[derive(Debug, Clone)]
pub struct RegisteredStream {
    pub id: StreamId,
    pub category: StreamCategory,
    pub fourcc: FourCc,
    pub fifo: Arc<DecoderFifo>,
}

impl RegisteredStream {
    /// Build an entry from a Fifo's stream identity.
    pub fn from_fifo(fifo: Arc<DecoderFifo>) -> Self {
        let info = fifo.info();
        Self {
            id: info.id,
            category: info.category,
            fourcc: info.fourcc,
            fifo,
        }
    }
}

/// Host-side record of active streams.
///
/// Implementations must be callable from any thread.
pub trait StreamRegistry: Send + Sync {
    /// Add an active stream.
    ///
    /// # Errors
    ///
    /// Fails if the stream cannot be recorded; activation is rolled back.
    fn register(&self, stream: RegisteredStream) -> Result<()>;

    /// Remove a stream, returning its entry if it was present.
    fn unregister(&self, id: StreamId) -> Option<RegisteredStream>;

    /// Snapshot of the active streams.
    fn selected(&self) -> Vec<RegisteredStream>;

    /// Notify the host that the active set changed.
    fn mark_changed(&self) {}
}

#[derive(Default)]
struct SelectedState {
    streams: Vec<RegisteredStream>,
    changed: bool,
}

/// In-process [`StreamRegistry`].
#[derive(Default)]
pub struct SelectedStreams {
    state: Mutex<SelectedState>,
    capacity_limit: Option<usize>,
}

impl SelectedStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse registrations beyond `limit` streams.
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            state: Mutex::default(),
            capacity_limit: Some(limit),
        }
    }

    pub fn contains(&self, id: StreamId) -> bool {
        self.state.lock().streams.iter().any(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the active streams in registration order.
    pub fn ids(&self) -> Vec<StreamId> {
        self.state.lock().streams.iter().map(|s| s.id).collect()
    }

    /// Returns and clears the changed flag.
    pub fn take_changed(&self) -> bool {
        std::mem::take(&mut self.state.lock().changed)
    }
}

impl StreamRegistry for SelectedStreams {
    fn register(&self, stream: RegisteredStream) -> Result<()> {
        let mut state = self.state.lock();

        if state.streams.iter().any(|s| s.id == stream.id) {
            return Err(DecodeError::Registry(format!(
                "stream {} is already selected",
                stream.id
            )));
        }

        if let Some(limit) = self.capacity_limit {
            if state.streams.len() >= limit {
                return Err(DecodeError::Registry(format!(
                    "cannot select stream {}: limit of {} active streams reached",
                    stream.id, limit
                )));
            }
        }

        state.streams.try_reserve(1).map_err(|e| {
            DecodeError::AllocationFailure(format!(
                "cannot grow selected-stream set for stream {}: {}",
                stream.id, e
            ))
        })?;

        debug!(stream = %stream.id, category = ?stream.category, "Stream selected");
        state.streams.push(stream);
        Ok(())
    }

    fn unregister(&self, id: StreamId) -> Option<RegisteredStream> {
        let mut state = self.state.lock();
        let index = state.streams.iter().position(|s| s.id == id)?;
        debug!(stream = %id, "Stream deselected");
        Some(state.streams.remove(index))
    }

    fn selected(&self) -> Vec<RegisteredStream> {
        self.state.lock().streams.clone()
    }

    fn mark_changed(&self) {
        trace!("Selected streams changed");
        self.state.lock().changed = true;
    }
}

impl std::fmt::Debug for SelectedStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedStreams")
            .field("streams", &self.ids())
            .field("capacity_limit", &self.capacity_limit)
            .finish()
    }
}
