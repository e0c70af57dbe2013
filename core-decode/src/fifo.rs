//! # Decoder Fifo
//!
//! Ordered, synchronized queue of encoded units between one demuxer
//! (producer) and one decoder worker (consumer).
//!
//! ## Design
//!
//! - **Storage**: an owned `VecDeque`, O(1) at both ends, no bound on depth
//! - **Locking**: one `parking_lot::Mutex` + `Condvar` pair per Fifo; payloads
//!   are processed outside the lock
//! - **Termination**: a `CancellationToken` that, once cancelled, stays
//!   cancelled for the lifetime of the Fifo
//!
//! ## Usage
//!
//! ```rust
//! use core_decode::{DecoderFifo, Dequeued, EncodedUnit, FourCc, StreamCategory, StreamId, StreamInfo};
//!
//! let info = StreamInfo {
//!     id: StreamId(1),
//!     fourcc: FourCc::new(*b"h263"),
//!     category: StreamCategory::Video,
//!     extradata: None,
//! };
//! let fifo = DecoderFifo::new(info, 16).unwrap();
//!
//! fifo.enqueue(EncodedUnit::new(vec![0u8; 32]));
//! assert_eq!(fifo.depth(), 1);
//!
//! match fifo.wait_and_dequeue() {
//!     Dequeued::Unit(unit) => assert_eq!(unit.len(), 32),
//!     Dequeued::Terminated => unreachable!(),
//! }
//! ```

use crate::error::{DecodeError, Result};
use crate::stream::StreamInfo;
use crate::unit::EncodedUnit;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcome of a blocking dequeue.
#[derive(Debug)]
pub enum Dequeued {
    /// The head unit (data or sentinel).
    Unit(EncodedUnit),
    /// Termination was requested and the queue is empty.
    Terminated,
}

/// Snapshot of a Fifo's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FifoStats {
    /// Units currently queued.
    pub depth: usize,
    /// Total units linked by the producer (sentinels included).
    pub enqueued: u64,
    /// Total units handed to the consumer.
    pub dequeued: u64,
    /// Total units freed without delivery.
    pub drained: u64,
    /// Total sentinel units linked.
    pub sentinels: u64,
}

struct FifoState {
    units: VecDeque<EncodedUnit>,
    error: bool,
}

/// Per-stream queue of encoded units.
pub struct DecoderFifo {
    info: StreamInfo,
    state: Mutex<FifoState>,
    data_wait: Condvar,
    termination: CancellationToken,
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    drained: AtomicU64,
    sentinels: AtomicU64,
}

impl DecoderFifo {
    /// Create a Fifo for the given stream, reserving room for
    /// `initial_capacity` units.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::AllocationFailure`] if the reservation fails.
    pub fn new(info: StreamInfo, initial_capacity: usize) -> Result<Self> {
        let mut units = VecDeque::new();
        units.try_reserve(initial_capacity).map_err(|e| {
            DecodeError::AllocationFailure(format!(
                "could not create decoder fifo for stream {}: {}",
                info.id, e
            ))
        })?;

        Ok(Self {
            info,
            state: Mutex::new(FifoState {
                units,
                error: false,
            }),
            data_wait: Condvar::new(),
            termination: CancellationToken::new(),
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            drained: AtomicU64::new(0),
            sentinels: AtomicU64::new(0),
        })
    }

    /// Identity of the stream this Fifo feeds.
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// Append a unit at the tail and wake one waiting consumer.
    ///
    /// Never blocks beyond the short critical section and never rejects a
    /// unit, even after termination.
    pub fn enqueue(&self, unit: EncodedUnit) {
        let sentinel = unit.is_sentinel();

        let mut state = self.state.lock();
        state.units.push_back(unit);
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        if sentinel {
            self.sentinels.fetch_add(1, Ordering::Relaxed);
        }
        self.data_wait.notify_one();
    }

    /// Block until a unit is available or termination is requested.
    ///
    /// Queued units are returned before the termination signal, so callers
    /// must check [`is_terminated`](Self::is_terminated) after every wake.
    pub fn wait_and_dequeue(&self) -> Dequeued {
        let mut state = self.state.lock();
        loop {
            if let Some(unit) = state.units.pop_front() {
                self.dequeued.fetch_add(1, Ordering::Relaxed);
                return Dequeued::Unit(unit);
            }
            if self.termination.is_cancelled() {
                return Dequeued::Terminated;
            }
            self.data_wait.wait(&mut state);
        }
    }

    /// Pop the head unit without blocking.
    pub fn try_dequeue(&self) -> Option<EncodedUnit> {
        let unit = self.state.lock().units.pop_front();
        if unit.is_some() {
            self.dequeued.fetch_add(1, Ordering::Relaxed);
        }
        unit
    }

    /// Free every queued unit without delivering it.
    ///
    /// Returns the number of units freed.
    pub fn drain_all(&self) -> usize {
        let units = std::mem::take(&mut self.state.lock().units);
        let count = units.len();
        drop(units);

        self.drained.fetch_add(count as u64, Ordering::Relaxed);
        if count > 0 {
            debug!(stream = %self.info.id, count, "Drained undelivered units");
        }
        count
    }

    /// Set the termination flag and wake every waiting consumer.
    pub fn request_termination(&self) {
        self.termination.cancel();
        // Taking the lock orders the wake after any in-flight predicate check.
        let _state = self.state.lock();
        self.data_wait.notify_all();
    }

    pub fn is_terminated(&self) -> bool {
        self.termination.is_cancelled()
    }

    /// Token cancelled when termination is requested.
    pub fn termination_token(&self) -> CancellationToken {
        self.termination.clone()
    }

    /// Flag the stream as having failed to decode.
    pub fn set_error(&self) {
        self.state.lock().error = true;
    }

    pub fn has_error(&self) -> bool {
        self.state.lock().error
    }

    /// Number of queued units.
    pub fn depth(&self) -> usize {
        self.state.lock().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }

    /// Snapshot of the counters, taken under the queue lock.
    pub fn stats(&self) -> FifoStats {
        let state = self.state.lock();
        FifoStats {
            depth: state.units.len(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            sentinels: self.sentinels.load(Ordering::Relaxed),
        }
    }
}

impl Drop for DecoderFifo {
    fn drop(&mut self) {
        let remaining = self.state.get_mut().units.len();
        debug!(
            stream = %self.info.id,
            fourcc = %self.info.fourcc,
            remaining,
            "Releasing decoder fifo"
        );
    }
}

impl std::fmt::Debug for DecoderFifo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderFifo")
            .field("stream", &self.info.id)
            .field("depth", &self.depth())
            .field("terminated", &self.is_terminated())
            .finish()
    }
}
