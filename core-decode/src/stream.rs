//! # Elementary Stream Descriptor
//!
//! The pipeline-owned description of one audio, video or subtitle stream.
//! The orchestration layer only touches the decoder-related fields: the bound
//! Fifo, the decoder binding, the pending unit and the lifecycle state.

use crate::error::{DecodeError, Result};
use crate::fifo::DecoderFifo;
use crate::fourcc::FourCc;
use crate::manager::ActiveDecoder;
use crate::unit::EncodedUnit;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stream identifier assigned by the demuxer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamId(pub u32);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Category of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamCategory {
    Audio,
    Video,
    Subtitle,
}

/// Per-stream decoder lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// No decoder has been started (or the last activation failed).
    Uninitialized,
    /// Looking up a decoder module for the stream's format.
    Resolving,
    /// Worker thread is running and accepting units.
    Running,
    /// Termination requested, waiting for the worker to exit.
    Draining,
    /// Worker exited and all resources were released.
    Terminated,
}

impl DecoderState {
    /// Returns `true` if a Fifo and binding exist for the stream.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Draining)
    }
}

/// Stream identity handed to the Fifo and to decoder factories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub id: StreamId,
    pub fourcc: FourCc,
    pub category: StreamCategory,
    /// Codec-specific data supplied by the demuxer, passed through untouched.
    pub extradata: Option<Bytes>,
}

/// An elementary stream as seen by the decoder orchestration layer.
pub struct ElementaryStream {
    info: StreamInfo,
    state: DecoderState,
    pending: Option<EncodedUnit>,
    pub(crate) decoder: Option<ActiveDecoder>,
}

impl ElementaryStream {
    pub fn new(id: StreamId, fourcc: FourCc, category: StreamCategory) -> Self {
        Self {
            info: StreamInfo {
                id,
                fourcc,
                category,
                extradata: None,
            },
            state: DecoderState::Uninitialized,
            pending: None,
            decoder: None,
        }
    }

    /// Attach codec extradata from the container.
    pub fn with_extradata(mut self, extradata: impl Into<Bytes>) -> Self {
        self.info.extradata = Some(extradata.into());
        self
    }

    pub fn id(&self) -> StreamId {
        self.info.id
    }

    pub fn fourcc(&self) -> FourCc {
        self.info.fourcc
    }

    pub fn category(&self) -> StreamCategory {
        self.info.category
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: DecoderState) {
        self.state = state;
    }

    /// Returns `true` while a decoder Fifo is bound to the stream.
    pub fn is_active(&self) -> bool {
        self.decoder.is_some()
    }

    /// The bound Fifo, if the stream is active.
    ///
    /// The stream keeps sole ownership; the reference cannot outlive
    /// deactivation.
    pub fn fifo(&self) -> Option<&DecoderFifo> {
        self.decoder.as_ref().map(|active| active.fifo().as_ref())
    }

    /// Name of the bound decoder module, if the stream is active.
    pub fn decoder_name(&self) -> Option<&str> {
        self.decoder.as_ref().map(|active| active.module_name())
    }

    /// Name of the codec the bound decoder was resolved for.
    pub fn codec_name(&self) -> Option<&'static str> {
        self.decoder.as_ref().and_then(|active| active.codec_name())
    }

    /// Hand a unit to the stream's decoder.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::NotActive`] if no decoder is bound; the unit is
    /// dropped.
    pub fn enqueue(&self, unit: EncodedUnit) -> Result<()> {
        match self.fifo() {
            Some(fifo) => {
                fifo.enqueue(unit);
                Ok(())
            }
            None => Err(DecodeError::NotActive(self.info.id)),
        }
    }

    /// Park a unit that is still being assembled by the demuxer.
    ///
    /// Returns the previously pending unit, if any.
    pub fn set_pending(&mut self, unit: EncodedUnit) -> Option<EncodedUnit> {
        self.pending.replace(unit)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn take_pending(&mut self) -> Option<EncodedUnit> {
        self.pending.take()
    }

    /// Move the pending unit into the Fifo.
    ///
    /// Returns `Ok(false)` when nothing was pending.
    pub fn flush_pending(&mut self) -> Result<bool> {
        if self.decoder.is_none() {
            return Err(DecodeError::NotActive(self.info.id));
        }
        match self.pending.take() {
            Some(unit) => {
                self.enqueue(unit)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Drop for ElementaryStream {
    // Same ordering as deactivation: the pending unit reaches the Fifo
    // before the decoder's own drop stops the worker.
    fn drop(&mut self) {
        if let (Some(active), Some(unit)) = (self.decoder.as_ref(), self.pending.take()) {
            active.fifo().request_termination();
            active.fifo().enqueue(unit);
        }
    }
}

impl fmt::Debug for ElementaryStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementaryStream")
            .field("id", &self.info.id)
            .field("fourcc", &self.info.fourcc.to_string())
            .field("category", &self.info.category)
            .field("state", &self.state)
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}
