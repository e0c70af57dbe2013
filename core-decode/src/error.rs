//! # Decode Error Types
//!
//! Errors raised while activating, feeding and tearing down stream decoders.

use crate::fourcc::FourCc;
use crate::stream::StreamId;
use thiserror::Error;

/// Errors that can occur during decoder orchestration.
#[derive(Error, Debug)]
pub enum DecodeError {
    // ========================================================================
    // Activation Errors
    // ========================================================================
    /// No registered decoder module declares capability for the format.
    #[error("No suitable decoder for fourcc `{0}`")]
    NoSuitableDecoder(FourCc),

    /// The Fifo (or its backing storage) could not be allocated.
    #[error("Allocation failed: {0}")]
    AllocationFailure(String),

    /// The active-stream registry refused the stream.
    #[error("Stream registry error: {0}")]
    Registry(String),

    /// The decoder worker thread could not be started.
    #[error("Cannot spawn decoder thread \"{name}\": {source}")]
    ThreadSpawnFailure {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Activation was requested on a stream that already has a decoder.
    #[error("Stream {0} already has an active decoder")]
    AlreadyActive(StreamId),

    // ========================================================================
    // Producer Errors
    // ========================================================================
    /// A unit was offered to a stream without an active decoder.
    #[error("Stream {0} has no active decoder")]
    NotActive(StreamId),

    // ========================================================================
    // Decoder Errors
    // ========================================================================
    /// Decoder implementation failed on a unit payload.
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Decoder implementation could not be instantiated for the stream.
    #[error("Decoder initialization failed: {0}")]
    DecoderInit(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration was rejected by validation or could not be parsed.
    #[error("Invalid decoder configuration: {0}")]
    Config(String),
}

impl DecodeError {
    /// Returns `true` if this error aborted a stream activation.
    pub fn is_activation_error(&self) -> bool {
        matches!(
            self,
            DecodeError::NoSuitableDecoder(_)
                | DecodeError::AllocationFailure(_)
                | DecodeError::Registry(_)
                | DecodeError::ThreadSpawnFailure { .. }
                | DecodeError::AlreadyActive(_)
        )
    }

    /// Returns `true` if the failure happened while resolving a decoder module.
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, DecodeError::NoSuitableDecoder(_))
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Config(err.to_string())
    }
}

/// Result type for decode orchestration.
pub type Result<T> = std::result::Result<T, DecodeError>;
