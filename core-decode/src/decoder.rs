//! # Decoder Interface
//!
//! Contract between the orchestration layer and codec implementations.
//!
//! A [`DecoderFactory`] is owned by a registered module and builds one
//! [`Decoder`] per activated stream. The decoder instance is created on the
//! worker thread and never leaves it.
//!
//! The default [`Decoder::run`] drives [`run_decode_loop`], which handles the
//! termination and sentinel protocol. Decoders that pull their input through
//! a [`FifoReader`](crate::reader::FifoReader) override `run` instead.

use crate::codec_table::CodecDescriptor;
use crate::error::Result;
use crate::fifo::{DecoderFifo, Dequeued};
use crate::stream::StreamInfo;
use crate::unit::EncodedUnit;
use tracing::{debug, trace, warn};

/// A per-stream decoder instance.
pub trait Decoder: Send {
    /// Decode one data unit. Sentinels are never passed here by the default
    /// loop.
    fn decode(&mut self, unit: EncodedUnit) -> Result<()>;

    /// Called for each sentinel observed while the stream is still running.
    fn on_discontinuity(&mut self) {}

    /// Consume the Fifo until termination.
    fn run(&mut self, fifo: &DecoderFifo) -> Result<()> {
        run_decode_loop(self, fifo)
    }
}

/// Builds decoder instances for a module.
pub trait DecoderFactory: Send + Sync {
    fn create(&self, stream: &StreamInfo, codec: &CodecDescriptor) -> Result<Box<dyn Decoder>>;
}

/// Standard consumer loop.
///
/// Returns `Ok(())` once termination is observed. Units still popped after
/// termination are dropped undelivered. On a decode error the Fifo's error
/// flag is set and the loop keeps consuming without decoding until
/// termination, so the producer side never observes a stalled queue.
pub fn run_decode_loop<D: Decoder + ?Sized>(decoder: &mut D, fifo: &DecoderFifo) -> Result<()> {
    let stream = fifo.info().id;
    let mut decoded = 0u64;

    loop {
        let unit = match fifo.wait_and_dequeue() {
            Dequeued::Terminated => break,
            Dequeued::Unit(_) if fifo.is_terminated() => break,
            Dequeued::Unit(unit) => unit,
        };

        if unit.is_sentinel() {
            trace!(%stream, "Discontinuity sentinel");
            decoder.on_discontinuity();
            continue;
        }

        if let Err(e) = decoder.decode(unit) {
            warn!(%stream, error = %e, "Decoder failed, discarding remaining input");
            fifo.set_error();
            let discarded = discard_until_terminated(fifo);
            debug!(%stream, decoded, discarded, "Decoder loop stopped on error");
            return Err(e);
        }
        decoded += 1;
    }

    debug!(%stream, decoded, "Decoder loop finished");
    Ok(())
}

/// Pop and free units until termination is observed.
///
/// Returns the number of units discarded.
pub fn discard_until_terminated(fifo: &DecoderFifo) -> usize {
    let mut discarded = 0;
    loop {
        match fifo.wait_and_dequeue() {
            Dequeued::Terminated => return discarded,
            Dequeued::Unit(_) => {
                discarded += 1;
                if fifo.is_terminated() {
                    return discarded;
                }
            }
        }
    }
}
