//! # Discontinuity Signaling
//!
//! Sentinel bursts that wake blocked decoder workers.
//!
//! A burst never sets the termination flag and never removes data: the
//! consumer simply sees a run of empty units, which the standard decode loop
//! reports through [`Decoder::on_discontinuity`](crate::decoder::Decoder::on_discontinuity).
//! Shutdown uses the same burst after setting termination.

use crate::fifo::DecoderFifo;
use crate::manager::DecoderManager;
use crate::registry::RegisteredStream;
use crate::stream::{ElementaryStream, StreamCategory};
use crate::unit::EncodedUnit;
use tracing::{debug, trace};

/// Push `count` sentinel units into the Fifo.
pub fn inject_wake_burst(fifo: &DecoderFifo, count: usize) {
    trace!(stream = %fifo.info().id, count, "Injecting sentinel burst");
    for _ in 0..count {
        fifo.enqueue(EncodedUnit::sentinel());
    }
}

impl DecoderManager {
    /// Wake the stream's consumer after a seek or flush.
    ///
    /// Returns `false` if the stream has no active decoder.
    pub fn discontinuity(&self, es: &ElementaryStream) -> bool {
        match es.fifo() {
            Some(fifo) => {
                debug!(stream = %es.id(), "Stream discontinuity");
                inject_wake_burst(fifo, self.config().padding_units);
                true
            }
            None => false,
        }
    }

    /// Wake every active audio decoder.
    ///
    /// Returns the number of streams signalled.
    pub fn discontinuity_audio_only(&self) -> usize {
        self.broadcast(|stream| stream.category == StreamCategory::Audio)
    }

    /// Wake every active decoder.
    ///
    /// Returns the number of streams signalled.
    pub fn discontinuity_all(&self) -> usize {
        self.broadcast(|_| true)
    }

    fn broadcast(&self, filter: impl Fn(&RegisteredStream) -> bool) -> usize {
        let padding = self.config().padding_units;
        let streams = self.registry().selected();

        let mut signalled = 0;
        for stream in streams.iter().filter(|s| filter(s)) {
            inject_wake_burst(&stream.fifo, padding);
            signalled += 1;
        }

        debug!(signalled, "Discontinuity broadcast");
        signalled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fourcc::FourCc;
    use crate::stream::{StreamId, StreamInfo};

    #[test]
    fn test_burst_adds_sentinels_only() {
        let info = StreamInfo {
            id: StreamId(8),
            fourcc: FourCc::new(*b"mpga"),
            category: StreamCategory::Audio,
            extradata: None,
        };
        let fifo = DecoderFifo::new(info, 0).unwrap();
        fifo.enqueue(EncodedUnit::new(vec![1u8, 2, 3]));

        inject_wake_burst(&fifo, 10);

        let stats = fifo.stats();
        assert_eq!(stats.depth, 11);
        assert_eq!(stats.sentinels, 10);
        assert!(!fifo.is_terminated());

        let first = fifo.try_dequeue().unwrap();
        assert_eq!(first.payload().as_ref(), &[1u8, 2, 3]);
        while let Some(unit) = fifo.try_dequeue() {
            assert!(unit.is_sentinel());
            assert!(unit.is_empty());
        }
    }
}
