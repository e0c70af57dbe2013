//! Byte-stream view over a decoder Fifo.
//!
//! Some decoders consume a continuous bitstream rather than discrete units.
//! [`FifoReader`] stitches unit payloads together behind `std::io::Read`, so
//! such a decoder blocks inside `read()` rather than in its own loop. The
//! sentinel burst injected on shutdown reaches it there: sentinels carry no
//! bytes, and once termination is observed the reader reports end-of-stream.

use crate::fifo::{DecoderFifo, Dequeued};
use bytes::{Buf, Bytes};
use std::io::{self, Read};

pub struct FifoReader<'a> {
    fifo: &'a DecoderFifo,
    current: Bytes,
    units_read: u64,
    finished: bool,
}

impl<'a> FifoReader<'a> {
    pub fn new(fifo: &'a DecoderFifo) -> Self {
        Self {
            fifo,
            current: Bytes::new(),
            units_read: 0,
            finished: false,
        }
    }

    /// Number of data units pulled from the Fifo so far.
    pub fn units_read(&self) -> u64 {
        self.units_read
    }

    /// Bytes of the current unit not yet returned by `read()`.
    pub fn buffered(&self) -> usize {
        self.current.len()
    }

    /// Returns `true` once termination has been observed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Pull the next non-empty payload. Returns `false` at end-of-stream.
    fn refill(&mut self) -> bool {
        while self.current.is_empty() {
            if self.finished {
                return false;
            }
            match self.fifo.wait_and_dequeue() {
                Dequeued::Terminated => {
                    self.finished = true;
                }
                Dequeued::Unit(_) if self.fifo.is_terminated() => {
                    self.finished = true;
                }
                Dequeued::Unit(unit) if unit.is_sentinel() => {}
                Dequeued::Unit(unit) => {
                    self.units_read += 1;
                    self.current = unit.into_payload();
                }
            }
        }
        true
    }
}

impl Read for FifoReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || !self.refill() {
            return Ok(0);
        }

        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}
