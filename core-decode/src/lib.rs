//! # Decoder Orchestration
//!
//! Runs one decoder worker thread per active elementary stream and feeds it
//! from a per-stream queue of encoded units.
//!
//! ## Overview
//!
//! This crate handles:
//! - The per-stream [`DecoderFifo`] between the demuxer and a decoder worker
//! - Resolving a decoder module for a stream's fourcc
//! - Starting and stopping worker threads ([`DecoderManager`])
//! - Waking blocked workers with sentinel bursts on seek, flush and shutdown
//!
//! Codec implementations plug in through [`DecoderFactory`] and [`Decoder`];
//! nothing in this crate decodes media itself.
//!
//! ## Example
//!
//! ```rust
//! use core_decode::{
//!     CodecDescriptor, Decoder, DecoderConfig, DecoderFactory, DecoderManager, DecoderModule,
//!     DecoderResolver, ElementaryStream, EncodedUnit, FourCc, Result, SelectedStreams,
//!     StreamCategory, StreamId, StreamInfo,
//! };
//! use std::sync::Arc;
//!
//! struct Discard;
//!
//! impl Decoder for Discard {
//!     fn decode(&mut self, _unit: EncodedUnit) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! struct DiscardFactory;
//!
//! impl DecoderFactory for DiscardFactory {
//!     fn create(&self, _stream: &StreamInfo, _codec: &CodecDescriptor) -> Result<Box<dyn Decoder>> {
//!         Ok(Box::new(Discard))
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let resolver = Arc::new(DecoderResolver::new());
//! resolver.register(DecoderModule::with_codec_table("discard", 0, DiscardFactory));
//!
//! let manager = DecoderManager::new(
//!     resolver,
//!     Arc::new(SelectedStreams::new()),
//!     DecoderConfig::default(),
//! )?;
//!
//! let mut es = ElementaryStream::new(StreamId(0xe0), FourCc::new(*b"XVID"), StreamCategory::Video);
//! manager.activate(&mut es)?;
//! es.enqueue(EncodedUnit::new(vec![0u8; 188]))?;
//!
//! let report = manager.deactivate(&mut es);
//! assert!(report.was_active);
//! # Ok(())
//! # }
//! ```

pub mod codec_table;
pub mod config;
pub mod decoder;
pub mod discontinuity;
pub mod error;
pub mod fifo;
pub mod fourcc;
pub mod manager;
pub mod reader;
pub mod registry;
pub mod resolver;
pub mod stream;
pub mod unit;

pub use codec_table::{CodecDescriptor, CodecId};
pub use config::DecoderConfig;
pub use decoder::{Decoder, DecoderFactory};
pub use error::{DecodeError, Result};
pub use fifo::{DecoderFifo, Dequeued, FifoStats};
pub use fourcc::FourCc;
pub use manager::{DeactivationReport, DecoderManager, WorkerExit};
pub use reader::FifoReader;
pub use registry::{RegisteredStream, SelectedStreams, StreamRegistry};
pub use resolver::{DecoderBinding, DecoderModule, DecoderResolver};
pub use stream::{DecoderState, ElementaryStream, StreamCategory, StreamId, StreamInfo};
pub use unit::EncodedUnit;
