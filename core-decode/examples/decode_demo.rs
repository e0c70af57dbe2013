//! Decoder orchestration demonstration
//!
//! Starts a video and an audio decoder, feeds them units, signals a seek and
//! tears both down.
//!
//! Run with:
//! ```bash
//! cargo run -p core-decode --example decode_demo
//!
//! # JSON output
//! cargo run -p core-decode --example decode_demo -- json
//! ```

use core_decode::{
    codec_table, CodecDescriptor, CodecId, Decoder, DecoderConfig, DecoderFactory, DecoderManager,
    DecoderModule, DecoderResolver, ElementaryStream, EncodedUnit, FourCc, Result,
    SelectedStreams, StreamCategory, StreamId, StreamInfo,
};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Counts bytes instead of producing pictures or samples.
struct ByteCounter {
    codec: &'static str,
    units: u64,
    bytes: u64,
}

impl Decoder for ByteCounter {
    fn decode(&mut self, unit: EncodedUnit) -> Result<()> {
        self.units += 1;
        self.bytes += unit.len() as u64;
        info!(codec = self.codec, pts = ?unit.pts(), size = unit.len(), "Decoded unit");
        Ok(())
    }

    fn on_discontinuity(&mut self) {
        info!(codec = self.codec, units = self.units, bytes = self.bytes, "Discontinuity");
    }
}

struct ByteCounterFactory;

impl DecoderFactory for ByteCounterFactory {
    fn create(&self, stream: &StreamInfo, codec: &CodecDescriptor) -> Result<Box<dyn Decoder>> {
        info!(stream = %stream.id, codec = codec.name, "Creating decoder");
        Ok(Box::new(ByteCounter {
            codec: codec.name,
            units: 0,
            bytes: 0,
        }))
    }
}

fn probe_any(fourcc: FourCc) -> Option<CodecDescriptor> {
    Some(codec_table::lookup(fourcc).unwrap_or(CodecDescriptor::new(CodecId::Other(fourcc), "pcm")))
}

fn main() -> Result<()> {
    let format = match env::args().nth(1).as_deref() {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };

    let logging = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug);
    if let Err(e) = init_logging(logging) {
        eprintln!("logging disabled: {}", e);
    }

    let resolver = Arc::new(DecoderResolver::new());
    resolver.register(DecoderModule::new("counter", 10, probe_any, ByteCounterFactory));

    let registry = Arc::new(SelectedStreams::new());
    let manager = DecoderManager::new(resolver, registry.clone(), DecoderConfig::default())?;

    let mut video = ElementaryStream::new(StreamId(0xe0), FourCc::new(*b"XVID"), StreamCategory::Video);
    let mut sound = ElementaryStream::new(StreamId(0xc0), FourCc::new(*b"mpga"), StreamCategory::Audio);
    let mut unknown = ElementaryStream::new(StreamId(0x20), FourCc::new(*b"WMV3"), StreamCategory::Video)
        .with_extradata(vec![0u8; 4]);

    manager.activate(&mut video)?;
    manager.activate(&mut sound)?;

    // The counter module accepts everything; restrict to the table to see a refusal.
    let strict = DecoderManager::new(
        {
            let resolver = Arc::new(DecoderResolver::new());
            resolver.register(DecoderModule::with_codec_table("strict", 0, ByteCounterFactory));
            resolver
        },
        Arc::new(SelectedStreams::new()),
        DecoderConfig::default(),
    )?;
    if let Err(e) = strict.activate(&mut unknown) {
        warn!(error = %e, "Stream left undecoded");
    }

    for pts in 0..5i64 {
        video.enqueue(EncodedUnit::new(vec![0u8; 1024]).with_pts(pts * 40))?;
        sound.enqueue(EncodedUnit::new(vec![0u8; 384]).with_pts(pts * 24))?;
    }
    thread::sleep(Duration::from_millis(50));

    info!(signalled = manager.discontinuity_audio_only(), "Seek");
    sound.set_pending(EncodedUnit::new(vec![0u8; 100]).with_discontinuity(true));

    for es in [&mut video, &mut sound] {
        let report = manager.deactivate(es);
        info!(
            stream = %report.stream_id,
            drained = report.drained,
            exit = ?report.worker_exit,
            stats = ?report.stats,
            "Stream stopped"
        );
    }

    info!(remaining = registry.len(), "Done");
    Ok(())
}
