//! # Decoder Capability Resolver
//!
//! Maps a stream's fourcc to a registered decoder module.
//!
//! ## Overview
//!
//! Modules are registered with a name, a score and a capability probe.
//! Resolution walks them in descending score order and binds the first one
//! whose probe accepts the fourcc. A preferred module name, when given, is
//! tried before the ranked walk.
//!
//! A successful resolution returns a [`DecoderBinding`]. The binding holds a
//! use count on its module that is released when the binding is dropped, so
//! a module can tell how many streams are currently decoding with it.
//!
//! ```rust
//! use core_decode::resolver::{DecoderModule, DecoderResolver};
//! # use core_decode::{CodecDescriptor, Decoder, DecoderFactory, EncodedUnit, StreamInfo, Result};
//! # struct Null;
//! # impl Decoder for Null { fn decode(&mut self, _u: EncodedUnit) -> Result<()> { Ok(()) } }
//! # struct NullFactory;
//! # impl DecoderFactory for NullFactory {
//! #     fn create(&self, _s: &StreamInfo, _c: &CodecDescriptor) -> Result<Box<dyn Decoder>> { Ok(Box::new(Null)) }
//! # }
//!
//! let resolver = DecoderResolver::new();
//! resolver.register(DecoderModule::with_codec_table("ffmpeg", 70, NullFactory));
//!
//! let binding = resolver.resolve("XVID".parse().unwrap()).unwrap();
//! assert_eq!(binding.name(), "MPEG-4");
//! assert_eq!(binding.module_name(), "ffmpeg");
//! ```

use crate::codec_table::{self, CodecDescriptor};
use crate::config::NO_DECODER;
use crate::decoder::{Decoder, DecoderFactory};
use crate::error::{DecodeError, Result};
use crate::fourcc::FourCc;
use crate::stream::StreamInfo;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

type CapabilityProbe = dyn Fn(FourCc) -> Option<CodecDescriptor> + Send + Sync;

/// A registered decoder implementation.
pub struct DecoderModule {
    name: String,
    score: i32,
    probe: Box<CapabilityProbe>,
    factory: Box<dyn DecoderFactory>,
    bindings: AtomicUsize,
}

impl DecoderModule {
    /// Create a module with a custom capability probe.
    pub fn new<P, F>(name: impl Into<String>, score: i32, probe: P, factory: F) -> Self
    where
        P: Fn(FourCc) -> Option<CodecDescriptor> + Send + Sync + 'static,
        F: DecoderFactory + 'static,
    {
        Self {
            name: name.into(),
            score,
            probe: Box::new(probe),
            factory: Box::new(factory),
            bindings: AtomicUsize::new(0),
        }
    }

    /// Create a module that accepts every fourcc in the built-in codec table.
    pub fn with_codec_table<F>(name: impl Into<String>, score: i32, factory: F) -> Self
    where
        F: DecoderFactory + 'static,
    {
        Self::new(name, score, codec_table::lookup, factory)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    /// Probe whether this module can decode the fourcc.
    pub fn probe(&self, fourcc: FourCc) -> Option<CodecDescriptor> {
        (self.probe)(fourcc)
    }

    /// Number of live bindings on this module.
    pub fn active_bindings(&self) -> usize {
        self.bindings.load(Ordering::Acquire)
    }

    /// Instantiate a decoder for a stream.
    pub fn create_decoder(
        &self,
        stream: &StreamInfo,
        codec: &CodecDescriptor,
    ) -> Result<Box<dyn Decoder>> {
        self.factory.create(stream, codec)
    }
}

impl fmt::Debug for DecoderModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderModule")
            .field("name", &self.name)
            .field("score", &self.score)
            .field("bindings", &self.active_bindings())
            .finish()
    }
}

/// A module bound to one stream's codec.
///
/// Dropping the binding releases the module use count exactly once.
pub struct DecoderBinding {
    module: Arc<DecoderModule>,
    codec: CodecDescriptor,
}

impl DecoderBinding {
    fn acquire(module: Arc<DecoderModule>, codec: CodecDescriptor) -> Self {
        module.bindings.fetch_add(1, Ordering::AcqRel);
        debug!(module = %module.name, codec = codec.name, "Bound decoder module");
        Self { module, codec }
    }

    /// Human-readable codec name (e.g. `"H263"`).
    pub fn name(&self) -> &'static str {
        self.codec.name
    }

    pub fn module_name(&self) -> &str {
        &self.module.name
    }

    pub fn codec(&self) -> &CodecDescriptor {
        &self.codec
    }

    pub fn module(&self) -> &Arc<DecoderModule> {
        &self.module
    }

    /// Release the binding. Equivalent to dropping it.
    pub fn release(self) {}
}

impl Drop for DecoderBinding {
    fn drop(&mut self) {
        self.module.bindings.fetch_sub(1, Ordering::AcqRel);
        debug!(module = %self.module.name, codec = self.codec.name, "Released decoder module");
    }
}

impl fmt::Debug for DecoderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderBinding")
            .field("module", &self.module.name)
            .field("codec", &self.codec.name)
            .finish()
    }
}

/// Registry of decoder modules with ranked lookup.
#[derive(Default)]
pub struct DecoderResolver {
    modules: RwLock<Vec<Arc<DecoderModule>>>,
}

impl DecoderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Higher scores are tried first; equal scores keep
    /// registration order.
    pub fn register(&self, module: DecoderModule) -> Arc<DecoderModule> {
        let module = Arc::new(module);
        let mut modules = self.modules.write();
        let position = modules
            .iter()
            .position(|existing| existing.score < module.score)
            .unwrap_or(modules.len());
        modules.insert(position, Arc::clone(&module));
        debug!(module = %module.name, score = module.score, "Registered decoder module");
        module
    }

    /// Look up a module by name.
    pub fn module(&self, name: &str) -> Option<Arc<DecoderModule>> {
        self.modules
            .read()
            .iter()
            .find(|module| module.name == name)
            .cloned()
    }

    /// Registered module names in resolution order.
    pub fn module_names(&self) -> Vec<String> {
        self.modules
            .read()
            .iter()
            .map(|module| module.name.clone())
            .collect()
    }

    /// Resolve a fourcc using score order only.
    pub fn resolve(&self, fourcc: FourCc) -> Result<DecoderBinding> {
        self.resolve_with_preference(fourcc, None)
    }

    /// Resolve a fourcc, trying `preferred` first.
    ///
    /// A preferred module that is unknown or cannot decode the fourcc is
    /// skipped with a warning. `"none"` disables decoding altogether.
    pub fn resolve_with_preference(
        &self,
        fourcc: FourCc,
        preferred: Option<&str>,
    ) -> Result<DecoderBinding> {
        if preferred == Some(NO_DECODER) {
            debug!(%fourcc, "Decoding disabled by preference");
            return Err(DecodeError::NoSuitableDecoder(fourcc));
        }

        let modules = self.modules.read();

        if let Some(name) = preferred {
            match modules.iter().find(|module| module.name == name) {
                Some(module) => {
                    if let Some(codec) = module.probe(fourcc) {
                        return Ok(DecoderBinding::acquire(Arc::clone(module), codec));
                    }
                    warn!(module = name, %fourcc, "Preferred decoder cannot handle format, falling back");
                }
                None => warn!(module = name, "Preferred decoder is not registered"),
            }
        }

        modules
            .iter()
            .filter(|module| Some(module.name.as_str()) != preferred)
            .find_map(|module| module.probe(fourcc).map(|codec| (module, codec)))
            .map(|(module, codec)| DecoderBinding::acquire(Arc::clone(module), codec))
            .ok_or(DecodeError::NoSuitableDecoder(fourcc))
    }
}

impl fmt::Debug for DecoderResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderResolver")
            .field("modules", &self.module_names())
            .finish()
    }
}
