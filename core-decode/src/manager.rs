//! # Decoder Manager
//!
//! Activation and teardown of per-stream decoder workers.
//!
//! ## Activation
//!
//! 1. Resolve a decoder module for the stream's fourcc
//! 2. Create the stream's [`DecoderFifo`]
//! 3. Add the stream to the selected-stream registry
//! 4. Spawn the worker thread, which builds the decoder and runs it
//!
//! Any failure unwinds the steps already taken, so a failed activation
//! leaves no Fifo, no module use count and no registry entry behind.
//!
//! ## Deactivation
//!
//! Termination is requested first, then the pending unit is flushed and a
//! burst of sentinels is pushed to wake a worker blocked anywhere below its
//! own wait point. Only after the worker thread has been joined are
//! undelivered units drained and resources released.

use crate::codec_table::CodecDescriptor;
use crate::config::DecoderConfig;
use crate::decoder::discard_until_terminated;
use crate::discontinuity::inject_wake_burst;
use crate::error::{DecodeError, Result};
use crate::fifo::{DecoderFifo, FifoStats};
use crate::registry::{RegisteredStream, StreamRegistry};
use crate::resolver::{DecoderBinding, DecoderModule, DecoderResolver};
use crate::stream::{DecoderState, ElementaryStream, StreamId, StreamInfo};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, info_span, instrument, warn};

/// How a worker thread ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Termination was observed normally.
    Completed,
    /// The decoder reported an error and discarded its remaining input.
    Failed(String),
    /// The decoder instance could not be created.
    InitFailed(String),
    /// The worker thread panicked.
    Panicked,
}

impl WorkerExit {
    pub fn is_clean(&self) -> bool {
        matches!(self, WorkerExit::Completed)
    }
}

/// Outcome of [`DecoderManager::deactivate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivationReport {
    pub stream_id: StreamId,
    /// `false` if the stream had no decoder; nothing else was done.
    pub was_active: bool,
    /// Units freed without being delivered to the decoder.
    pub drained: usize,
    pub worker_exit: Option<WorkerExit>,
    /// The decoder flagged an error at some point during its lifetime.
    pub had_error: bool,
    /// Final Fifo counters, taken after draining.
    pub stats: Option<FifoStats>,
}

impl DeactivationReport {
    fn inactive(stream_id: StreamId) -> Self {
        Self {
            stream_id,
            was_active: false,
            drained: 0,
            worker_exit: None,
            had_error: false,
            stats: None,
        }
    }
}

/// Resources owned by an active stream.
///
/// Dropping an `ActiveDecoder` that was never shut down stops its worker, so
/// discarding an active stream descriptor cannot leak a blocked thread.
pub(crate) struct ActiveDecoder {
    fifo: Arc<DecoderFifo>,
    binding: Option<DecoderBinding>,
    worker: Option<JoinHandle<WorkerExit>>,
    registry: Arc<dyn StreamRegistry>,
    padding_units: usize,
}

impl ActiveDecoder {
    pub(crate) fn fifo(&self) -> &Arc<DecoderFifo> {
        &self.fifo
    }

    pub(crate) fn module_name(&self) -> &str {
        self.binding
            .as_ref()
            .map_or("", |binding| binding.module_name())
    }

    pub(crate) fn codec_name(&self) -> Option<&'static str> {
        self.binding.as_ref().map(|binding| binding.name())
    }

    /// Stop the worker and release everything. Safe to call once per
    /// activation; later calls find no worker and return an empty report.
    fn shutdown(&mut self) -> DeactivationReport {
        let stream_id = self.fifo.info().id;
        let Some(worker) = self.worker.take() else {
            return DeactivationReport::inactive(stream_id);
        };

        self.fifo.request_termination();
        inject_wake_burst(&self.fifo, self.padding_units);

        let exit = match worker.join() {
            Ok(exit) => exit,
            Err(_) => {
                error!(stream = %stream_id, "Decoder worker panicked");
                self.fifo.set_error();
                WorkerExit::Panicked
            }
        };

        let drained = self.fifo.drain_all();
        let had_error = self.fifo.has_error();
        let stats = self.fifo.stats();

        if let Some(binding) = self.binding.take() {
            binding.release();
        }
        self.registry.unregister(stream_id);

        DeactivationReport {
            stream_id,
            was_active: true,
            drained,
            worker_exit: Some(exit),
            had_error,
            stats: Some(stats),
        }
    }
}

impl Drop for ActiveDecoder {
    fn drop(&mut self) {
        if self.worker.is_some() {
            warn!(stream = %self.fifo.info().id, "Active decoder dropped without deactivation");
            self.shutdown();
            self.registry.mark_changed();
        }
    }
}

/// Removes a registry entry unless activation completes.
struct RegistrationGuard<'a> {
    registry: &'a dyn StreamRegistry,
    id: StreamId,
    armed: bool,
}

impl RegistrationGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RegistrationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(stream = %self.id, "Rolling back stream registration");
            self.registry.unregister(self.id);
        }
    }
}

/// Starts and stops decoders for elementary streams.
pub struct DecoderManager {
    resolver: Arc<DecoderResolver>,
    registry: Arc<dyn StreamRegistry>,
    config: DecoderConfig,
}

impl DecoderManager {
    /// Create a manager.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Config`] if the configuration is invalid.
    pub fn new(
        resolver: Arc<DecoderResolver>,
        registry: Arc<dyn StreamRegistry>,
        config: DecoderConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver,
            registry,
            config,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<DecoderResolver> {
        &self.resolver
    }

    pub fn registry(&self) -> &Arc<dyn StreamRegistry> {
        &self.registry
    }

    /// Start a decoder for the stream.
    ///
    /// On success the stream is `Running`, has a Fifo and is registered.
    /// The Fifo stays owned by the stream; producers feed it through
    /// [`ElementaryStream::enqueue`], which refuses units once the stream
    /// is deactivated.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::AlreadyActive`] if the stream already has a decoder
    /// - [`DecodeError::NoSuitableDecoder`] if no module handles the fourcc
    /// - [`DecodeError::AllocationFailure`] or [`DecodeError::Registry`] if
    ///   the Fifo or registry entry could not be created
    /// - [`DecodeError::ThreadSpawnFailure`] if the worker could not start
    #[instrument(skip(self, es), fields(stream = %es.id(), fourcc = %es.fourcc()))]
    pub fn activate(&self, es: &mut ElementaryStream) -> Result<()> {
        if es.is_active() {
            warn!("Stream already has an active decoder");
            return Err(DecodeError::AlreadyActive(es.id()));
        }

        es.set_state(DecoderState::Resolving);

        match self.start(es.info()) {
            Ok(active) => {
                info!(
                    module = active.module_name(),
                    category = ?es.category(),
                    "Decoder started"
                );
                es.decoder = Some(active);
                es.set_state(DecoderState::Running);
                self.registry.mark_changed();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Could not start decoder");
                es.set_state(DecoderState::Uninitialized);
                Err(e)
            }
        }
    }

    fn start(&self, info: &StreamInfo) -> Result<ActiveDecoder> {
        let binding = self
            .resolver
            .resolve_with_preference(info.fourcc, self.config.preferred_decoder.as_deref())?;
        debug!(module = binding.module_name(), codec = binding.name(), "Resolved decoder");

        let fifo = Arc::new(DecoderFifo::new(
            info.clone(),
            self.config.initial_fifo_capacity,
        )?);

        self.registry
            .register(RegisteredStream::from_fifo(Arc::clone(&fifo)))?;
        let registration = RegistrationGuard {
            registry: self.registry.as_ref(),
            id: info.id,
            armed: true,
        };

        let worker = self.spawn_worker(&binding, &fifo)?;
        registration.disarm();

        Ok(ActiveDecoder {
            fifo,
            binding: Some(binding),
            worker: Some(worker),
            registry: Arc::clone(&self.registry),
            padding_units: self.config.padding_units,
        })
    }

    fn spawn_worker(
        &self,
        binding: &DecoderBinding,
        fifo: &Arc<DecoderFifo>,
    ) -> Result<JoinHandle<WorkerExit>> {
        let name = format!("{}-{}", self.config.thread_name_prefix, fifo.info().id.0);
        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(stack_size) = self.config.worker_stack_size {
            builder = builder.stack_size(stack_size);
        }

        let module = Arc::clone(binding.module());
        let codec = *binding.codec();
        let fifo = Arc::clone(fifo);

        builder
            .spawn(move || run_worker(&module, codec, &fifo))
            .map_err(|source| DecodeError::ThreadSpawnFailure { name, source })
    }

    /// Stop the stream's decoder and release its resources.
    ///
    /// Blocks until the worker thread has exited. Calling this on a stream
    /// without a decoder does nothing and reports `was_active == false`.
    #[instrument(skip(self, es), fields(stream = %es.id()))]
    pub fn deactivate(&self, es: &mut ElementaryStream) -> DeactivationReport {
        let Some(mut active) = es.decoder.take() else {
            debug!("Stream has no active decoder");
            return DeactivationReport::inactive(es.id());
        };

        es.set_state(DecoderState::Draining);
        active.fifo().request_termination();

        if let Some(unit) = es.take_pending() {
            debug!(bytes = unit.len(), "Flushing pending unit");
            active.fifo().enqueue(unit);
        }

        let report = active.shutdown();
        drop(active);

        self.registry.mark_changed();
        es.set_state(DecoderState::Terminated);

        info!(
            drained = report.drained,
            had_error = report.had_error,
            exit = ?report.worker_exit,
            "Decoder stopped"
        );
        report
    }

    /// Ids of all streams with an active decoder.
    pub fn active_streams(&self) -> Vec<StreamId> {
        self.registry.selected().iter().map(|s| s.id).collect()
    }
}

impl std::fmt::Debug for DecoderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderManager")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Worker thread body.
fn run_worker(module: &DecoderModule, codec: CodecDescriptor, fifo: &DecoderFifo) -> WorkerExit {
    let span = info_span!("decoder_worker", stream = %fifo.info().id, module = module.name());
    let _enter = span.enter();

    let mut decoder = match module.create_decoder(fifo.info(), &codec) {
        Ok(decoder) => decoder,
        Err(e) => {
            error!(error = %e, codec = codec.name, "Decoder instantiation failed");
            fifo.set_error();
            discard_until_terminated(fifo);
            return WorkerExit::InitFailed(e.to_string());
        }
    };

    debug!(codec = codec.name, "Decoder worker running");
    match decoder.run(fifo) {
        Ok(()) => WorkerExit::Completed,
        Err(e) => WorkerExit::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{Decoder, DecoderFactory};
    use crate::fourcc::FourCc;
    use crate::stream::StreamCategory;
    use crate::unit::EncodedUnit;
    use mockall::mock;

    mock! {
        pub Registry {}

        impl StreamRegistry for Registry {
            fn register(&self, stream: RegisteredStream) -> Result<()>;
            fn unregister(&self, id: StreamId) -> Option<RegisteredStream>;
            fn selected(&self) -> Vec<RegisteredStream>;
            fn mark_changed(&self);
        }
    }

    struct NullDecoder;

    impl Decoder for NullDecoder {
        fn decode(&mut self, _unit: EncodedUnit) -> Result<()> {
            Ok(())
        }
    }

    struct NullFactory;

    impl DecoderFactory for NullFactory {
        fn create(&self, _stream: &StreamInfo, _codec: &CodecDescriptor) -> Result<Box<dyn Decoder>> {
            Ok(Box::new(NullDecoder))
        }
    }

    fn resolver() -> (Arc<DecoderResolver>, Arc<DecoderModule>) {
        let resolver = Arc::new(DecoderResolver::new());
        let module = resolver.register(DecoderModule::with_codec_table("null", 10, NullFactory));
        (resolver, module)
    }

    fn video_stream(id: u32) -> ElementaryStream {
        ElementaryStream::new(StreamId(id), FourCc::new(*b"h263"), StreamCategory::Video)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let (resolver, _) = resolver();
        let registry = Arc::new(MockRegistry::new());
        let config = DecoderConfig::default().with_padding_units(0);
        assert!(DecoderManager::new(resolver, registry, config).is_err());
    }

    #[test]
    fn test_registry_failure_unwinds_activation() {
        let (resolver, module) = resolver();
        let mut registry = MockRegistry::new();
        registry
            .expect_register()
            .times(1)
            .returning(|_| Err(DecodeError::Registry("table full".into())));
        registry.expect_unregister().never();
        registry.expect_mark_changed().never();

        let manager =
            DecoderManager::new(resolver, Arc::new(registry), DecoderConfig::default()).unwrap();
        let mut es = video_stream(5);

        let err = manager.activate(&mut es).unwrap_err();
        assert!(matches!(err, DecodeError::Registry(_)));
        assert_eq!(es.state(), DecoderState::Uninitialized);
        assert!(es.fifo().is_none());
        assert_eq!(module.active_bindings(), 0);
    }

    #[test]
    fn test_activate_and_deactivate_notify_registry() {
        let (resolver, module) = resolver();
        let mut registry = MockRegistry::new();
        registry.expect_register().times(1).returning(|_| Ok(()));
        registry
            .expect_unregister()
            .withf(|id| *id == StreamId(9))
            .times(1)
            .returning(|_| None);
        registry.expect_mark_changed().times(2).return_const(());

        let manager =
            DecoderManager::new(resolver, Arc::new(registry), DecoderConfig::default()).unwrap();
        let mut es = video_stream(9);

        manager.activate(&mut es).unwrap();
        assert_eq!(es.state(), DecoderState::Running);
        assert_eq!(es.decoder_name(), Some("null"));
        assert_eq!(module.active_bindings(), 1);

        let report = manager.deactivate(&mut es);
        assert!(report.was_active);
        assert_eq!(report.worker_exit, Some(WorkerExit::Completed));
        assert_eq!(es.state(), DecoderState::Terminated);
        assert_eq!(module.active_bindings(), 0);
    }

    #[test]
    fn test_unresolvable_stream_never_registers() {
        let (resolver, _) = resolver();
        let mut registry = MockRegistry::new();
        registry.expect_register().never();

        let manager =
            DecoderManager::new(resolver, Arc::new(registry), DecoderConfig::default()).unwrap();
        let mut es = ElementaryStream::new(StreamId(1), FourCc::new(*b"WMV3"), StreamCategory::Video);

        let err = manager.activate(&mut es).unwrap_err();
        assert!(err.is_resolution_error());
        assert_eq!(es.state(), DecoderState::Uninitialized);
    }

    #[test]
    fn test_deactivate_inactive_stream() {
        let (resolver, _) = resolver();
        let mut registry = MockRegistry::new();
        registry.expect_unregister().never();
        registry.expect_mark_changed().never();

        let manager =
            DecoderManager::new(resolver, Arc::new(registry), DecoderConfig::default()).unwrap();
        let mut es = video_stream(2);

        let report = manager.deactivate(&mut es);
        assert!(!report.was_active);
        assert_eq!(report.drained, 0);
        assert_eq!(es.state(), DecoderState::Uninitialized);
    }

    #[test]
    fn test_dropping_active_stream_stops_worker() {
        let (resolver, module) = resolver();
        let mut registry = MockRegistry::new();
        registry.expect_register().returning(|_| Ok(()));
        registry.expect_unregister().times(1).returning(|_| None);
        registry.expect_mark_changed().times(2).return_const(());

        let manager =
            DecoderManager::new(resolver, Arc::new(registry), DecoderConfig::default()).unwrap();
        let mut es = video_stream(3);
        manager.activate(&mut es).unwrap();
        let fifo = Arc::downgrade(es.decoder.as_ref().unwrap().fifo());

        drop(es);
        assert!(fifo.upgrade().is_none());
        assert_eq!(module.active_bindings(), 0);
    }

    #[test]
    fn test_fifo_freed_by_deactivate() {
        let (resolver, _) = resolver();
        let mut registry = MockRegistry::new();
        registry.expect_register().returning(|_| Ok(()));
        registry.expect_unregister().returning(|_| None);
        registry.expect_mark_changed().return_const(());

        let manager =
            DecoderManager::new(resolver, Arc::new(registry), DecoderConfig::default()).unwrap();
        let mut es = video_stream(4);
        manager.activate(&mut es).unwrap();
        let fifo = Arc::downgrade(es.decoder.as_ref().unwrap().fifo());
        es.enqueue(EncodedUnit::new(vec![1u8])).unwrap();

        manager.deactivate(&mut es);
        assert!(fifo.upgrade().is_none());
        assert!(matches!(
            es.enqueue(EncodedUnit::new(vec![2u8])),
            Err(DecodeError::NotActive(StreamId(4)))
        ));
    }
}
