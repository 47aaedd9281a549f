#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use stream_session::{
    DataSourceKind, EngineError, EngineEventSink, EngineFactory, EngineOptions, MediaEngine,
    ResolveError, SessionHandle, SessionSnapshot, StreamLocation, StreamResolver, SurfaceHandle,
};
use tokio::sync::oneshot;

// ============================================================================
// Recording engine
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Configure(DataSourceKind),
    HardwareDecode(bool),
    SetDisplay(Option<SurfaceHandle>),
    SetDataSource(String),
    Prepare,
    Start,
    Pause,
    Stop,
    SeekTo(i64),
    Reset,
    Release,
    SpeedMode(i32),
    Volume(i32),
}

pub type CallLog = Arc<Mutex<Vec<(u64, EngineCall)>>>;

struct MockEngine {
    id: u64,
    calls: CallLog,
    playing: bool,
    video_size: (u32, u32),
    supports_suspend: bool,
}

impl MockEngine {
    fn record(&self, call: EngineCall) {
        self.calls.lock().push((self.id, call));
    }
}

impl MediaEngine for MockEngine {
    fn configure(&mut self, options: &EngineOptions) -> Result<(), EngineError> {
        self.record(EngineCall::Configure(options.data_source_kind));
        Ok(())
    }

    fn set_data_source(&mut self, location: &str) -> Result<(), EngineError> {
        self.record(EngineCall::SetDataSource(location.to_string()));
        if location.starts_with("bad://") {
            return Err(EngineError::rejected(location, "unsupported scheme"));
        }
        Ok(())
    }

    fn set_display(&mut self, surface: Option<SurfaceHandle>) {
        self.record(EngineCall::SetDisplay(surface));
    }

    fn set_hardware_decode_enabled(&mut self, enabled: bool) {
        self.record(EngineCall::HardwareDecode(enabled));
    }

    fn prepare_async(&mut self) -> Result<(), EngineError> {
        self.record(EngineCall::Prepare);
        Ok(())
    }

    fn start(&mut self) {
        self.playing = true;
        self.record(EngineCall::Start);
    }

    fn pause(&mut self) {
        self.playing = false;
        self.record(EngineCall::Pause);
    }

    fn stop(&mut self) {
        self.playing = false;
        self.record(EngineCall::Stop);
    }

    fn seek_to(&mut self, position_ms: i64) {
        self.record(EngineCall::SeekTo(position_ms));
    }

    fn reset(&mut self) {
        self.playing = false;
        self.record(EngineCall::Reset);
    }

    fn release(&mut self) {
        self.record(EngineCall::Release);
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn duration(&self) -> i64 {
        120_000
    }

    fn position(&self) -> i64 {
        4_000
    }

    fn playable_duration(&self) -> i64 {
        9_500
    }

    fn bit_rate(&self) -> i64 {
        2_000_000
    }

    fn remote_ip(&self) -> Option<String> {
        Some("10.0.0.7".to_string())
    }

    fn absolute_timestamp(&self) -> i64 {
        1_700_000_000
    }

    fn video_size(&self) -> (u32, u32) {
        self.video_size
    }

    fn supports_suspend(&self) -> bool {
        self.supports_suspend
    }

    fn set_speed_mode(&mut self, mode: i32) {
        self.record(EngineCall::SpeedMode(mode));
    }

    fn set_volume(&mut self, volume: i32) {
        self.record(EngineCall::Volume(volume));
    }
}

/// Factory for recording engines; keeps every sink it handed out so tests
/// can play the engine's part.
#[derive(Clone, Default)]
pub struct MockFactory {
    calls: CallLog,
    sinks: Arc<Mutex<Vec<EngineEventSink>>>,
    video_size: Arc<Mutex<(u32, u32)>>,
    supports_suspend: Arc<Mutex<bool>>,
    fail_create: Arc<Mutex<bool>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video_size(self, width: u32, height: u32) -> Self {
        *self.video_size.lock() = (width, height);
        self
    }

    pub fn with_suspend_support(self) -> Self {
        *self.supports_suspend.lock() = true;
        self
    }

    pub fn failing(self) -> Self {
        *self.fail_create.lock() = true;
        self
    }

    pub fn created(&self) -> usize {
        self.sinks.lock().len()
    }

    pub fn sink(&self, index: usize) -> EngineEventSink {
        self.sinks.lock()[index].clone()
    }

    pub fn last_sink(&self) -> EngineEventSink {
        self.sinks.lock().last().cloned().expect("no engine created")
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().iter().map(|(_, call)| call.clone()).collect()
    }

    pub fn calls_for(&self, engine_id: u64) -> Vec<EngineCall> {
        self.calls
            .lock()
            .iter()
            .filter(|(id, _)| *id == engine_id)
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.lock().iter().filter(|(_, c)| c == call).count()
    }

    pub fn data_sources(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::SetDataSource(location) => Some(location),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }
}

impl EngineFactory for MockFactory {
    fn create(&self, sink: EngineEventSink) -> Result<Box<dyn MediaEngine>, EngineError> {
        if *self.fail_create.lock() {
            return Err(EngineError::construction("decoder unavailable"));
        }
        let engine = MockEngine {
            id: sink.engine_id(),
            calls: self.calls.clone(),
            playing: false,
            video_size: *self.video_size.lock(),
            supports_suspend: *self.supports_suspend.lock(),
        };
        self.sinks.lock().push(sink);
        Ok(Box::new(engine))
    }
}

// ============================================================================
// Resolvers
// ============================================================================

pub fn location(cdn: &str, link: &str) -> StreamLocation {
    StreamLocation {
        cdn: cdn.to_string(),
        link: link.to_string(),
    }
}

/// Answers every lookup with the same location.
pub struct FixedResolver(pub StreamLocation);

#[async_trait]
impl StreamResolver for FixedResolver {
    async fn lookup(&self, _token: &str) -> Result<StreamLocation, ResolveError> {
        Ok(self.0.clone())
    }
}

/// Always answers with a malformed-reply error.
pub struct MalformedResolver;

#[async_trait]
impl StreamResolver for MalformedResolver {
    async fn lookup(&self, _token: &str) -> Result<StreamLocation, ResolveError> {
        Err(ResolveError::malformed("missing link"))
    }
}

type Reply = oneshot::Sender<Result<StreamLocation, ResolveError>>;

/// Lookups park until the test answers them, in request order.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    pending: Arc<Mutex<VecDeque<(String, Reply)>>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Answer the oldest outstanding lookup.
    pub fn answer(&self, reply: Result<StreamLocation, ResolveError>) -> String {
        let (token, tx) = self
            .pending
            .lock()
            .pop_front()
            .expect("no outstanding lookup");
        let _ = tx.send(reply);
        token
    }
}

#[async_trait]
impl StreamResolver for ScriptedResolver {
    async fn lookup(&self, token: &str) -> Result<StreamLocation, ResolveError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().push_back((token.to_string(), tx));
        rx.await
            .unwrap_or_else(|_| Err(ResolveError::malformed("lookup abandoned")))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Poll the session until `predicate` holds.
pub async fn wait_for(
    handle: &SessionHandle,
    predicate: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    for _ in 0..200 {
        let snapshot = handle.snapshot().await.expect("session closed");
        if predicate(&snapshot) {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached: {:?}", handle.snapshot().await);
}

/// Wait until `count` lookups are parked on the resolver.
pub async fn wait_for_lookups(resolver: &ScriptedResolver, count: usize) {
    for _ in 0..200 {
        if resolver.pending() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {count} outstanding lookups, got {}", resolver.pending());
}
