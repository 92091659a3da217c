//! Scripted in-process transports and sinks shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chat::{
    ApiKey, BackendConfig, ChatTransport, CompletionResult, ProgressSink, RequestSpec,
    TransportError,
};
use llm::ChatClient;

type Reply = dyn Fn(&RequestSpec, u32) -> Result<CompletionResult, TransportError> + Send + Sync;

/// Answers every request with a closure of `(request, call number)`.
///
/// Call numbers start at 1 and count across all requests.
pub struct StubTransport {
    calls: AtomicU32,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    reply: Box<Reply>,
    delay: fn(&RequestSpec) -> Duration,
    seen: Mutex<Vec<RequestSpec>>,
}

impl StubTransport {
    pub fn new(
        reply: impl Fn(&RequestSpec, u32) -> Result<CompletionResult, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            calls: AtomicU32::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            reply: Box::new(reply),
            delay: |_| Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Fails the first `k` calls, then answers `"ok"`.
    pub fn failing_first(k: u32) -> Self {
        Self::new(move |_, call| {
            if call <= k {
                Err(TransportError::Network(format!("scripted failure {call}")))
            } else {
                Ok(vec!["ok".to_string()])
            }
        })
    }

    pub fn always_failing() -> Self {
        Self::new(|_, _| Err(TransportError::Status {
            status: 503,
            body: "overloaded".into(),
        }))
    }

    /// Answers `"echo: <prompt>"`.
    pub fn echo() -> Self {
        Self::new(|spec, _| Ok(vec![format!("echo: {}", spec.prompt)]))
    }

    /// Delays each call by a function of its request before replying.
    pub fn with_delay(mut self, delay: fn(&RequestSpec) -> Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most calls that were ever inside `send` at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<RequestSpec> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for StubTransport {
    async fn send(
        &self,
        _backend: &BackendConfig,
        request: &RequestSpec,
    ) -> Result<CompletionResult, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = (self.delay)(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.reply)(request, call)
    }
}

pub fn backend() -> BackendConfig {
    BackendConfig::new("http://stub.invalid/v1", ApiKey::new("sk-test"))
}

pub fn client(transport: Arc<StubTransport>) -> ChatClient {
    ChatClient::new(backend(), transport)
}

/// Records every progress hook call as a line of text.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressSink for RecordingProgress {
    fn shard_started(&self, shard: usize, total: usize) {
        self.push(format!("started {shard} {total}"));
    }

    fn item_finished(&self, shard: usize, done: usize, total: usize) {
        self.push(format!("item {shard} {done}/{total}"));
    }

    fn attempt_failed(&self, shard: usize, index: usize, attempt: u32, _error: &TransportError) {
        self.push(format!("failed {shard} {index} {attempt}"));
    }

    fn response(&self, shard: usize, index: usize, text: &str) {
        self.push(format!("response {shard} {index} {text}"));
    }

    fn shard_finished(&self, shard: usize, failed: usize) {
        self.push(format!("finished {shard} {failed}"));
    }
}
