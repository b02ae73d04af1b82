//! Test doubles for the ports.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use steward_domain::auth::encode_unsigned;
use steward_domain::{ApiRequest, ApiResponse, HttpMethod};
use tokio::sync::{Barrier, broadcast};

use crate::console::Console;
use crate::ports::{Clock, KeyValueStore, StorageChange, StoreError, Transport, TransportError};
use crate::session::SessionConfig;

/// Epoch second the manual clock starts at.
pub const START: i64 = 1_700_000_000;

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.timestamp_opt(START, 0).unwrap()),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += chrono::Duration::from_std(by).unwrap();
    }

    pub fn set_epoch(&self, seconds: i64) {
        *self.now.lock() = Utc.timestamp_opt(seconds, 0).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// In-memory store; `shared` handles see each other's changes.
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    changes: broadcast::Sender<StorageChange>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            values: Arc::default(),
            changes: broadcast::channel(64).0,
        }
    }
}

impl MemoryStore {
    /// Another handle on the same values and change channel, standing in for
    /// a second browser tab or process.
    pub fn shared(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
            changes: self.changes.clone(),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        let _ = self
            .changes
            .send(StorageChange::new(key, Some(value.to_string())));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.values.lock().remove(key).is_some() {
            let _ = self.changes.send(StorageChange::new(key, None));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

#[derive(Clone)]
enum Reply {
    Response(ApiResponse),
    Fail(TransportError),
}

/// Scripted transport that records every request it receives.
#[derive(Default)]
pub struct FakeTransport {
    once: Mutex<HashMap<(HttpMethod, String), VecDeque<Reply>>>,
    always: Mutex<HashMap<(HttpMethod, String), Reply>>,
    requests: Mutex<Vec<ApiRequest>>,
    barrier: Mutex<Option<Arc<Barrier>>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answers every `method path` call with `status` and `body`.
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.always.lock().insert(
            (method, path.to_string()),
            Reply::Response(ApiResponse::json(status, &body)),
        );
    }

    /// Answers the next `method path` call only.
    pub fn respond_once(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.once
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Reply::Response(ApiResponse::json(status, &body)));
    }

    /// Answers every `method path` call with raw bytes.
    pub fn respond_bytes(&self, method: HttpMethod, path: &str, body: &[u8]) {
        self.always.lock().insert(
            (method, path.to_string()),
            Reply::Response(ApiResponse::new(200, body.to_vec())),
        );
    }

    /// Fails every `method path` call at the network level.
    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) {
        self.always
            .lock()
            .insert((method, path.to_string()), Reply::Fail(error));
    }

    /// Holds each request until `parties` requests are in flight together.
    pub fn hold_until(&self, parties: usize) {
        *self.barrier.lock() = Some(Arc::new(Barrier::new(parties)));
    }

    /// Delays every answer by `delay` (of tokio time).
    pub fn delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn last(&self) -> ApiRequest {
        self.requests.lock().last().cloned().expect("no request sent")
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().push(request.clone());

        let barrier = self.barrier.lock().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let route = (request.method, request.path.clone());
        let scripted = self
            .once
            .lock()
            .get_mut(&route)
            .and_then(VecDeque::pop_front);
        let reply = scripted
            .or_else(|| self.always.lock().get(&route).cloned())
            .unwrap_or_else(|| Reply::Response(ApiResponse::new(404, Vec::new())));

        match reply {
            Reply::Response(response) => Ok(response),
            Reply::Fail(error) => Err(error),
        }
    }
}

/// A console over fresh doubles.
pub struct ConsoleHarness {
    pub console: Console,
    pub transport: Arc<FakeTransport>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl ConsoleHarness {
    pub fn anonymous() -> Self {
        let transport = FakeTransport::new();
        let store = Arc::new(MemoryStore::default());
        let clock = ManualClock::new();
        let console = Console::new(
            transport.clone(),
            store.clone(),
            clock.clone(),
            SessionConfig::default(),
        );
        Self {
            console,
            transport,
            store,
            clock,
        }
    }

    /// Logged in as `user@example.com` for an hour, without touching the
    /// transport.
    pub async fn logged_in() -> Self {
        let harness = Self::anonymous();
        harness
            .console
            .session()
            .login(&encode_unsigned("user@example.com", START + 3600))
            .await
            .unwrap();
        harness
    }
}
