//! In-memory connection for testing without a server.
//!
//! Procedures are answered from scripted responses and topics are backed
//! by broadcast channels, so tests can publish events and inspect which
//! calls the engine made. Responses can also be loaded from JSON fixture
//! files for the demo binary.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use futures::stream;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::error::ConnectionError;
use super::{Connection, EventFeed};

/// Events buffered per topic before slow subscribers start lagging.
const TOPIC_CAPACITY: usize = 256;

type Handler = Arc<dyn Fn(&[Value]) -> Result<Value, ConnectionError> + Send + Sync>;

type Delivery = Result<Value, ConnectionError>;

/// A call made through the mock, in the order it was received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub procedure: String,
    pub args: Vec<Value>,
}

#[derive(Default)]
struct MockState {
    /// One-shot responses, served before any handler.
    queued: HashMap<String, VecDeque<Result<Value, ConnectionError>>>,
    handlers: HashMap<String, Handler>,
    topics: HashMap<String, broadcast::Sender<Delivery>>,
    calls: Vec<RecordedCall>,
    closed: bool,
}

/// Scriptable in-memory [`Connection`].
///
/// Clones share state, so a test can keep one handle while the engine
/// holds another.
#[derive(Clone, Default)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    /// Create a mock with no procedures and no topics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock by loading JSON fixture files from a directory.
    ///
    /// Expects files named `{procedure}.json` (e.g.
    /// `timetable.visits_after.json`); each file's contents become the
    /// standing response for that procedure.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ConnectionError> {
        let dir = dir.as_ref();
        let mock = Self::new();

        let entries = std::fs::read_dir(dir).map_err(|e| {
            ConnectionError::Fixture(format!("failed to read {}: {e}", dir.display()))
        })?;

        let mut loaded = 0;
        for entry in entries {
            let entry = entry.map_err(|e| {
                ConnectionError::Fixture(format!("failed to read directory entry: {e}"))
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let procedure = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    ConnectionError::Fixture(format!("invalid filename: {}", path.display()))
                })?;

            let json = std::fs::read_to_string(&path).map_err(|e| {
                ConnectionError::Fixture(format!("failed to read {}: {e}", path.display()))
            })?;
            let value: Value = serde_json::from_str(&json).map_err(|e| {
                ConnectionError::Fixture(format!("failed to parse {}: {e}", path.display()))
            })?;

            mock.respond(procedure, value);
            loaded += 1;
        }

        if loaded == 0 {
            return Err(ConnectionError::Fixture(format!(
                "no fixture files found in {}",
                dir.display()
            )));
        }

        Ok(mock)
    }

    /// Answer every call to `procedure` with `value`.
    pub fn respond(&self, procedure: &str, value: Value) {
        self.on_call(procedure, move |_| Ok(value.clone()));
    }

    /// Answer calls to `procedure` by running `handler` on the arguments.
    pub fn on_call<F>(&self, procedure: &str, handler: F)
    where
        F: Fn(&[Value]) -> Result<Value, ConnectionError> + Send + Sync + 'static,
    {
        self.lock()
            .handlers
            .insert(procedure.to_string(), Arc::new(handler));
    }

    /// Answer the next call to `procedure` with `result`.
    ///
    /// Queued results are served in order, ahead of any standing response.
    pub fn enqueue(&self, procedure: &str, result: Result<Value, ConnectionError>) {
        self.lock()
            .queued
            .entry(procedure.to_string())
            .or_default()
            .push_back(result);
    }

    /// Publish an event on `topic`. Returns how many subscribers received it.
    pub fn publish(&self, topic: &str, value: Value) -> usize {
        self.deliver(topic, Ok(value))
    }

    /// Deliver a failure on `topic` without ending its feeds.
    pub fn fail_delivery(&self, topic: &str, error: ConnectionError) -> usize {
        self.deliver(topic, Err(error))
    }

    /// Number of live feeds subscribed to `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock()
            .topics
            .get(topic)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls received so far for one procedure.
    pub fn calls_to(&self, procedure: &str) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.procedure == procedure)
            .cloned()
            .collect()
    }

    /// Close the connection. Later calls fail and every feed ends.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.topics.clear();
    }

    fn deliver(&self, topic: &str, delivery: Delivery) -> usize {
        self.lock()
            .topics
            .get(topic)
            .and_then(|tx| tx.send(delivery).ok())
            .unwrap_or(0)
    }

    fn answer(&self, procedure: &str, args: Vec<Value>) -> Result<Value, ConnectionError> {
        let handler = {
            let mut state = self.lock();
            if state.closed {
                return Err(ConnectionError::Closed);
            }

            state.calls.push(RecordedCall {
                procedure: procedure.to_string(),
                args: args.clone(),
            });

            if let Some(result) = state
                .queued
                .get_mut(procedure)
                .and_then(VecDeque::pop_front)
            {
                return result;
            }

            state.handlers.get(procedure).cloned()
        };

        match handler {
            Some(handler) => handler(&args),
            None => Err(ConnectionError::NoSuchProcedure(procedure.to_string())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Connection for MockConnection {
    fn call(
        &self,
        procedure: &str,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<Value, ConnectionError>> + Send {
        let result = self.answer(procedure, args);
        async move {
            // Complete asynchronously, as a real transport would.
            tokio::task::yield_now().await;
            result
        }
    }

    fn subscribe(&self, topic: &str) -> EventFeed {
        let mut state = self.lock();
        if state.closed {
            return stream::empty().boxed();
        }

        let rx = state
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe();
        let topic = topic.to_string();

        stream::unfold(rx, move |mut rx| {
            let topic = topic.clone();
            async move {
                match rx.recv().await {
                    Ok(delivery) => Some((delivery, rx)),
                    Err(RecvError::Lagged(skipped)) => {
                        let error = ConnectionError::Delivery {
                            topic,
                            message: format!("lagged behind by {skipped} events"),
                        };
                        Some((Err(error), rx))
                    }
                    Err(RecvError::Closed) => None,
                }
            }
        })
        .boxed()
    }
}

impl std::fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockConnection")
            .field("procedures", &state.handlers.keys().collect::<Vec<_>>())
            .field("topics", &state.topics.keys().collect::<Vec<_>>())
            .field("closed", &state.closed)
            .finish()
    }
}
