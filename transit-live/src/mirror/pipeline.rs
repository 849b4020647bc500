//! The fan-in and retry loop behind every open mirror.
//!
//! Two producers feed one channel: a task making the "last event" call,
//! and a task forwarding the topic subscription. Which one delivers first
//! is unspecified. A single dispatch loop drains the channel, so events
//! for one entity are applied strictly one at a time.
//!
//! A failed update is retried by re-sending the "last event" call. Each
//! call is tagged with a generation and only the newest one is applied.
//! The subscription stays open across retries, so live events already
//! queued are neither lost nor delivered twice. It is only reopened when
//! the feed itself ends.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::connection::{Connection, ConnectionError, EventFeed};
use crate::domain::Entity;
use crate::event::{decode_last_event, decode_topic_event, DomainEvent};

use super::cell::{Dispatch, MirrorCell};
use super::config::MirrorConfig;
use super::delegate::Delegate;
use super::error::MirrorError;

/// Procedure returning the last event published on a topic.
pub const LAST_EVENT_PROCEDURE: &str = "meta.last_event";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Snapshot,
    Live,
}

enum Incoming {
    Snapshot {
        generation: u64,
        payload: Result<Value, ConnectionError>,
    },
    Live(Result<Value, ConnectionError>),
    FeedEnded,
}

/// A spawned producer, aborted when dropped.
struct Producer(JoinHandle<()>);

impl Drop for Producer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct Producers {
    snapshot: Producer,
    live: Option<Producer>,
}

pub(crate) struct Pipeline<E: Entity, C: Connection> {
    pub(crate) cell: Arc<MirrorCell<E>>,
    pub(crate) connection: Arc<C>,
    pub(crate) delegate: Arc<dyn Delegate<E>>,
    pub(crate) config: MirrorConfig,
    pub(crate) topic: String,
}

impl<E: Entity, C: Connection> Pipeline<E, C> {
    /// Drive the mirror until the task is aborted.
    ///
    /// `feed` is the subscription opened by the caller, so events published
    /// after the mirror was opened are never missed.
    pub(crate) async fn run(self, feed: EventFeed) {
        let (tx, mut rx) = mpsc::channel(self.config.channel_capacity.max(1));

        let mut generation = 0;
        let mut producers = Producers {
            snapshot: self.request_snapshot(generation, &tx),
            live: Some(self.forward(feed, &tx)),
        };
        // Consecutive failures since the last live event applied cleanly.
        let mut failures = 0;

        debug!(topic = %self.topic, "mirror opened");

        while let Some(incoming) = rx.recv().await {
            let (source, result) = match incoming {
                Incoming::Snapshot { generation: g, .. } if g != generation => {
                    trace!(topic = %self.topic, "dropping superseded snapshot");
                    continue;
                }
                Incoming::Snapshot { payload, .. } => {
                    (Source::Snapshot, self.apply_snapshot(payload))
                }
                Incoming::Live(payload) => (Source::Live, self.apply_live(payload)),
                Incoming::FeedEnded => (
                    Source::Live,
                    Err(MirrorError::SubscriptionEnded {
                        topic: self.topic.clone(),
                    }),
                ),
            };

            let error = match result {
                Ok(()) => {
                    if source == Source::Live {
                        failures = 0;
                    }
                    continue;
                }
                Err(error) => error,
            };
            let feed_ended = matches!(error, MirrorError::SubscriptionEnded { .. });

            failures += 1;
            if failures <= self.config.retry_attempts {
                warn!(
                    topic = %self.topic,
                    attempt = failures,
                    error = %error,
                    "mirror update failed, retrying"
                );
                generation += 1;
                producers.snapshot = self.request_snapshot(generation, &tx);
                if feed_ended {
                    let feed = self.connection.subscribe(&self.topic);
                    producers.live = Some(self.forward(feed, &tx));
                }
            } else {
                failures = 0;
                if feed_ended {
                    debug!(topic = %self.topic, "giving up on subscription");
                    producers.live = None;
                }
                self.delegate.error(self.cell.id(), error);
            }
        }

        drop(producers);
    }

    fn request_snapshot(&self, generation: u64, tx: &mpsc::Sender<Incoming>) -> Producer {
        let connection = Arc::clone(&self.connection);
        let topic = self.topic.clone();
        let tx = tx.clone();
        Producer(tokio::spawn(async move {
            let args = vec![Value::from(topic.clone()), Value::from(topic)];
            let payload = connection.call(LAST_EVENT_PROCEDURE, args).await;
            let _ = tx.send(Incoming::Snapshot { generation, payload }).await;
        }))
    }

    fn forward(&self, mut feed: EventFeed, tx: &mpsc::Sender<Incoming>) -> Producer {
        let topic = self.topic.clone();
        let tx = tx.clone();
        Producer(tokio::spawn(async move {
            while let Some(payload) = feed.next().await {
                if tx.send(Incoming::Live(payload)).await.is_err() {
                    return;
                }
            }
            debug!(topic = %topic, "subscription feed ended");
            let _ = tx.send(Incoming::FeedEnded).await;
        }))
    }

    fn apply_snapshot(&self, payload: Result<Value, ConnectionError>) -> Result<(), MirrorError> {
        match decode_last_event::<E>(&self.topic, payload?)? {
            Some(event) => self.dispatch(event, Source::Snapshot),
            None => {
                debug!(topic = %self.topic, "no last event to apply");
                Ok(())
            }
        }
    }

    fn apply_live(&self, payload: Result<Value, ConnectionError>) -> Result<(), MirrorError> {
        let event = decode_topic_event::<E>(&self.topic, payload?)?;
        self.dispatch(event, Source::Live)
    }

    fn dispatch(
        &self,
        event: DomainEvent<E>,
        source: Source,
    ) -> Result<(), MirrorError> {
        match self.cell.dispatch(event)? {
            Dispatch::Handled => {
                trace!(topic = %self.topic, source = ?source, "event applied");
            }
            Dispatch::Unhandled(raw) => self.delegate.unhandled_event(self.cell.id(), raw),
        }
        Ok(())
    }
}
