//! Handle to an open mirror.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::connection::Connection;
use crate::domain::Entity;

use super::cell::{MirrorCell, MirrorState};
use super::config::MirrorConfig;
use super::delegate::Delegate;
use super::pipeline::Pipeline;

struct Inner<E: Entity> {
    cell: Arc<MirrorCell<E>>,
    topic: String,
    task: JoinHandle<()>,
}

impl<E: Entity> Drop for Inner<E> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A live, continuously updated local copy of one server-owned entity.
///
/// Opening a mirror subscribes to the entity's topic and asks for the last
/// event published on it; both sources are applied as they arrive. Clones
/// share the same state. When the last clone is dropped the subscription
/// is torn down and anything still in flight is discarded.
///
/// Failures never reach observers. They are retried, then handed to the
/// mirror's [`Delegate`].
pub struct Mirror<E: Entity> {
    inner: Arc<Inner<E>>,
}

impl<E: Entity> Mirror<E> {
    /// Open a mirror starting from `initial`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<C: Connection>(
        initial: E,
        connection: Arc<C>,
        delegate: Arc<dyn Delegate<E>>,
        config: &MirrorConfig,
    ) -> Self {
        let topic = initial.topic();
        let cell = Arc::new(MirrorCell::new(initial));

        // Subscribe before returning, so nothing published after `open`
        // can be missed.
        let feed = connection.subscribe(&topic);

        let pipeline = Pipeline {
            cell: Arc::clone(&cell),
            connection,
            delegate,
            config: config.clone(),
            topic: topic.clone(),
        };
        let task = tokio::spawn(pipeline.run(feed));

        Self {
            inner: Arc::new(Inner { cell, topic, task }),
        }
    }

    /// Open a mirror knowing only the entity's identifier.
    pub fn open_id<C: Connection>(
        id: E::Id,
        connection: Arc<C>,
        delegate: Arc<dyn Delegate<E>>,
        config: &MirrorConfig,
    ) -> Self {
        Self::open(E::unknown(id), connection, delegate, config)
    }

    pub fn id(&self) -> &E::Id {
        self.inner.cell.id()
    }

    /// Topic the mirror is subscribed to.
    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    /// Current state, including version and last source record.
    pub fn snapshot(&self) -> MirrorState<E> {
        self.inner.cell.snapshot()
    }

    /// Current merged value.
    pub fn value(&self) -> E {
        self.inner.cell.snapshot().value
    }

    /// Number of updates applied so far.
    pub fn version(&self) -> u64 {
        self.inner.cell.snapshot().version
    }

    /// Observe state changes through a watch channel.
    pub fn watch(&self) -> watch::Receiver<MirrorState<E>> {
        self.inner.cell.watch()
    }

    /// Stream of states, starting with the current one.
    ///
    /// Updates that land between two polls are coalesced; the stream always
    /// yields the latest state. It ends once every `Mirror` handle has been
    /// dropped.
    pub fn stream(&self) -> BoxStream<'static, MirrorState<E>> {
        let mut rx = self.watch();
        rx.mark_changed();

        stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok()?;
            let state = rx.borrow_and_update().clone();
            Some((state, rx))
        })
        .boxed()
    }
}

impl<E: Entity> Clone for Mirror<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Entity> fmt::Debug for Mirror<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("topic", &self.inner.topic)
            .field("version", &self.version())
            .finish()
    }
}
