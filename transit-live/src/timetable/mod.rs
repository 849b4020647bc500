//! Arrival queries against the timetable service.
//!
//! [`Timetable::visits`] turns the paged `timetable.visits_*` procedures
//! into a sequence of arrivals at a station. The first page is a burst of
//! up to [`Limit::count`] arrivals; after that, exactly one more arrival is
//! fetched each time the caller asks for it through a [`Continuation`].
//! Nothing is ever fetched ahead of the caller.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use transit_live::connection::MockConnection;
//! # use transit_live::domain::{StopId, parse_timestamp};
//! # use transit_live::timetable::{Limit, Timetable, Timing};
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let timetable = Timetable::new(Arc::new(MockConnection::from_dir("data/mock_rpc")?));
//! let now = parse_timestamp("20170105 09:00:00")?;
//!
//! let mut visits = timetable.visits(StopId::parse("BUS215")?, None, Timing::After(now), Limit::default());
//! while let Some(visit) = visits.next().await {
//!     let visit = visit?;
//!     println!("{} at {}", visit.arrival.route.id(), visit.arrival.eta);
//!     // Ask for one more once this vehicle has left.
//!     visit.more.more();
//! }
//! # Ok(())
//! # }
//! ```

mod arrival;
mod cursor;
mod error;
mod timing;


use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::connection::Connection;
use crate::domain::{Entity, Route, RouteCode, StopId};
use crate::mirror::{Delegate, LogDelegate, Mirror, MirrorConfig};

pub use arrival::Arrival;
pub use cursor::{Cursor, PROCEDURE_PREFIX};
pub use error::TimetableError;
pub use timing::{DEFAULT_COUNT, DEFAULT_WINDOW_SECS, Direction, Limit, Timing};

use arrival::Response;

/// One fetched page of arrivals.
#[derive(Debug, Clone)]
pub struct Page {
    /// Arrivals in the order the server returned them.
    pub arrivals: Vec<Arrival>,
    /// Cursor for the next single arrival.
    pub next: Cursor,
}

/// Client for the timetable procedures.
///
/// Every arrival carries a live mirror of its route. Those mirrors are
/// opened over the same connection and report to the timetable's delegate.
pub struct Timetable<C: Connection> {
    connection: Arc<C>,
    delegate: Arc<dyn Delegate<Route>>,
    mirror_config: MirrorConfig,
}

impl<C: Connection> Timetable<C> {
    /// Create a timetable whose route mirrors log their failures.
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            connection,
            delegate: Arc::new(LogDelegate),
            mirror_config: MirrorConfig::default(),
        }
    }

    /// Send route mirror reports to `delegate`.
    pub fn with_delegate(mut self, delegate: Arc<dyn Delegate<Route>>) -> Self {
        self.delegate = delegate;
        self
    }

    /// Configure the route mirrors opened for arrivals.
    pub fn with_mirror_config(mut self, config: MirrorConfig) -> Self {
        self.mirror_config = config;
        self
    }

    /// Fetch one page.
    ///
    /// Arrivals on the same route share one mirror. If the page is empty,
    /// `next` searches the same window again.
    pub async fn page(&self, cursor: &Cursor) -> Result<Page, TimetableError> {
        let procedure = cursor.procedure();
        let result = self.connection.call(&procedure, cursor.args()).await?;

        let responses = Response::decode_all(&result)
            .map_err(|source| TimetableError::Decode { procedure, source })?;
        let next = cursor.advance(responses.iter().map(|r| r.eta));

        let mut mirrors: HashMap<RouteCode, Mirror<Route>> = HashMap::new();
        let arrivals = responses
            .into_iter()
            .map(|response| {
                let route = mirrors
                    .entry(response.route.id().clone())
                    .or_insert_with(|| self.open_route(response.route))
                    .clone();
                Arrival {
                    eta: response.eta,
                    etd: response.etd,
                    route,
                    heading: response.heading,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            station = %cursor.station,
            timing = ?cursor.timing,
            count = arrivals.len(),
            "fetched arrivals"
        );
        Ok(Page { arrivals, next })
    }

    /// Query arrivals at `station`, optionally only on `route`.
    ///
    /// Nothing is fetched until the returned sequence is first polled.
    pub fn visits(
        &self,
        station: StopId,
        route: Option<RouteCode>,
        timing: Timing,
        limit: Limit,
    ) -> Visits<C> {
        let cursor = Cursor::new(station, route, timing, limit.count);
        Visits::new(self.clone(), cursor)
    }

    fn open_route(&self, route: Route) -> Mirror<Route> {
        Mirror::open(
            route,
            Arc::clone(&self.connection),
            Arc::clone(&self.delegate),
            &self.mirror_config,
        )
    }
}

impl<C: Connection> Clone for Timetable<C> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            delegate: Arc::clone(&self.delegate),
            mirror_config: self.mirror_config.clone(),
        }
    }
}

/// Requests one more arrival from the [`Visits`] it came from.
///
/// Every arrival of a page carries the same continuation. Each call to
/// [`more`](Continuation::more) fetches exactly one more arrival, always
/// continuing after the newest one delivered so far.
#[derive(Debug, Clone)]
pub struct Continuation {
    cursor: Cursor,
    requests: mpsc::UnboundedSender<()>,
}

impl Continuation {
    /// Ask for one more arrival. Does nothing once the sequence is gone.
    pub fn more(&self) {
        let _ = self.requests.send(());
    }

    /// Cursor this continuation was created with.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

/// One delivered arrival and the way to ask for the next.
#[derive(Debug, Clone)]
pub struct Visit {
    pub arrival: Arrival,
    pub more: Continuation,
}

/// Lazy sequence of arrivals at a station.
///
/// Yields the first page, then waits for a [`Continuation`] to be invoked
/// before each further fetch. A closed connection ends the sequence; any
/// other failure is yielded once and ends it. A `Between` window ends it
/// once its start reaches its end.
///
/// Dropping a pending [`next`](Visits::next) abandons the fetch in
/// progress: routes of a page that never resolved are not mirrored, and
/// the fetch is made again on the next call.
pub struct Visits<C: Connection> {
    timetable: Timetable<C>,
    cursor: Cursor,
    /// A fetch has been requested and not yet completed.
    due: bool,
    done: bool,
    buffered: VecDeque<Visit>,
    requests: mpsc::UnboundedReceiver<()>,
    sender: mpsc::UnboundedSender<()>,
}

impl<C: Connection> Visits<C> {
    fn new(timetable: Timetable<C>, cursor: Cursor) -> Self {
        let (sender, requests) = mpsc::unbounded_channel();
        Self {
            timetable,
            cursor,
            due: true,
            done: false,
            buffered: VecDeque::new(),
            requests,
            sender,
        }
    }

    /// Next arrival, fetching a page if one is due.
    ///
    /// After a page has been drained this waits until more arrivals are
    /// requested. An empty page yields nothing, so keep a
    /// [`continuation`](Visits::continuation) to ask again.
    pub async fn next(&mut self) -> Option<Result<Visit, TimetableError>> {
        loop {
            if let Some(visit) = self.buffered.pop_front() {
                return Some(Ok(visit));
            }
            if self.done {
                return None;
            }

            if !self.due {
                self.requests.recv().await?;
                self.due = true;
            }

            if self.cursor.timing.is_exhausted() {
                debug!(station = %self.cursor.station, "search window exhausted");
                self.done = true;
                return None;
            }

            match self.timetable.page(&self.cursor).await {
                Ok(page) => {
                    self.due = false;
                    if page.arrivals.is_empty() {
                        debug!(station = %self.cursor.station, "empty page, waiting for more");
                    }
                    self.accept(page);
                }
                Err(e) if e.is_closed() => {
                    debug!(station = %self.cursor.station, "connection closed, ending arrivals");
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }

    /// A continuation for this sequence, available before anything is
    /// fetched. It outlives [`into_stream`](Visits::into_stream).
    pub fn continuation(&self) -> Continuation {
        Continuation {
            cursor: self.cursor.clone(),
            requests: self.sender.clone(),
        }
    }

    /// Cursor the next fetch will use.
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Convert into a stream of visits.
    pub fn into_stream(self) -> BoxStream<'static, Result<Visit, TimetableError>> {
        stream::unfold(self, |mut visits| async move {
            let item = visits.next().await?;
            Some((item, visits))
        })
        .boxed()
    }

    fn accept(&mut self, page: Page) {
        let more = Continuation {
            cursor: page.next.clone(),
            requests: self.sender.clone(),
        };
        trace!(
            station = %self.cursor.station,
            arrivals = page.arrivals.len(),
            next = ?page.next.timing,
            "page accepted"
        );

        self.cursor = page.next;
        self.buffered
            .extend(page.arrivals.into_iter().map(|arrival| Visit {
                arrival,
                more: more.clone(),
            }));
    }
}
