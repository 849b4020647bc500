//! Search windows for arrival queries.

use std::fmt;

use chrono::{Duration, NaiveDateTime};

use super::arrival::Arrival;

/// Direction a [`Timing`] searches in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Most recent first.
    Before,
    /// Soonest first.
    After,
    /// Soonest first, up to a fixed end.
    Between,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Before => "before",
            Direction::After => "after",
            Direction::Between => "between",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time range to search for arrivals in.
///
/// `Before` and `After` are open-ended. `Between` is the half-open range
/// `[start, end)`; callers are expected to pass `start <= end`.
///
/// Paging moves the *advancing edge* of a timing: the end of `Before`,
/// the start of `After` and `Between`. The end of `Between` never moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
    Before(NaiveDateTime),
    After(NaiveDateTime),
    Between(NaiveDateTime, NaiveDateTime),
}

/// Step used to move past an already delivered arrival.
fn step() -> Duration {
    Duration::seconds(1)
}

/// `t + by`, saturating at the ends of the calendar.
fn plus(t: NaiveDateTime, by: Duration) -> NaiveDateTime {
    t.checked_add_signed(by).unwrap_or(if by < Duration::zero() {
        NaiveDateTime::MIN
    } else {
        NaiveDateTime::MAX
    })
}

/// `t - by`, saturating at the ends of the calendar.
fn minus(t: NaiveDateTime, by: Duration) -> NaiveDateTime {
    t.checked_sub_signed(by).unwrap_or(if by < Duration::zero() {
        NaiveDateTime::MAX
    } else {
        NaiveDateTime::MIN
    })
}

impl Timing {
    pub fn direction(&self) -> Direction {
        match self {
            Timing::Before(_) => Direction::Before,
            Timing::After(_) => Direction::After,
            Timing::Between(..) => Direction::Between,
        }
    }

    /// The timestamps this timing sends to the server, in order.
    pub fn bounds(&self) -> Vec<NaiveDateTime> {
        match *self {
            Timing::Before(end) => vec![end],
            Timing::After(start) => vec![start],
            Timing::Between(start, end) => vec![start, end],
        }
    }

    /// Narrow the timing so none of `arrivals` can be returned again.
    ///
    /// An empty batch leaves the timing unchanged.
    pub fn excluding(&self, arrivals: &[Arrival]) -> Timing {
        self.excluding_etas(arrivals.iter().map(|a| a.eta))
    }

    /// Narrow the timing past a single arrival.
    pub fn excluding_arrival(&self, arrival: &Arrival) -> Timing {
        self.excluding_eta(arrival.eta)
    }

    /// Narrow the timing past the boundary of a batch of arrival times.
    ///
    /// The boundary is the earliest time when searching backwards and the
    /// latest otherwise, so the order of `etas` does not matter.
    pub fn excluding_etas<I>(&self, etas: I) -> Timing
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        let etas = etas.into_iter();
        let boundary = match self {
            Timing::Before(_) => etas.min(),
            Timing::After(_) | Timing::Between(..) => etas.max(),
        };
        match boundary {
            Some(eta) => self.excluding_eta(eta),
            None => *self,
        }
    }

    /// Narrow the timing past one arrival time.
    pub fn excluding_eta(&self, eta: NaiveDateTime) -> Timing {
        match *self {
            Timing::Before(_) => Timing::Before(minus(eta, step())),
            Timing::After(_) => Timing::After(plus(eta, step())),
            Timing::Between(_, end) => Timing::Between(plus(eta, step()), end),
        }
    }

    /// Move the advancing edge by `by`, backwards for `Before`.
    pub fn advanced_by(&self, by: Duration) -> Timing {
        match *self {
            Timing::Before(end) => Timing::Before(minus(end, by)),
            Timing::After(start) => Timing::After(plus(start, by)),
            Timing::Between(start, end) => Timing::Between(plus(start, by), end),
        }
    }

    /// The part of the timing within `window` of its advancing edge.
    pub fn clamped(&self, window: Duration) -> Timing {
        match *self {
            Timing::Before(end) => Timing::Between(minus(end, window), end),
            Timing::After(start) => Timing::Between(start, plus(start, window)),
            Timing::Between(start, end) => Timing::Between(start, end.min(plus(start, window))),
        }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        match *self {
            Timing::Before(end) => t < end,
            Timing::After(start) => t >= start,
            Timing::Between(start, end) => start <= t && t < end,
        }
    }

    /// Whether no instant is left to search.
    pub fn is_exhausted(&self) -> bool {
        matches!(*self, Timing::Between(start, end) if start >= end)
    }
}

/// Default look-ahead window, in seconds.
pub const DEFAULT_WINDOW_SECS: i64 = 3600;

/// Default size of the initial burst.
pub const DEFAULT_COUNT: usize = 5;

/// How much of a timetable to deliver up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    /// How far from the advancing edge an arrival may lie and still count
    /// as within the limit.
    pub window: Duration,
    /// Number of arrivals in the initial burst.
    pub count: usize,
}

impl Limit {
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Split `arrivals` at the first one outside the limit.
    ///
    /// The first part is the leading run of at most `count` arrivals whose
    /// eta falls within `window` of `timing`'s advancing edge. Everything
    /// from the first arrival that doesn't qualify onwards is returned as
    /// the second part.
    pub fn split<'a>(&self, arrivals: &'a [Arrival], timing: &Timing) -> (&'a [Arrival], &'a [Arrival]) {
        let at = self.split_index(arrivals.iter().map(|a| a.eta), timing);
        arrivals.split_at(at)
    }

    fn split_index<I>(&self, etas: I, timing: &Timing) -> usize
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        let window = timing.clamped(self.window);
        let mut len = 0;
        for (i, eta) in etas.into_iter().enumerate() {
            if i >= self.count || !window.contains(eta) {
                return i;
            }
            len = i + 1;
        }
        len
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self {
            window: Duration::seconds(DEFAULT_WINDOW_SECS),
            count: DEFAULT_COUNT,
        }
    }
}
