use crate::sample::{Sample, UserCount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Two weeks of hourly samples.
pub const HISTORY_LENGTH: usize = 336;

/// Chronological series of samples for one software platform.
///
/// Serialized as a bare JSON array. Samples need not be evenly spaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<Sample>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.0
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.0.last()
    }

    /// Append `sample` and drop the oldest entries beyond `max`.
    ///
    /// Returns how many samples were dropped.
    pub fn push_bounded(&mut self, sample: Sample, max: usize) -> usize {
        self.0.push(sample);
        let overflow = self.0.len().saturating_sub(max);
        if overflow > 0 {
            self.0.drain(..overflow);
        }
        overflow
    }

    /// Sample nearest in time to `target`.
    ///
    /// Linear scan; when two samples are equally close the earlier one wins.
    pub fn closest(&self, target: DateTime<Utc>) -> Option<&Sample> {
        // `min_by_key` keeps the first of equal minima.
        self.0.iter().min_by_key(|s| (s.date - target).abs())
    }

    /// Change in `total` against the sample `interval` positions before the latest.
    ///
    /// With too little history (`interval >= len`) all growth is attributed to
    /// the window and the latest total is returned. An empty history yields 0.
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use threadcount_history::{History, Sample, UserCount};
    ///
    /// let start = Utc::now();
    /// let mut h = History::new();
    /// for (i, total) in [100, 150, 170].into_iter().enumerate() {
    ///     h.push_bounded(Sample::new(start + Duration::hours(i as i64), UserCount::new(total, 0)), 10);
    /// }
    /// assert_eq!(h.diff(2), 70);
    /// assert_eq!(h.diff(5), 170);
    /// ```
    pub fn diff(&self, interval: usize) -> i64 {
        let Some(today) = self.latest() else {
            return 0;
        };
        let today = today.users.total as i64;
        if self.0.len() <= interval {
            return today;
        }
        let past = self.0[self.0.len() - 1 - interval].users.total as i64;
        today - past
    }
}

impl From<Vec<Sample>> for History {
    fn from(samples: Vec<Sample>) -> Self {
        History(samples)
    }
}

/// Sum of the latest sample of every history; empty histories count as zero.
pub fn combined_latest<'a, I>(histories: I) -> UserCount
where
    I: IntoIterator<Item = &'a History>,
{
    histories
        .into_iter()
        .filter_map(|h| h.latest().map(|s| s.users))
        .sum()
}

/// Change of the combined total since `target`.
///
/// Each history contributes its sample closest to `target`; a history with no
/// samples contributes 0 to both sides.
pub fn diff_since<'a, I>(histories: I, target: DateTime<Utc>) -> i64
where
    I: IntoIterator<Item = &'a History>,
{
    let (now, then) = histories
        .into_iter()
        .fold((0i64, 0i64), |(now, then), h| {
            let latest = h.latest().map_or(0, |s| s.users.total as i64);
            let past = h.closest(target).map_or(0, |s| s.users.total as i64);
            (now + latest, then + past)
        });
    now - then
}
