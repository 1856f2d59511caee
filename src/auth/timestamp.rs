//! Signature timestamps and the freshness window.
//!
//! Every signed request carries the time it was signed, in UTC with second
//! precision:
//!
//! ```text
//! YYYY-MM-DDTHH:MM:SSZ        e.g. 2017-05-14T17:54:16Z
//! ```
//!
//! A signature is only accepted while its timestamp is younger than the
//! freshness window, which bounds how long a captured request can be replayed.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::AuthError;

/// Default freshness window: 5 minutes.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5 * 60);

/// Length of a well-formed timestamp, `YYYY-MM-DDTHH:MM:SSZ`.
const TIMESTAMP_LEN: usize = 20;

/// A point in time, UTC, truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Parse the wire format strictly.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedTimestamp`] for anything other than
    /// `YYYY-MM-DDTHH:MM:SSZ` with in-range fields.
    ///
    /// # Example
    ///
    /// ```rust
    /// use signed_request_auth::auth::Timestamp;
    ///
    /// let ts = Timestamp::parse("2017-05-14T17:54:16Z").unwrap();
    /// assert_eq!(ts.to_string(), "2017-05-14T17:54:16Z");
    /// assert!(Timestamp::parse("2017-05-14 17:54:16").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, AuthError> {
        if text.len() != TIMESTAMP_LEN || !text.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(AuthError::MalformedTimestamp);
        }

        PrimitiveDateTime::parse(
            text,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"),
        )
        .map(|datetime| Self(datetime.assume_utc()))
        .map_err(|_| AuthError::MalformedTimestamp)
    }

    /// Convert any instant, dropping the offset and sub-second part.
    pub fn from_datetime(datetime: OffsetDateTime) -> Self {
        let utc = datetime.to_offset(UtcOffset::UTC);
        Self(utc - time::Duration::nanoseconds(i64::from(utc.nanosecond())))
    }

    /// The current time according to `clock`.
    pub fn now(clock: &dyn Clock) -> Self {
        Self::from_datetime(clock.now())
    }

    /// Seconds since the UNIX epoch.
    pub fn unix_timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// The underlying date-time.
    pub fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = self.0;
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        )
    }
}

/// Decides whether a signature timestamp is recent enough to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampPolicy {
    max_age: Duration,
}

impl TimestampPolicy {
    /// Create a policy with the given window.
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    /// Width of the freshness window.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Window width in whole minutes, as reported to clients.
    pub fn max_age_minutes(&self) -> u64 {
        self.max_age.as_secs() / 60
    }

    /// True iff `0 <= now - timestamp < max_age`, at second resolution.
    ///
    /// Timestamps later than `now` are never fresh.
    pub fn is_fresh(&self, timestamp: Timestamp, now: OffsetDateTime) -> bool {
        let age = now.unix_timestamp() - timestamp.unix_timestamp();
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        (0..max_age).contains(&age)
    }

    /// Like [`is_fresh`](Self::is_fresh), reporting failure as an error.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ExpiredTimestamp`] when the timestamp is stale or
    /// in the future.
    pub fn check(&self, timestamp: Timestamp, now: OffsetDateTime) -> Result<(), AuthError> {
        if self.is_fresh(timestamp, now) {
            Ok(())
        } else {
            Err(AuthError::ExpiredTimestamp {
                max_age_minutes: self.max_age_minutes(),
            })
        }
    }
}

impl Default for TimestampPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

/// Source of the current time.
///
/// Signing uses it to stamp requests; verification uses it to judge
/// freshness. Swap in a [`ManualClock`] to control time in tests.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that only moves when told to, with one-second resolution.
#[derive(Debug)]
pub struct ManualClock {
    unix_seconds: AtomicI64,
}

impl ManualClock {
    /// Start the clock at `start`.
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            unix_seconds: AtomicI64::new(start.unix_timestamp()),
        }
    }

    /// Start the clock at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let secs = i64::try_from(by.as_secs()).unwrap_or(i64::MAX);
        self.unix_seconds.fetch_add(secs, Ordering::SeqCst);
    }

    /// Move the clock backward.
    pub fn rewind(&self, by: Duration) {
        let secs = i64::try_from(by.as_secs()).unwrap_or(i64::MAX);
        self.unix_seconds.fetch_sub(secs, Ordering::SeqCst);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, to: OffsetDateTime) {
        self.unix_seconds.store(to.unix_timestamp(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.unix_seconds.load(Ordering::SeqCst))
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}
