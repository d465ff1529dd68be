//! Local time handling
//!
//! Raids are announced and displayed in one fixed local time zone, stored as UTC.
//! Two textual forms exist: `HH:MM` for same-day raids and `DD.MM.YYYY HH:MM` for
//! scheduled ones.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::entities::RaidCategory;
use crate::error::{DomainError, DomainResult};

pub const TIME_FORMAT: &str = "%H:%M";
pub const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Source of the current instant
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time zone aware formatting, parsing and "now"
#[derive(Clone)]
pub struct TimeService {
    tz: Tz,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TimeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeService")
            .field("tz", &self.tz)
            .field("clock", &self.clock)
            .finish()
    }
}

impl TimeService {
    pub fn new(tz: Tz, clock: Arc<dyn Clock>) -> Self {
        Self { tz, clock }
    }

    /// Time service backed by the system clock
    pub fn system(tz: Tz) -> Self {
        Self::new(tz, Arc::new(SystemClock))
    }

    #[inline]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[inline]
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Local calendar date of an instant
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Today's local calendar date
    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }

    /// Resolve a local wall-clock reading to UTC
    ///
    /// Readings repeated by a DST fall-back resolve to the earlier instant; readings
    /// skipped by a spring-forward do not exist and yield `None`.
    pub fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// First instant of a local calendar day
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        // Midnight can fall into a DST gap in some zones; walk forward to the first valid hour.
        (0..3).find_map(|hour| self.to_utc(date.and_hms_opt(hour, 0, 0)?))
    }

    pub fn format_time(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.tz).format(TIME_FORMAT).to_string()
    }

    pub fn format_date_time(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz)
            .format(DATE_TIME_FORMAT)
            .to_string()
    }

    /// Format an event time the way its category displays it
    pub fn format_for(&self, category: RaidCategory, instant: DateTime<Utc>) -> String {
        match category {
            RaidCategory::Immediate => self.format_time(instant),
            RaidCategory::Scheduled => self.format_date_time(instant),
        }
    }

    /// Parse `HH:MM` as a time on the given local date
    pub fn parse_time_on(&self, token: &str, date: NaiveDate) -> DomainResult<DateTime<Utc>> {
        let token = token.trim();
        let time = NaiveTime::parse_from_str(token, TIME_FORMAT)
            .map_err(|_| DomainError::InvalidTime(token.to_string()))?;
        self.to_utc(date.and_time(time))
            .ok_or_else(|| DomainError::InvalidTime(token.to_string()))
    }

    /// Parse `DD.MM.YYYY HH:MM`
    pub fn parse_date_time(&self, token: &str) -> DomainResult<DateTime<Utc>> {
        let token = token.trim();
        let local = NaiveDateTime::parse_from_str(token, DATE_TIME_FORMAT)
            .map_err(|_| DomainError::InvalidTime(token.to_string()))?;
        self.to_utc(local)
            .ok_or_else(|| DomainError::InvalidTime(token.to_string()))
    }

    /// Parse a user-supplied token, deciding the raid category from its shape
    pub fn parse_token(&self, token: &str) -> DomainResult<(RaidCategory, DateTime<Utc>)> {
        if let Ok(instant) = self.parse_date_time(token) {
            return Ok((RaidCategory::Scheduled, instant));
        }
        self.parse_time_on(token, self.today())
            .map(|instant| (RaidCategory::Immediate, instant))
    }

    /// Next whole wall-clock minute strictly after `instant`
    pub fn next_minute_boundary(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        truncate_to_minute(instant) + Duration::minutes(1)
    }
}

/// Drop seconds and sub-second precision
pub fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .unwrap_or(instant)
}
