#![forbid(unsafe_code)]

use crate::model::{ProcurementItem, TimestampMs};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{OffsetDateTime, Time, UtcOffset};

const DAY_MS: TimestampMs = 24 * 60 * 60 * 1000;

/// The instant a computation runs at, plus the local offset that defines
/// where "today" begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Now {
    pub ms: TimestampMs,
    pub offset: UtcOffset,
}

impl Now {
    pub fn utc(ms: TimestampMs) -> Self {
        Self {
            ms,
            offset: UtcOffset::UTC,
        }
    }

    pub fn with_offset(ms: TimestampMs, offset: UtcOffset) -> Self {
        Self { ms, offset }
    }

    /// Local midnight at the start of the current day, as epoch ms.
    pub fn local_midnight(self) -> TimestampMs {
        let nanos = i128::from(self.ms) * 1_000_000;
        let Ok(dt) = OffsetDateTime::from_unix_timestamp_nanos(nanos) else {
            return 0;
        };
        let midnight = dt.to_offset(self.offset).replace_time(Time::MIDNIGHT);
        let ms = midnight.unix_timestamp_nanos() / 1_000_000;
        i64::try_from(ms).unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "today")]
    Today,
    #[serde(rename = "7days")]
    Last7Days,
    #[serde(rename = "30days")]
    Last30Days,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Today => "today",
            TimeRange::Last7Days => "7days",
            TimeRange::Last30Days => "30days",
            TimeRange::All => "all",
        }
    }

    /// Inclusive lower bound; `None` means unbounded.
    pub fn start_ms(self, now: Now) -> Option<TimestampMs> {
        match self {
            TimeRange::Today => Some(now.local_midnight()),
            TimeRange::Last7Days => Some(now.ms - 7 * DAY_MS),
            TimeRange::Last30Days => Some(now.ms - 30 * DAY_MS),
            TimeRange::All => None,
        }
    }

    /// Filters on the instant the item was requested.
    pub fn contains(self, item: &ProcurementItem, now: Now) -> bool {
        match self.start_ms(now) {
            None => true,
            Some(start) => item.requested_at() >= start,
        }
    }
}

impl FromStr for TimeRange {
    type Err = crate::model::UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "today" => Ok(TimeRange::Today),
            "7days" | "week" => Ok(TimeRange::Last7Days),
            "30days" | "month" => Ok(TimeRange::Last30Days),
            "all" => Ok(TimeRange::All),
            other => Err(crate::model::UnknownVariant {
                kind: "time range",
                raw: other.to_string(),
            }),
        }
    }
}
