use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid timestamp '{0}' (expected RFC 3339, 'YYYY-MM-DD HH:MM:SS' or 'YYYY-MM-DD')")]
    InvalidTimestamp(String),
    #[error("range start {start} is after range end {end}")]
    Inverted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Inclusive `[start, end]` window in UTC. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self, RangeError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(RangeError::Inverted { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// Parse optional textual bounds. Blank strings count as absent.
    ///
    /// A date-only end bound covers the whole day, so `2025-01-31` includes
    /// anything stamped on the 31st.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, RangeError> {
        let start = start
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, Bound::Start))
            .transpose()?;
        let end = end
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, Bound::End))
            .transpose()?;
        Self::new(start, end)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if at < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if at > end {
                return false;
            }
        }
        true
    }

    /// Human readable period, e.g. `2025-01-01 to present`.
    pub fn describe(&self) -> String {
        let start = self
            .start
            .map(|s| s.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "beginning".to_string());
        let end = self
            .end
            .map(|e| e.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "present".to_string());
        format!("{} to {}", start, end)
    }
}

fn parse_bound(raw: &str, bound: Bound) -> Result<DateTime<Utc>, RangeError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Naive timestamps are taken as UTC.
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ndt.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let time = match bound {
            Bound::Start => NaiveTime::MIN,
            Bound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
                .unwrap_or(NaiveTime::MIN),
        };
        return Ok(date.and_time(time).and_utc());
    }

    Err(RangeError::InvalidTimestamp(raw.to_string()))
}
