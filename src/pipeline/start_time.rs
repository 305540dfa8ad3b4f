use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use crate::error::{BqFlowError, Result};

/// `%.f` prints nothing for whole seconds and 3, 6 or 9 digits otherwise.
pub const START_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Timezone-aware instant from which a pipeline starts being scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTime {
    at: DateTime<FixedOffset>,
    timezone: Option<Tz>,
}

impl StartTime {
    pub fn utc(at: DateTime<Utc>) -> Self {
        Self {
            at: at.fixed_offset(),
            timezone: Some(Tz::UTC),
        }
    }

    pub fn in_zone(at: DateTime<Tz>) -> Self {
        Self {
            timezone: Some(at.timezone()),
            at: at.fixed_offset(),
        }
    }

    /// A start time carrying only an offset, no named zone.
    pub fn fixed(at: DateTime<FixedOffset>) -> Self {
        Self { at, timezone: None }
    }

    pub fn from_timestamp(secs: i64, timezone: &str) -> Result<Self> {
        let tz = parse_timezone(timezone)?;
        let at = tz.timestamp_opt(secs, 0).single().ok_or_else(|| {
            BqFlowError::InvalidStartTime(format!("timestamp {} is out of range", secs))
        })?;
        Ok(Self::in_zone(at))
    }

    /// Parses an offset-carrying timestamp; when `timezone` is given the instant is
    /// expressed in that zone.
    pub fn parse(s: &str, timezone: Option<&str>) -> Result<Self> {
        let at = DateTime::parse_from_str(s, START_TIME_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(s))
            .map_err(|_| {
                if NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok() {
                    BqFlowError::InvalidStartTime(format!("'{}' has no timezone information", s))
                } else {
                    BqFlowError::InvalidStartTime(format!("'{}' is not a valid timestamp", s))
                }
            })?;

        match timezone {
            Some(name) => {
                let tz = parse_timezone(name)?;
                Ok(Self::in_zone(at.with_timezone(&tz)))
            }
            None => Ok(Self::fixed(at)),
        }
    }

    pub fn at(&self) -> DateTime<FixedOffset> {
        self.at
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }

    pub fn timezone_name(&self) -> Option<&'static str> {
        self.timezone.map(|tz| tz.name())
    }

    pub fn format(&self) -> String {
        self.at.format(START_TIME_FORMAT).to_string()
    }
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| BqFlowError::InvalidTimezone(format!("unknown timezone '{}'", name)))
}
