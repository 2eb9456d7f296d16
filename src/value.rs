//! # C1 — decoded value types
//!
//! Tagged variants for every decoded scalar/string/bit-array/temporal the
//! codec can produce, per `spec.md` §3/§4.1. The `valid` flag on each
//! variant distinguishes a well-formed sensor-invalid marker from a parse
//! error (§7) — a parse error never reaches this type, it short-circuits
//! the whole record.
//!
//! `Temporal`'s conversions to `chrono` types and its `Display` are
//! supplemented from `examples/original_source/src/mbusmaster/protocol/value.py`
//! (`ValueTemporal`), which `spec.md` leaves open beyond "defined only when
//! fully specified" (see `SPEC_FULL.md` §5).

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// A decoded record value. Equality between two invalid values of the same
/// variant holds regardless of their (meaningless) payload; equality
/// between a valid and an invalid value of the same variant is false even
/// if the payloads happen to coincide.
#[derive(Debug, Clone)]
pub enum Value {
    Integer { valid: bool, n: i64 },
    Float { valid: bool, x: f64 },
    String { valid: bool, s: String },
    Bits { valid: bool, bits: Vec<bool> },
    Temporal(Temporal),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Integer { valid: false, .. }, Integer { valid: false, .. }) => true,
            (Integer { valid: v1, n: n1 }, Integer { valid: v2, n: n2 }) => v1 == v2 && n1 == n2,
            (Float { valid: false, .. }, Float { valid: false, .. }) => true,
            (Float { valid: v1, x: x1 }, Float { valid: v2, x: x2 }) => v1 == v2 && x1 == x2,
            (String { valid: false, .. }, String { valid: false, .. }) => true,
            (String { valid: v1, s: s1 }, String { valid: v2, s: s2 }) => v1 == v2 && s1 == s2,
            (Bits { valid: false, .. }, Bits { valid: false, .. }) => true,
            (Bits { valid: v1, bits: b1 }, Bits { valid: v2, bits: b2 }) => v1 == v2 && b1 == b2,
            (Temporal(t1), Temporal(t2)) => t1 == t2,
            _ => false,
        }
    }
}

impl Value {
    pub fn invalid_integer() -> Self {
        Value::Integer { valid: false, n: 0 }
    }

    pub fn invalid_float() -> Self {
        Value::Float { valid: false, x: 0.0 }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Value::Integer { valid, .. }
            | Value::Float { valid, .. }
            | Value::String { valid, .. }
            | Value::Bits { valid, .. } => *valid,
            Value::Temporal(t) => t.valid,
        }
    }
}

/// A date/time/duration value. Exactly one of [`TemporalShape::Component`]
/// or [`TemporalShape::Epoch`] is populated, per `spec.md` §3.
#[derive(Debug, Clone, PartialEq)]
pub struct Temporal {
    pub valid: bool,
    pub shape: TemporalShape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemporalShape {
    Component(ComponentTemporal),
    Epoch(EpochTemporal),
}

/// Recurring-pattern sentinels, preserved literally rather than rejected:
/// month=15 "every month", day=0 "every day", hour=31 "every hour",
/// minute=63 "every minute", second=63 "every second", year_2digit=127
/// "every year".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComponentTemporal {
    pub year_2digit: Option<u8>,
    pub year_full: Option<i32>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub second: Option<f64>,
    pub is_summer_time: Option<bool>,
    pub day_of_week: Option<u8>,
    pub week: Option<u8>,
    pub is_leap_year: Option<bool>,
    pub daylight_savings_deviation: Option<i8>,
}

/// `utc_offset_hours = -16` marks this as a duration rather than an
/// absolute timestamp (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochTemporal {
    pub epoch_seconds: f64,
    pub utc_offset_hours: i32,
    pub resolution_seconds: f64,
    pub epoch_start: EpochStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochStart {
    /// 2013-01-01T00:00:00Z
    Y2013,
    /// 1970-01-01T00:00:00Z (Unix epoch)
    Y1970,
}

pub const DURATION_UTC_OFFSET: i32 = -16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("conversion not defined for this temporal value")]
pub struct ConversionNotDefined;

impl Temporal {
    pub fn invalid_component() -> Self {
        Temporal {
            valid: false,
            shape: TemporalShape::Component(ComponentTemporal::default()),
        }
    }

    pub fn component(valid: bool, c: ComponentTemporal) -> Self {
        Temporal {
            valid,
            shape: TemporalShape::Component(c),
        }
    }

    pub fn epoch(valid: bool, e: EpochTemporal) -> Self {
        Temporal {
            valid,
            shape: TemporalShape::Epoch(e),
        }
    }

    pub fn is_component_based(&self) -> bool {
        matches!(self.shape, TemporalShape::Component(_))
    }

    pub fn is_epoch_based(&self) -> bool {
        matches!(self.shape, TemporalShape::Epoch(_))
    }

    fn component(&self) -> Option<&ComponentTemporal> {
        match &self.shape {
            TemporalShape::Component(c) => Some(c),
            TemporalShape::Epoch(_) => None,
        }
    }

    fn epoch(&self) -> Option<&EpochTemporal> {
        match &self.shape {
            TemporalShape::Epoch(e) => Some(e),
            TemporalShape::Component(_) => None,
        }
    }

    pub fn is_every_year(&self) -> bool {
        self.component().and_then(|c| c.year_2digit) == Some(127)
    }

    pub fn is_every_month(&self) -> bool {
        self.component().and_then(|c| c.month) == Some(15)
    }

    pub fn is_every_day(&self) -> bool {
        self.component().and_then(|c| c.day) == Some(0)
    }

    pub fn is_every_hour(&self) -> bool {
        self.component().and_then(|c| c.hour) == Some(31)
    }

    pub fn is_every_minute(&self) -> bool {
        self.component().and_then(|c| c.minute) == Some(63)
    }

    pub fn is_every_second(&self) -> bool {
        match self.component().and_then(|c| c.second) {
            Some(s) => s == 63.0,
            None => false,
        }
    }

    pub fn has_date(&self) -> bool {
        match self.component() {
            Some(c) => c.year_2digit.is_some() || c.month.is_some() || c.day.is_some(),
            None => false,
        }
    }

    pub fn has_time(&self) -> bool {
        match self.component() {
            Some(c) => c.hour.is_some() || c.minute.is_some() || c.second.is_some(),
            None => false,
        }
    }

    /// Valid and, for component shapes, free of every recurring-pattern
    /// sentinel. Epoch shapes are fully specified whenever valid.
    pub fn is_fully_specified(&self) -> bool {
        if !self.valid {
            return false;
        }
        if self.is_epoch_based() {
            return true;
        }
        !(self.is_every_year()
            || self.is_every_month()
            || self.is_every_day()
            || self.is_every_hour()
            || self.is_every_minute()
            || self.is_every_second())
    }

    pub fn is_duration(&self) -> bool {
        match self.epoch() {
            Some(e) => e.utc_offset_hours == DURATION_UTC_OFFSET,
            None => false,
        }
    }

    fn starting_epoch(&self) -> Option<NaiveDateTime> {
        let e = self.epoch()?;
        let date = match e.epoch_start {
            EpochStart::Y2013 => NaiveDate::from_ymd_opt(2013, 1, 1)?,
            EpochStart::Y1970 => NaiveDate::from_ymd_opt(1970, 1, 1)?,
        };
        Some(date.and_hms_opt(0, 0, 0)?)
    }

    /// Converts to an absolute host date-time. Defined only when
    /// `is_fully_specified()` and (for component shapes) both a date and a
    /// time are present, or (for epoch shapes) the value is not a duration.
    pub fn to_datetime(&self) -> Result<NaiveDateTime, ConversionNotDefined> {
        if !self.is_fully_specified() {
            return Err(ConversionNotDefined);
        }
        if let Some(e) = self.epoch() {
            if self.is_duration() {
                return Err(ConversionNotDefined);
            }
            let start = self.starting_epoch().ok_or(ConversionNotDefined)?;
            let whole = e.epoch_seconds.trunc() as i64;
            let nanos = ((e.epoch_seconds.fract()) * 1e9).round() as i64;
            let dt = start + Duration::seconds(whole) + Duration::nanoseconds(nanos);
            // Note: utc_offset_hours is an attribute of the source reading;
            // the instant itself is captured in UTC here, matching the
            // component shape's offset-naive representation.
            return Ok(dt);
        }
        let c = self.component().ok_or(ConversionNotDefined)?;
        if !(self.has_date() && self.has_time()) {
            return Err(ConversionNotDefined);
        }
        let date = NaiveDate::from_ymd_opt(
            c.year_full.ok_or(ConversionNotDefined)?,
            c.month.ok_or(ConversionNotDefined)? as u32,
            c.day.ok_or(ConversionNotDefined)? as u32,
        )
        .ok_or(ConversionNotDefined)?;
        let second = c.second.unwrap_or(0.0);
        let time = NaiveTime::from_hms_milli_opt(
            c.hour.ok_or(ConversionNotDefined)? as u32,
            c.minute.ok_or(ConversionNotDefined)? as u32,
            second.trunc() as u32,
            (second.fract() * 1000.0).round() as u32,
        )
        .ok_or(ConversionNotDefined)?;
        Ok(NaiveDateTime::new(date, time))
    }

    pub fn to_date(&self) -> Result<NaiveDate, ConversionNotDefined> {
        if !self.is_component_based() || !self.is_fully_specified() || !self.has_date() {
            return Err(ConversionNotDefined);
        }
        let c = self.component().ok_or(ConversionNotDefined)?;
        NaiveDate::from_ymd_opt(
            c.year_full.ok_or(ConversionNotDefined)?,
            c.month.ok_or(ConversionNotDefined)? as u32,
            c.day.ok_or(ConversionNotDefined)? as u32,
        )
        .ok_or(ConversionNotDefined)
    }

    pub fn to_time(&self) -> Result<NaiveTime, ConversionNotDefined> {
        if !self.is_component_based() || !self.is_fully_specified() || !self.has_time() {
            return Err(ConversionNotDefined);
        }
        let c = self.component().ok_or(ConversionNotDefined)?;
        let second = c.second.unwrap_or(0.0);
        NaiveTime::from_hms_milli_opt(
            c.hour.ok_or(ConversionNotDefined)? as u32,
            c.minute.ok_or(ConversionNotDefined)? as u32,
            second.trunc() as u32,
            (second.fract() * 1000.0).round() as u32,
        )
        .ok_or(ConversionNotDefined)
    }

    /// Converts to a host duration. Defined only for epoch shapes marked
    /// `is_duration()`.
    pub fn to_duration(&self) -> Result<Duration, ConversionNotDefined> {
        if !self.valid || !self.is_duration() {
            return Err(ConversionNotDefined);
        }
        let e = self.epoch().ok_or(ConversionNotDefined)?;
        let whole = e.epoch_seconds.trunc() as i64;
        let nanos = (e.epoch_seconds.fract() * 1e9).round() as i64;
        Ok(Duration::seconds(whole) + Duration::nanoseconds(nanos))
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(e) = self.epoch() {
            if self.is_duration() {
                return write!(f, "Duration: {}s (res={}s)", e.epoch_seconds, e.resolution_seconds);
            }
            return match self.to_datetime() {
                Ok(dt) => write!(
                    f,
                    "{} (UTC{:+}, res={}s)",
                    dt, e.utc_offset_hours, e.resolution_seconds
                ),
                Err(_) => write!(f, "<invalid epoch time>"),
            };
        }

        let c = match self.component() {
            Some(c) => c,
            None => return write!(f, "<empty>"),
        };
        let mut parts = Vec::new();
        if self.has_date() {
            let year = if self.is_every_year() {
                "*".to_string()
            } else {
                c.year_full.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string())
            };
            let month = if self.is_every_month() {
                "*".to_string()
            } else {
                c.month.map(|m| format!("{m:02}")).unwrap_or_else(|| "?".to_string())
            };
            let day = if self.is_every_day() {
                "*".to_string()
            } else {
                c.day.map(|d| format!("{d:02}")).unwrap_or_else(|| "?".to_string())
            };
            parts.push(format!("{year}-{month}-{day}"));
        }
        if self.has_time() {
            let hour = if self.is_every_hour() {
                "*".to_string()
            } else {
                c.hour.map(|h| format!("{h:02}")).unwrap_or_else(|| "?".to_string())
            };
            let minute = if self.is_every_minute() {
                "*".to_string()
            } else {
                c.minute.map(|m| format!("{m:02}")).unwrap_or_else(|| "?".to_string())
            };
            match c.second {
                Some(_) if self.is_every_second() => parts.push(format!("{hour}:{minute}:*")),
                Some(s) => parts.push(format!("{hour}:{minute}:{s:06.3}")),
                None => parts.push(format!("{hour}:{minute}")),
            }
        }
        if parts.is_empty() {
            write!(f, "<empty>")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}
