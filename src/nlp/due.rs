//! Due-expression extraction.
//!
//! Pulls a single time reference out of free text. Two independent signals
//! are scanned for: a clock time (`7am`, `6:30 pm`) and the relative-day
//! token `tomorrow`. Precedence, most specific first:
//!
//! | clock | tomorrow | result           |
//! |-------|----------|------------------|
//! | yes   | yes      | `tomorrow 6pm`   |
//! | yes   | no       | `6pm`            |
//! | no    | yes      | `tomorrow`       |
//! | no    | no       | none             |
//!
//! Only the first clock match in the string is considered.

use std::fmt;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

static RE_CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s?(am|pm)\b").unwrap()
});

/// Hour used when only a day is given.
const DEFAULT_DAY_HOUR: u32 = 9;

/// Morning or afternoon half of a 12-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meridiem {
    Am,
    Pm,
}

/// A 12-hour clock time, always in range (hour 1–12, minute 0–59).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
    pub meridiem: Meridiem,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8, meridiem: Meridiem) -> Option<Self> {
        if (1..=12).contains(&hour) && minute < 60 {
            Some(Self {
                hour,
                minute,
                meridiem,
            })
        } else {
            None
        }
    }

    /// 24-hour wall-clock time.
    pub fn to_naive_time(self) -> NaiveTime {
        let hour = match (self.meridiem, self.hour) {
            (Meridiem::Am, 12) => 0,
            (Meridiem::Am, h) => h,
            (Meridiem::Pm, 12) => 12,
            (Meridiem::Pm, h) => h + 12,
        };
        NaiveTime::from_hms_opt(u32::from(hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.meridiem {
            Meridiem::Am => "am",
            Meridiem::Pm => "pm",
        };
        if self.minute == 0 {
            write!(f, "{}{suffix}", self.hour)
        } else {
            write!(f, "{}:{:02}{suffix}", self.hour, self.minute)
        }
    }
}

/// A recognized time reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DueExpr {
    /// `"7am"`, a bare clock time.
    Clock(ClockTime),
    /// `"tomorrow 6pm"`.
    TomorrowAt(ClockTime),
    /// `"tomorrow"` with no clock time.
    Tomorrow,
}

impl DueExpr {
    /// Resolve to an absolute timestamp relative to `now`.
    ///
    /// A bare clock time means today, rolled forward a day if it has already
    /// passed. A bare `tomorrow` lands at 09:00.
    pub fn resolve(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        let tomorrow = today + Duration::days(1);
        match self {
            Self::Clock(clock) => {
                let candidate = today.and_time(clock.to_naive_time());
                if candidate <= now {
                    tomorrow.and_time(clock.to_naive_time())
                } else {
                    candidate
                }
            }
            Self::TomorrowAt(clock) => tomorrow.and_time(clock.to_naive_time()),
            Self::Tomorrow => tomorrow
                .and_hms_opt(DEFAULT_DAY_HOUR, 0, 0)
                .unwrap_or_else(|| tomorrow.and_time(NaiveTime::MIN)),
        }
    }
}

impl fmt::Display for DueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clock(clock) => write!(f, "{clock}"),
            Self::TomorrowAt(clock) => write!(f, "tomorrow {clock}"),
            Self::Tomorrow => f.write_str("tomorrow"),
        }
    }
}

/// Extract the due expression from `text`.
pub fn extract_due(text: &str) -> Option<DueExpr> {
    let lower = text.to_lowercase();
    let clock = first_clock(&lower);
    let tomorrow = has_token(&lower, "tomorrow");

    match (clock, tomorrow) {
        (Some(clock), true) => Some(DueExpr::TomorrowAt(clock)),
        (Some(clock), false) => Some(DueExpr::Clock(clock)),
        (None, true) => Some(DueExpr::Tomorrow),
        (None, false) => None,
    }
}

/// The first clock-pattern match, if it is a valid 12-hour time.
fn first_clock(lower: &str) -> Option<ClockTime> {
    let caps = RE_CLOCK.captures(lower)?;
    let hour: u8 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u8 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let meridiem = match caps.get(3)?.as_str() {
        "am" => Meridiem::Am,
        _ => Meridiem::Pm,
    };
    ClockTime::new(hour, minute, meridiem)
}

fn has_token(lower: &str, token: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn tomorrow_and_clock_combine() {
        let due = extract_due("meeting tomorrow at 6pm").unwrap();
        assert_eq!(due.to_string(), "tomorrow 6pm");
    }

    #[test]
    fn bare_clock_time() {
        assert_eq!(extract_due("gym at 7am").unwrap().to_string(), "7am");
        assert_eq!(
            extract_due("Call at 6:30 PM").unwrap().to_string(),
            "6:30pm"
        );
    }

    #[test]
    fn bare_tomorrow() {
        assert_eq!(extract_due("dentist tomorrow"), Some(DueExpr::Tomorrow));
    }

    #[test]
    fn nothing_recognized() {
        assert_eq!(extract_due("buy milk"), None);
        // "tomorrows" is not the token.
        assert_eq!(extract_due("plan tomorrows menu"), None);
    }

    #[test]
    fn only_first_clock_counts() {
        let due = extract_due("9am standup then 3pm review").unwrap();
        assert_eq!(due.to_string(), "9am");
    }

    #[test]
    fn out_of_range_first_match_yields_no_clock() {
        assert_eq!(extract_due("at 13pm"), None);
        assert_eq!(extract_due("at 13pm tomorrow"), Some(DueExpr::Tomorrow));
    }

    #[test]
    fn clock_converts_to_24h() {
        let noon = ClockTime::new(12, 0, Meridiem::Pm).unwrap();
        let midnight = ClockTime::new(12, 0, Meridiem::Am).unwrap();
        assert_eq!(noon.to_naive_time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(midnight.to_naive_time(), NaiveTime::MIN);
    }

    #[test]
    fn clock_later_today_stays_today() {
        let now = at(10, 8, 0);
        let due = extract_due("gym at 7pm").unwrap().resolve(now);
        assert_eq!(due, at(10, 19, 0));
    }

    #[test]
    fn clock_already_passed_rolls_to_tomorrow() {
        let now = at(10, 20, 0);
        let due = extract_due("gym at 7pm").unwrap().resolve(now);
        assert_eq!(due, at(11, 19, 0));
    }

    #[test]
    fn tomorrow_defaults_to_nine() {
        let now = at(10, 20, 0);
        assert_eq!(DueExpr::Tomorrow.resolve(now), at(11, 9, 0));
        let due = extract_due("meeting tomorrow at 6pm").unwrap().resolve(now);
        assert_eq!(due, at(11, 18, 0));
    }
}
