use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MULTI_DAY_START_HOUR: u32 = 9;
pub const MULTI_DAY_END_HOUR: u32 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
    AllDay,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 4] = [
        TimeSlot::Morning,
        TimeSlot::Afternoon,
        TimeSlot::Evening,
        TimeSlot::AllDay,
    ];

    pub fn hours(self) -> (u32, u32) {
        match self {
            TimeSlot::Morning => (9, 12),
            TimeSlot::Afternoon => (13, 16),
            TimeSlot::Evening => (17, 20),
            TimeSlot::AllDay => (9, 17),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeSlot::Morning => "MORNING",
            TimeSlot::Afternoon => "AFTERNOON",
            TimeSlot::Evening => "EVENING",
            TimeSlot::AllDay => "ALL_DAY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeSlot::Morning => "Morning (09:00-12:00)",
            TimeSlot::Afternoon => "Afternoon (13:00-16:00)",
            TimeSlot::Evening => "Evening (17:00-20:00)",
            TimeSlot::AllDay => "All day (09:00-17:00)",
        }
    }

    /// Lenient parse used for form input: anything unrecognised is `AllDay`.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or(TimeSlot::AllDay)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeSlot {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "MORNING" => Ok(TimeSlot::Morning),
            "AFTERNOON" => Ok(TimeSlot::Afternoon),
            "EVENING" => Ok(TimeSlot::Evening),
            "ALL_DAY" | "ALLDAY" => Ok(TimeSlot::AllDay),
            _ => Err(ScheduleError::UnknownSlot(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("unknown time slot '{0}'")]
    UnknownSlot(String),
}

/// Slot shown for a stored start instant. Depends on the hour only; the
/// 12:00-13:00 gap falls through to `AllDay`.
pub fn derive_slot_from_start(start: NaiveDateTime) -> TimeSlot {
    let hour = start.hour();
    if hour < 12 {
        TimeSlot::Morning
    } else if (13..17).contains(&hour) {
        TimeSlot::Afternoon
    } else if hour >= 17 {
        TimeSlot::Evening
    } else {
        TimeSlot::AllDay
    }
}

pub fn derive_times_from_slot(date: NaiveDate, slot: TimeSlot) -> Window {
    let (start_hour, end_hour) = slot.hours();
    Window {
        start: at_hour(date, start_hour),
        end: at_hour(date, end_hour),
    }
}

pub fn multi_day_window(start_date: NaiveDate, end_date: NaiveDate) -> Result<Window, ScheduleError> {
    if end_date < start_date {
        return Err(ScheduleError::EndBeforeStart {
            start: start_date,
            end: end_date,
        });
    }
    Ok(Window {
        start: at_hour(start_date, MULTI_DAY_START_HOUR),
        end: at_hour(end_date, MULTI_DAY_END_HOUR),
    })
}

pub fn is_multi_day(start: NaiveDateTime, end: NaiveDateTime) -> bool {
    start.date() != end.date()
}

fn at_hour(date: NaiveDate, hour: u32) -> NaiveDateTime {
    // Slot hours are all below 24, so the time is always valid.
    date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn is_multi_day(&self) -> bool {
        is_multi_day(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    SingleDay {
        date: NaiveDate,
        slot: TimeSlot,
    },
    MultiDay {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

impl Schedule {
    pub fn from_input(
        date: NaiveDate,
        end_date: Option<NaiveDate>,
        slot: Option<&str>,
    ) -> Self {
        match end_date {
            Some(end_date) if end_date != date => Schedule::MultiDay {
                start_date: date,
                end_date,
            },
            _ => Schedule::SingleDay {
                date,
                slot: slot.map(TimeSlot::parse_or_default).unwrap_or(TimeSlot::AllDay),
            },
        }
    }

    pub fn resolve(&self) -> Result<Window, ScheduleError> {
        match *self {
            Schedule::SingleDay { date, slot } => Ok(derive_times_from_slot(date, slot)),
            Schedule::MultiDay {
                start_date,
                end_date,
            } => multi_day_window(start_date, end_date),
        }
    }

    /// Re-derives the edit form from stored instants. Single-day windows that
    /// match a slot exactly map back to that slot; anything else uses the
    /// start-hour rule.
    pub fn from_window(window: &Window) -> Self {
        if window.is_multi_day() {
            return Schedule::MultiDay {
                start_date: window.start.date(),
                end_date: window.end.date(),
            };
        }

        let date = window.start.date();
        let slot = TimeSlot::ALL
            .into_iter()
            .find(|slot| derive_times_from_slot(date, *slot) == *window)
            .unwrap_or_else(|| derive_slot_from_start(window.start));
        Schedule::SingleDay { date, slot }
    }
}
