//! Date ranges for selecting which daily notes a run considers.
//!
//! This module provides [`Scope`], the named window policy chosen by the
//! user, and [`DateRange`], the inclusive `[start, end]` window it resolves
//! to for a given "today".

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Named date-window policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// Only today's note.
    #[default]
    Today,
    /// Monday through Sunday of the current week.
    ThisWeek,
    /// First through last day of the current month.
    ThisMonth,
    /// From the last processed date through today.
    SinceLastRun,
    /// An explicit inclusive range. Missing or inverted bounds fall back to today.
    Range {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// Every dated note.
    All,
}

impl Scope {
    /// Creates an explicit range scope.
    pub fn range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self::Range { start, end }
    }

    /// Returns true if this is a well-formed explicit range (or not a range at all).
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Range {
                start: Some(start),
                end: Some(end),
            } => start <= end,
            Self::Range { .. } => false,
            _ => true,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Today => f.write_str("today"),
            Self::ThisWeek => f.write_str("this-week"),
            Self::ThisMonth => f.write_str("this-month"),
            Self::SinceLastRun => f.write_str("since-last-run"),
            Self::All => f.write_str("all"),
            Self::Range { start, end } => {
                let show = |d: &Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
                write!(f, "{}..{}", show(start), show(end))
            }
        }
    }
}

/// Error for unrecognised scope strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scope '{0}' (expected today, this-week, this-month, since-last-run, all or YYYY-MM-DD..YYYY-MM-DD)")]
pub struct ParseScopeError(pub String);

impl FromStr for Scope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "today" => Ok(Self::Today),
            "this-week" | "week" => Ok(Self::ThisWeek),
            "this-month" | "month" => Ok(Self::ThisMonth),
            "since-last-run" | "since-last" => Ok(Self::SinceLastRun),
            "all" => Ok(Self::All),
            other => {
                if let Some((start, end)) = other.split_once("..") {
                    Ok(Self::Range {
                        start: parse_date(start),
                        end: parse_date(end),
                    })
                } else if let Some(date) = parse_date(other) {
                    Ok(Self::Range {
                        start: Some(date),
                        end: Some(date),
                    })
                } else {
                    Err(ParseScopeError(s.to_string()))
                }
            }
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// An inclusive date window with a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the window (inclusive).
    pub start: NaiveDate,
    /// Last day of the window (inclusive).
    pub end: NaiveDate,
    /// Name of the scope that produced this window.
    pub label: String,
}

impl DateRange {
    /// Creates a new date range.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate, label: impl Into<String>) -> Self {
        assert!(start <= end, "DateRange start must be <= end");
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Creates a single-day range.
    pub fn day(date: NaiveDate, label: impl Into<String>) -> Self {
        Self::new(date, date, label)
    }

    /// Checks if a date falls within this range (both ends inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == NaiveDate::MIN && self.end == NaiveDate::MAX {
            write!(f, "{} (all dates)", self.label)
        } else {
            write!(f, "{} ({} .. {})", self.label, self.start, self.end)
        }
    }
}

/// Resolves a scope against `today`.
///
/// `last_processed` is the most recent processed date across tracked notes;
/// it only matters for [`Scope::SinceLastRun`], whose end is clamped to today.
pub fn resolve_range(scope: Scope, today: NaiveDate, last_processed: Option<NaiveDate>) -> DateRange {
    match scope {
        Scope::Today => DateRange::day(today, "today"),
        Scope::ThisWeek => {
            let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
            DateRange::new(monday, monday + Duration::days(6), "this-week")
        }
        Scope::ThisMonth => {
            let first = today.with_day(1).unwrap_or(today);
            let next_month = if first.month() == 12 {
                NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
            };
            let last = next_month
                .and_then(|d| d.pred_opt())
                .unwrap_or(today);
            DateRange::new(first, last, "this-month")
        }
        Scope::SinceLastRun => match last_processed {
            Some(last) => DateRange::new(last.min(today), today, "since-last-run"),
            None => DateRange::day(today, "since-last-run"),
        },
        Scope::Range {
            start: Some(start),
            end: Some(end),
        } if start <= end => DateRange::new(start, end, "range"),
        Scope::Range { start, end } => {
            warn!(?start, ?end, "invalid explicit range, falling back to today");
            DateRange::day(today, "today")
        }
        Scope::All => DateRange::new(NaiveDate::MIN, NaiveDate::MAX, "all"),
    }
}
