//! Month tokens.
//!
//! Every content unit is keyed by a `MM.YYYY` folder name (`03.2025`). This
//! module owns parsing, ordering, labelling and the trailing-window
//! arithmetic used by discovery.
//!
//! Ordering is by `(year, month)`, so sorting a `Vec<MonthToken>` and
//! reversing it yields the "most recent first" order both views use.

use chrono::Datelike;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MonthError {
    #[error("expected a month in MM.YYYY format, got '{0}'")]
    Format(String),
    #[error("month out of range in '{0}'")]
    Range(String),
}

/// A `MM.YYYY` month token.
///
/// Field order matters: the derived `Ord` compares year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthToken {
    year: u16,
    month: u8,
}

impl MonthToken {
    pub fn new(month: u8, year: u16) -> Result<Self, MonthError> {
        if !(1..=12).contains(&month) || year == 0 || year > 9999 {
            return Err(MonthError::Range(format!("{month:02}.{year}")));
        }
        Ok(Self { year, month })
    }

    /// The month containing the local wall-clock date.
    pub fn current() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            year: today.year() as u16,
            month: today.month() as u8,
        }
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    /// The month before this one, crossing year boundaries.
    ///
    /// `None` for `01.0001`, the earliest representable month.
    pub fn previous(&self) -> Option<Self> {
        if self.month == 1 {
            let year = self.year.checked_sub(1).filter(|&y| y > 0)?;
            Some(Self { year, month: 12 })
        } else {
            Some(Self {
                year: self.year,
                month: self.month - 1,
            })
        }
    }

    /// This month followed by up to `size - 1` months before it.
    ///
    /// Shorter than `size` when the window would reach before `01.0001`.
    pub fn trailing_window(&self, size: u32) -> Vec<MonthToken> {
        std::iter::successors(Some(*self), MonthToken::previous)
            .take(size as usize)
            .collect()
    }

    /// `March 2025`
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month as usize - 1], self.year)
    }

    /// `Mar 2025`
    pub fn short_label(&self) -> String {
        format!("{} {}", &MONTH_NAMES[self.month as usize - 1][..3], self.year)
    }
}

impl fmt::Display for MonthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{}", self.month, self.year)
    }
}

impl FromStr for MonthToken {
    type Err = MonthError;

    /// Accepts exactly two month digits, a dot and four year digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mm, yyyy) = s
            .split_once('.')
            .ok_or_else(|| MonthError::Format(s.to_string()))?;
        let digits = |part: &str, len: usize| {
            part.len() == len && part.bytes().all(|b| b.is_ascii_digit())
        };
        if !digits(mm, 2) || !digits(yyyy, 4) {
            return Err(MonthError::Format(s.to_string()));
        }
        let month: u8 = mm.parse().map_err(|_| MonthError::Format(s.to_string()))?;
        let year: u16 = yyyy
            .parse()
            .map_err(|_| MonthError::Format(s.to_string()))?;
        Self::new(month, year).map_err(|_| MonthError::Range(s.to_string()))
    }
}

impl Serialize for MonthToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Sort months most recent first.
pub fn sort_descending(months: &mut [MonthToken]) {
    months.sort_by(|a, b| b.cmp(a));
}
