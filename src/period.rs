//! Reference labels (`"ago/24"`), period keys and the period selector used by
//! the report screens to narrow monthly records.

use crate::error::{ReportError, Result};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Portuguese month abbreviations, January first.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

const CENTURY: i32 = 2000;

/// A decoded `"mmm/yy"` reference label.
///
/// Field order matters: the derived `Ord` compares the year first and the
/// month second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefLabel {
    year: i32,
    month: u32,
}

impl RefLabel {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ReportError::InvalidRefLabel {
                label: format!("{year}-{month:02}"),
                reason: "month must be between 1 and 12".to_string(),
            });
        }
        if !(CENTURY..CENTURY + 100).contains(&year) {
            return Err(ReportError::InvalidRefLabel {
                label: format!("{year}-{month:02}"),
                reason: "year cannot be written with two digits".to_string(),
            });
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based month.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn key(&self) -> PeriodKey {
        PeriodKey::new(self.year, self.month)
    }

    pub fn abbreviation(&self) -> &'static str {
        MONTH_ABBREVIATIONS[(self.month - 1) as usize]
    }
}

impl fmt::Display for RefLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.abbreviation(), self.year - CENTURY)
    }
}

impl FromStr for RefLabel {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        parse_ref_label(s)
    }
}

impl TryFrom<String> for RefLabel {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self> {
        parse_ref_label(&value)
    }
}

impl From<RefLabel> for String {
    fn from(label: RefLabel) -> Self {
        label.to_string()
    }
}

fn invalid_label(label: &str, reason: &str) -> ReportError {
    ReportError::InvalidRefLabel {
        label: label.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses a `"mmm/yy"` label, case-insensitively. The year is always
/// `2000 + yy`.
pub fn parse_ref_label(label: &str) -> Result<RefLabel> {
    let normalized = label.trim().to_lowercase();
    let parts: Vec<&str> = normalized.split('/').collect();

    if parts.len() != 2 {
        return Err(invalid_label(label, "expected format 'mmm/yy'"));
    }

    let month_token = parts[0].trim();
    let year_token = parts[1].trim();

    let month = MONTH_ABBREVIATIONS
        .iter()
        .position(|abbr| *abbr == month_token)
        .ok_or_else(|| ReportError::UnknownMonth {
            label: label.to_string(),
            token: month_token.to_string(),
        })?;

    if year_token.len() != 2 || !year_token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_label(label, "year must be exactly two digits"));
    }
    let year: i32 = year_token
        .parse()
        .map_err(|_| invalid_label(label, "year must be exactly two digits"))?;

    Ok(RefLabel {
        year: CENTURY + year,
        month: month as u32 + 1,
    })
}

/// Chronological comparison of two labels.
pub fn compare_ref_labels(a: &str, b: &str) -> Result<Ordering> {
    Ok(parse_ref_label(a)?.cmp(&parse_ref_label(b)?))
}

/// Sorts labels chronologically. Nothing is reordered if any label is
/// malformed.
pub fn sort_ref_labels<S: AsRef<str>>(labels: &mut [S]) -> Result<()> {
    for label in labels.iter() {
        parse_ref_label(label.as_ref())?;
    }
    labels.sort_by_cached_key(|label| parse_ref_label(label.as_ref()).ok());
    Ok(())
}

/// `year * 100 + month`. Integer order is chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey(i32);

impl PeriodKey {
    /// Open lower bound of a custom range.
    pub const MIN: PeriodKey = PeriodKey(0);
    /// Open upper bound of a custom range.
    pub const MAX: PeriodKey = PeriodKey(999_999);

    pub fn new(year: i32, month: u32) -> Self {
        Self(year * 100 + month as i32)
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.div_euclid(100)
    }

    pub fn month(&self) -> u32 {
        self.0.rem_euclid(100) as u32
    }

    fn month_index(&self) -> i32 {
        self.year() * 12 + self.month() as i32 - 1
    }

    fn from_month_index(index: i32) -> Self {
        Self::new(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
    }

    /// Moves `delta` calendar months, rolling over year boundaries.
    pub fn add_months(&self, delta: i32) -> Self {
        Self::from_month_index(self.month_index() + delta)
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::MIN || *self == Self::MAX
    }
}

impl From<RefLabel> for PeriodKey {
    fn from(label: RefLabel) -> Self {
        label.key()
    }
}

impl From<NaiveDate> for PeriodKey {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive range of period keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: PeriodKey,
    pub end: PeriodKey,
}

impl PeriodRange {
    pub fn contains(&self, key: PeriodKey) -> bool {
        key >= self.start && key <= self.end
    }

    /// Every month key in the range, or `None` when a bound is open.
    pub fn months(&self) -> Option<Vec<PeriodKey>> {
        if self.start.is_sentinel() || self.end.is_sentinel() {
            return None;
        }

        let mut months = Vec::new();
        let mut current = self.start;
        while current <= self.end {
            months.push(current);
            current = current.add_months(1);
        }
        Some(months)
    }
}

impl fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Which months a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PeriodSelector {
    /// Rolling twelve months ending with the current month.
    #[default]
    Last12,
    ThisYear,
    PrevYear,
    /// Either bound may be missing, and they may be given in either order.
    Custom {
        #[serde(default)]
        start: Option<RefLabel>,
        #[serde(default)]
        end: Option<RefLabel>,
    },
}

impl PeriodSelector {
    /// Builds a custom selector from raw labels as the portal sends them.
    /// Blank labels mean "no bound"; malformed ones are rejected.
    pub fn custom(start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let parse_bound = |raw: Option<&str>| -> Result<Option<RefLabel>> {
            match raw.map(str::trim) {
                None | Some("") => Ok(None),
                Some(label) => parse_ref_label(label).map(Some),
            }
        };

        Ok(Self::Custom {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        })
    }
}

/// Resolves a selector into inclusive key bounds relative to `today`.
pub fn resolve_range(selector: &PeriodSelector, today: NaiveDate) -> PeriodRange {
    let year = today.year();

    let range = match selector {
        PeriodSelector::ThisYear => PeriodRange {
            start: PeriodKey::new(year, 1),
            end: PeriodKey::new(year, 12),
        },
        PeriodSelector::PrevYear => PeriodRange {
            start: PeriodKey::new(year - 1, 1),
            end: PeriodKey::new(year - 1, 12),
        },
        PeriodSelector::Custom { start, end } => {
            let a = start.map_or(PeriodKey::MIN, PeriodKey::from);
            let b = end.map_or(PeriodKey::MAX, PeriodKey::from);
            PeriodRange {
                start: a.min(b),
                end: a.max(b),
            }
        }
        PeriodSelector::Last12 => {
            let current = PeriodKey::from(today);
            PeriodRange {
                start: current.add_months(-11),
                end: current,
            }
        }
    };

    debug!("Resolved {:?} at {} to {}", selector, today, range);
    range
}

/// Anything that may carry a reference label.
pub trait HasRefLabel {
    fn ref_label(&self) -> Option<&str>;
}

impl HasRefLabel for String {
    fn ref_label(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl HasRefLabel for &str {
    fn ref_label(&self) -> Option<&str> {
        Some(*self)
    }
}

/// Rows inside `range`, paired with their decoded label, in input order.
///
/// Rows without a label are skipped silently; rows with a malformed label are
/// skipped with a warning.
pub fn select_in_range<'a, T: HasRefLabel>(
    rows: &'a [T],
    range: &PeriodRange,
) -> Vec<(RefLabel, &'a T)> {
    rows.iter()
        .filter_map(|row| {
            let raw = row.ref_label()?;
            match parse_ref_label(raw) {
                Ok(label) => Some((label, row)),
                Err(e) => {
                    warn!("Skipping record with unusable reference label: {}", e);
                    None
                }
            }
        })
        .filter(|(label, _)| range.contains(label.key()))
        .collect()
}

/// Keeps the rows whose reference label falls inside the selected period.
pub fn filter_by_period<'a, T: HasRefLabel>(
    rows: &'a [T],
    selector: &PeriodSelector,
    today: NaiveDate,
) -> Vec<&'a T> {
    let range = resolve_range(selector, today);
    let selected: Vec<&T> = select_in_range(rows, &range)
        .into_iter()
        .map(|(_, row)| row)
        .collect();

    debug!(
        "Period filter kept {} of {} rows for {}",
        selected.len(),
        rows.len(),
        range
    );
    selected
}
