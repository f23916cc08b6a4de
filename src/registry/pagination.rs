//! Uniform pagination for every list-style read.
//!
//! Callers hand in whatever they received (absent, negative, oversized, or
//! not a number at all); [`Pagination::normalize`] turns it into a [`Page`]
//! that stores apply after filtering and ordering.

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Raw, unvalidated pagination input.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Normalized window: `limit` in `1..=100`, `offset` non-negative.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Pagination::default().normalize()
    }
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self { limit, offset }
    }

    /// Build from textual input such as query-string or CLI values.
    /// Non-numeric values count as absent.
    pub fn from_raw(limit: Option<&str>, offset: Option<&str>) -> Self {
        Self {
            limit: limit.and_then(parse_number),
            offset: offset.and_then(parse_number),
        }
    }

    pub fn normalize(&self) -> Page {
        // Zero means unspecified; anything else clamps into 1..=MAX_LIMIT.
        let limit = match self.limit {
            None | Some(0) => DEFAULT_LIMIT,
            Some(limit) => limit.clamp(1, MAX_LIMIT as i64) as usize,
        };
        let offset = match self.offset {
            Some(offset) if offset > 0 => usize::try_from(offset).unwrap_or(usize::MAX),
            _ => 0,
        };
        Page { limit, offset }
    }
}

impl Page {
    /// Apply the window to an already filtered and ordered sequence.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

fn parse_number(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
}
