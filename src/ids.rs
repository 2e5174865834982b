//! Integer id allocation for collections without an auto-increment primitive.
//!
//! The next id is one above the largest id currently stored, ignoring values
//! that do not parse as integers, or 1 for an empty collection. Multi-row
//! writes reserve a contiguous block up front so every row is numbered before
//! the first remote call goes out. Once the largest stored id reaches
//! `i64::MAX` there is no next id and allocation fails with `IdsExhausted`.

use std::collections::HashMap;
use std::ops::Range;

use crate::error::{Result, StoreError};

/// Derives the next id from stored id text, or `None` if the id space is used up.
pub fn next_id<I, S>(ids: I) -> Option<i64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    next_after(ids.into_iter().filter_map(|s| parse_id(s.as_ref())).max())
}

/// Next id given the largest known id, if any.
pub fn next_after(max: Option<i64>) -> Option<i64> {
    match max {
        Some(m) => m.max(0).checked_add(1),
        None => Some(1),
    }
}

/// Parses an id cell. Spreadsheets may hand back `3.0` for an integer cell.
/// Floats outside the `i64` range are unparsable, not clamped.
pub fn parse_id(s: &str) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63

    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0 && (-LIMIT..LIMIT).contains(v))
            .map(|v| v as i64)
    })
}

/// A contiguous run of reserved ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdBlock {
    pub start: i64,
    pub len: usize,
}

impl IdBlock {
    /// Block of `len` ids from `start`, provided the last one fits in an `i64`.
    pub fn new(collection: &str, start: i64, len: usize) -> Result<Self> {
        i64::try_from(len)
            .ok()
            .and_then(|n| start.checked_add(n))
            .map(|_| Self { start, len })
            .ok_or_else(|| StoreError::IdsExhausted(collection.to_string()))
    }

    pub fn ids(&self) -> Range<i64> {
        self.start..self.start + self.len as i64
    }

    /// First id after the block.
    pub fn end(&self) -> i64 {
        self.start + self.len as i64
    }
}

/// Per-handle allocator that never hands out an id at or below one it already
/// issued for the same collection, even if the rows carrying it were deleted.
#[derive(Debug, Default)]
pub struct IdAllocator {
    issued: HashMap<String, i64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `len` ids for `collection`, starting no lower than `next`.
    pub fn reserve(&mut self, collection: &str, next: i64, len: usize) -> Result<IdBlock> {
        let floor = next_after(self.issued.get(collection).copied())
            .ok_or_else(|| StoreError::IdsExhausted(collection.to_string()))?;
        let block = IdBlock::new(collection, next.max(floor), len)?;
        if len > 0 {
            self.issued.insert(collection.to_string(), block.end() - 1);
        }
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collection_starts_at_one() {
        assert_eq!(next_id(Vec::<String>::new()), Some(1));
    }

    #[test]
    fn unparsable_ids_are_ignored() {
        assert_eq!(next_id(["1", "oops", "7", "", "3"]), Some(8));
        assert_eq!(next_id(["n/a"]), Some(1));
    }

    #[test]
    fn float_formatted_ids_count() {
        assert_eq!(next_id(["4.0", "2"]), Some(5));
        assert_eq!(parse_id("4.5"), None);
    }

    #[test]
    fn blocks_are_contiguous() {
        let mut alloc = IdAllocator::new();
        let block = alloc.reserve("session_items", 5, 3).unwrap();
        assert_eq!(block.ids().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(block.end(), 8);
    }

    #[test]
    fn issued_ids_are_not_reused_after_deletion() {
        let mut alloc = IdAllocator::new();
        alloc.reserve("workouts", 1, 3).unwrap();
        // rows 2 and 3 deleted: the table maximum is back to 1
        let block = alloc.reserve("workouts", 2, 1).unwrap();
        assert_eq!(block.start, 4);
        // other collections are independent
        assert_eq!(alloc.reserve("exercises", 1, 1).unwrap().start, 1);
    }

    #[test]
    fn empty_reservation_does_not_advance() {
        let mut alloc = IdAllocator::new();
        let block = alloc.reserve("sessions", 3, 0).unwrap();
        assert_eq!(block.ids().count(), 0);
        assert_eq!(alloc.reserve("sessions", 3, 1).unwrap().start, 3);
    }

    #[test]
    fn out_of_range_float_ids_are_unparsable() {
        assert_eq!(parse_id("1e300"), None);
        assert_eq!(parse_id("-1e300"), None);
        assert_eq!(parse_id("9223372036854775808.0"), None);
        assert_eq!(parse_id("9223372036854775807"), Some(i64::MAX));
        assert_eq!(next_id(["1e300", "2"]), Some(3));
    }

    #[test]
    fn exhausted_id_space_has_no_next_id() {
        assert_eq!(next_after(Some(i64::MAX)), None);
        assert_eq!(next_id(["9223372036854775807"]), None);
        assert_eq!(next_after(Some(i64::MAX - 1)), Some(i64::MAX));
    }

    #[test]
    fn blocks_past_the_id_range_are_rejected() {
        let mut alloc = IdAllocator::new();
        let result = alloc.reserve("workouts", i64::MAX - 1, 2);
        assert!(matches!(result, Err(StoreError::IdsExhausted(name)) if name == "workouts"));

        assert_eq!(alloc.reserve("workouts", i64::MAX - 1, 1).unwrap().start, i64::MAX - 1);
        assert!(alloc.reserve("workouts", 1, 1).is_err());
    }
}
