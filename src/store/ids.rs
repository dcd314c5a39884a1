//! Record id allocation.
//!
//! Ids are decimal strings handed out by a monotonic counter. The counter is
//! seeded from the loaded collection as `max(largest numeric id, record count) + 1`,
//! so a fresh store starts at `"1"` and a store loaded with ids 1..=n continues at
//! `n + 1`. Unlike deriving the id from the current collection length, an id freed
//! by a delete is never handed out again while the process runs.

use crate::store::record::Record;

#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Seed the counter from an existing collection.
    pub fn seeded_from(records: &[Record]) -> Self {
        let max_numeric = records
            .iter()
            .filter_map(|r| r.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let floor = max_numeric.max(records.len() as u64);

        Self { next: floor + 1 }
    }

    /// Take the next id.
    pub fn allocate(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        id.to_string()
    }

    #[cfg(test)]
    fn peek(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> Record {
        Record {
            id: id.into(),
            name: "n".into(),
            genre: "g".into(),
            year: 2000,
            author: "a".into(),
        }
    }

    #[test]
    fn test_empty_collection_starts_at_one() {
        let mut ids = IdAllocator::seeded_from(&[]);
        assert_eq!(ids.allocate(), "1");
        assert_eq!(ids.allocate(), "2");
    }

    #[test]
    fn test_seed_skips_past_largest_numeric_id() {
        let ids = IdAllocator::seeded_from(&[record("2"), record("7"), record("3")]);
        assert_eq!(ids.peek(), 8);
    }

    #[test]
    fn test_non_numeric_ids_fall_back_to_length() {
        let ids = IdAllocator::seeded_from(&[record("abc"), record("def")]);
        assert_eq!(ids.peek(), 3);
    }
}
