//! ## buzzwatch-core::aggregate
//! **Running author occurrence counts**
//!
//! One counter per author, bumped once per decoded event. The state lives for
//! the lifetime of the process only; the topic is the system of record.

use std::collections::HashMap;

use crate::events::Event;

/// Author → occurrence count.
///
/// The sum of all counts always equals [`Aggregator::total`], the number of
/// events passed to [`Aggregator::update`].
#[derive(Debug, Default)]
pub struct Aggregator {
    counts: HashMap<String, u64>,
    /// Authors in first-seen order, for stable summaries.
    order: Vec<String>,
    total: u64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more event for the event's author and return the new count.
    pub fn update(&mut self, event: &Event) -> u64 {
        self.total += 1;
        let author = event.author();
        match self.counts.get_mut(author) {
            Some(count) => {
                *count += 1;
                *count
            }
            None => {
                self.counts.insert(author.to_string(), 1);
                self.order.push(author.to_string());
                1
            }
        }
    }

    /// Current count for `author`, zero if never seen.
    pub fn count(&self, author: &str) -> u64 {
        self.counts.get(author).copied().unwrap_or(0)
    }

    /// Number of events aggregated since start.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct authors.
    #[inline]
    pub fn authors(&self) -> usize {
        self.order.len()
    }

    /// All counts, authors in the order they were first seen.
    pub fn snapshot(&self) -> Vec<(&str, u64)> {
        self.order
            .iter()
            .map(|author| (author.as_str(), self.count(author)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{decode, UNKNOWN_AUTHOR};
    use proptest::prelude::*;

    fn event(author: &str) -> Event {
        Event::new(author, "message")
    }

    #[test]
    fn starts_empty() {
        let aggregator = Aggregator::new();
        assert_eq!(aggregator.total(), 0);
        assert_eq!(aggregator.count("Bob"), 0);
        assert!(aggregator.snapshot().is_empty());
    }

    #[test]
    fn update_returns_new_count() {
        let mut aggregator = Aggregator::new();
        assert_eq!(aggregator.update(&event("Bob")), 1);
        assert_eq!(aggregator.update(&event("Bob")), 2);
        assert_eq!(aggregator.update(&event("Eve")), 1);
    }

    #[test]
    fn missing_author_counts_under_sentinel() {
        let mut aggregator = Aggregator::new();
        let event = decode(Some(br#"{"message": "no author"}"#)).unwrap();
        aggregator.update(&event);
        assert_eq!(aggregator.count(UNKNOWN_AUTHOR), 1);
        assert_eq!(aggregator.count(""), 0);
    }

    #[test]
    fn snapshot_keeps_first_seen_order() {
        let mut aggregator = Aggregator::new();
        for author in ["Eve", "Bob", "Eve", "Alice", "Bob"] {
            aggregator.update(&event(author));
        }
        assert_eq!(
            aggregator.snapshot(),
            vec![("Eve", 2), ("Bob", 2), ("Alice", 1)]
        );
    }

    proptest! {
        #[test]
        fn same_author_n_times_counts_n(n in 0usize..500) {
            let mut aggregator = Aggregator::new();
            for _ in 0..n {
                aggregator.update(&event("Bob"));
            }
            prop_assert_eq!(aggregator.count("Bob"), n as u64);
        }

        #[test]
        fn counts_sum_to_total(authors in proptest::collection::vec("[A-E]", 0..200)) {
            let mut aggregator = Aggregator::new();
            for author in &authors {
                aggregator.update(&event(author));
            }
            let sum: u64 = aggregator.snapshot().iter().map(|(_, count)| count).sum();
            prop_assert_eq!(sum, aggregator.total());
            prop_assert_eq!(aggregator.total(), authors.len() as u64);
        }

        #[test]
        fn interleaving_does_not_change_counts(
            flags in proptest::collection::vec(any::<bool>(), 0..200)
        ) {
            let mut interleaved = Aggregator::new();
            let mut bob_seen = 0u64;
            let mut eve_seen = 0u64;
            for is_bob in &flags {
                let (author, seen) = if *is_bob {
                    ("Bob", &mut bob_seen)
                } else {
                    ("Eve", &mut eve_seen)
                };
                *seen += 1;
                // Each update reflects that author's own arrivals so far.
                prop_assert_eq!(interleaved.update(&event(author)), *seen);
            }
            prop_assert_eq!(interleaved.count("Bob"), bob_seen);
            prop_assert_eq!(interleaved.count("Eve"), eve_seen);
        }
    }
}
