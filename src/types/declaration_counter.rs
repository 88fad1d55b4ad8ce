//! Type-safe counter for generating unique declaration IDs.

use std::num::NonZeroU32;

/// Hands out declaration IDs for the whole index.
///
/// IDs start at 1 and are never reused, so an ID handed out for a file that
/// was later reindexed can never alias a declaration from the new batch.
#[derive(Debug, Clone)]
pub struct DeclarationCounter {
    next_id: NonZeroU32,
}

impl DeclarationCounter {
    /// Creates a new counter starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: NonZeroU32::MIN,
        }
    }

    /// Generates the next declaration ID and increments the counter.
    ///
    /// # Panics
    /// Panics if the counter would overflow (after 4 billion declarations).
    pub fn next_id(&mut self) -> super::DeclarationId {
        let current = self.next_id;

        self.next_id = current
            .checked_add(1)
            .expect("Declaration counter overflow - more than 4 billion declarations");

        super::DeclarationId(current.get())
    }

    /// Returns how many IDs have been handed out so far.
    #[must_use]
    pub fn current_count(&self) -> u32 {
        self.next_id.get() - 1
    }
}

impl Default for DeclarationCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_one() {
        let mut counter = DeclarationCounter::new();
        assert_eq!(counter.next_id().0, 1);
    }

    #[test]
    fn test_counter_increments() {
        let mut counter = DeclarationCounter::new();
        let id1 = counter.next_id();
        let id2 = counter.next_id();
        let id3 = counter.next_id();

        assert_eq!((id1.0, id2.0, id3.0), (1, 2, 3));
        assert_eq!(counter.current_count(), 3);
    }

    #[test]
    fn test_default_impl() {
        let counter = DeclarationCounter::default();
        assert_eq!(counter.current_count(), 0);
    }
}
