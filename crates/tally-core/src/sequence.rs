//! # Order Id Sequence Policy
//!
//! Rules for the order identifier counter.
//!
//! ```text
//! ledger non-empty:  next id = counter + 1   (monotonic, freed ids never reused)
//! ledger empty:      counter is reset        (next id = 1)
//! ```
//!
//! The store keeps the counter (SQLite `sqlite_sequence`); this module only
//! decides what to do with it.

/// What the commit path must do with the counter before inserting a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceAction {
    /// Keep counting from the last issued id.
    Continue,
    /// The ledger is empty: restart numbering at 1.
    Reset,
}

/// Decides the counter action from the number of sales currently stored.
#[inline]
pub fn sequence_action(sale_count: i64) -> SequenceAction {
    if sale_count == 0 {
        SequenceAction::Reset
    } else {
        SequenceAction::Continue
    }
}

/// Returns the id the next committed sale will receive.
///
/// `counter` is the last issued id, or `None` if nothing was ever issued
/// (or the counter was reset).
///
/// ## Example
/// ```rust
/// use tally_core::sequence::next_order_id;
///
/// assert_eq!(next_order_id(0, Some(41)), 1);  // empty ledger restarts
/// assert_eq!(next_order_id(3, Some(41)), 42); // gaps are not reused
/// assert_eq!(next_order_id(0, None), 1);
/// ```
pub fn next_order_id(sale_count: i64, counter: Option<i64>) -> i64 {
    match sequence_action(sale_count) {
        SequenceAction::Reset => 1,
        SequenceAction::Continue => counter.unwrap_or(0) + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_depends_only_on_emptiness() {
        assert_eq!(sequence_action(0), SequenceAction::Reset);
        assert_eq!(sequence_action(1), SequenceAction::Continue);
        assert_eq!(sequence_action(500), SequenceAction::Continue);
    }

    #[test]
    fn test_next_id_is_monotonic_while_non_empty() {
        // Sales 1..=5 issued, 2 and 5 deleted: next is still 6
        assert_eq!(next_order_id(3, Some(5)), 6);
    }

    #[test]
    fn test_next_id_after_clearing_ledger() {
        assert_eq!(next_order_id(0, Some(5)), 1);
    }
}
