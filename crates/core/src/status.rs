#![forbid(unsafe_code)]

use crate::error::BoardError;
use crate::model::{Status, TimestampMs};

const HOUR_MS: TimestampMs = 60 * 60 * 1000;

/// Forward-only transition table.
pub fn allowed_next(from: Status) -> &'static [Status] {
    match from {
        Status::NeedToBuy => &[Status::Ordered],
        Status::Ordered => &[Status::Bought],
        Status::Bought => &[Status::Received],
        Status::Received => &[Status::Verified],
        Status::Verified => &[],
    }
}

pub fn is_valid_transition(from: Status, to: Status) -> bool {
    from == to || allowed_next(from).contains(&to)
}

pub fn check_transition(from: Status, to: Status) -> Result<(), BoardError> {
    if is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(BoardError::InvalidTransition { from, to })
    }
}

/// Next board column for bulk advancing; `None` past the last column.
pub fn next_board_column(from: Status) -> Option<Status> {
    let index = Status::BOARD_COLUMNS.iter().position(|s| *s == from)?;
    Status::BOARD_COLUMNS.get(index + 1).copied()
}

/// How long an item may sit in a status before it counts as delayed.
/// `need-to-buy` and `verified` have no threshold.
pub fn delay_threshold_ms(status: Status) -> Option<TimestampMs> {
    match status {
        Status::Ordered => Some(6 * HOUR_MS),
        Status::Bought => Some(12 * HOUR_MS),
        Status::Received => Some(2 * HOUR_MS),
        Status::NeedToBuy | Status::Verified => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_is_forward_only() {
        assert!(is_valid_transition(Status::NeedToBuy, Status::Ordered));
        assert!(is_valid_transition(Status::Received, Status::Verified));
        assert!(is_valid_transition(Status::Verified, Status::Verified));
        assert!(!is_valid_transition(Status::Ordered, Status::NeedToBuy));
        assert!(!is_valid_transition(Status::NeedToBuy, Status::Bought));
        assert_eq!(
            check_transition(Status::Bought, Status::Verified),
            Err(BoardError::InvalidTransition {
                from: Status::Bought,
                to: Status::Verified
            })
        );
        assert!(allowed_next(Status::Verified).is_empty());
    }

    #[test]
    fn board_columns_stop_at_bought() {
        assert_eq!(next_board_column(Status::NeedToBuy), Some(Status::Ordered));
        assert_eq!(next_board_column(Status::Ordered), Some(Status::Bought));
        assert_eq!(next_board_column(Status::Bought), None);
        assert_eq!(next_board_column(Status::Received), None);
    }

    #[test]
    fn thresholds_match_board_policy() {
        assert_eq!(delay_threshold_ms(Status::Ordered), Some(6 * HOUR_MS));
        assert_eq!(delay_threshold_ms(Status::Bought), Some(12 * HOUR_MS));
        assert_eq!(delay_threshold_ms(Status::Received), Some(2 * HOUR_MS));
        assert_eq!(delay_threshold_ms(Status::NeedToBuy), None);
        assert_eq!(delay_threshold_ms(Status::Verified), None);
    }
}
