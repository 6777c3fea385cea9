#![forbid(unsafe_code)]

use kb_core::{ItemId, Status, TimestampMs};
use std::collections::HashMap;

/// Coalesces repeated saves of the same (item, status) pair.
#[derive(Debug)]
pub struct SaveDebouncer {
    window_ms: TimestampMs,
    last: HashMap<ItemId, (Status, TimestampMs)>,
}

impl SaveDebouncer {
    pub fn new(window_ms: TimestampMs) -> Self {
        Self {
            window_ms,
            last: HashMap::new(),
        }
    }

    /// Returns `false` when the same status was saved for `id` less than one
    /// window ago; otherwise records this save and returns `true`.
    pub fn should_save(&mut self, id: &ItemId, status: Status, now_ms: TimestampMs) -> bool {
        let coalesced = self
            .last
            .get(id)
            .is_some_and(|(last_status, at)| *last_status == status && now_ms - *at < self.window_ms);
        if coalesced {
            return false;
        }
        self.last.insert(id.clone(), (status, now_ms));
        true
    }

    pub fn forget(&mut self, id: &ItemId) {
        self.last.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_writes_within_window_coalesce() {
        let id = ItemId::try_new("a").unwrap();
        let mut debouncer = SaveDebouncer::new(1_000);
        assert!(debouncer.should_save(&id, Status::Ordered, 0));
        assert!(!debouncer.should_save(&id, Status::Ordered, 999));
        assert!(debouncer.should_save(&id, Status::Ordered, 1_000));
    }

    #[test]
    fn status_change_or_other_item_always_saves() {
        let a = ItemId::try_new("a").unwrap();
        let b = ItemId::try_new("b").unwrap();
        let mut debouncer = SaveDebouncer::new(1_000);
        assert!(debouncer.should_save(&a, Status::Ordered, 0));
        assert!(debouncer.should_save(&a, Status::Bought, 10));
        assert!(debouncer.should_save(&b, Status::Bought, 10));
        debouncer.forget(&a);
        assert!(debouncer.should_save(&a, Status::Bought, 20));
    }
}
