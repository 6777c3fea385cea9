#![forbid(unsafe_code)]

use kb_core::{ItemId, TimestampMs};
use std::collections::HashMap;

/// Remembers ids this client wrote recently so their round trip through the
/// backend is not applied a second time.
#[derive(Debug)]
pub struct EchoGuard {
    ttl_ms: TimestampMs,
    written: HashMap<ItemId, TimestampMs>,
}

impl EchoGuard {
    pub fn new(ttl_ms: TimestampMs) -> Self {
        Self {
            ttl_ms,
            written: HashMap::new(),
        }
    }

    pub fn note_write(&mut self, id: &ItemId, now_ms: TimestampMs) {
        self.written.insert(id.clone(), now_ms);
    }

    /// Whether an event for `id` arriving at `now_ms` is our own write coming back.
    pub fn is_echo(&mut self, id: &ItemId, now_ms: TimestampMs) -> bool {
        self.prune(now_ms);
        self.written.contains_key(id)
    }

    pub fn prune(&mut self, now_ms: TimestampMs) {
        let ttl = self.ttl_ms;
        self.written.retain(|_, written_at| now_ms - *written_at <= ttl);
    }

    pub fn len(&self) -> usize {
        self.written.len()
    }

    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_expire_after_ttl() {
        let id = ItemId::try_new("a").unwrap();
        let mut guard = EchoGuard::new(2_000);
        guard.note_write(&id, 10_000);
        assert!(guard.is_echo(&id, 11_000));
        assert!(guard.is_echo(&id, 12_000));
        assert!(!guard.is_echo(&id, 12_001));
        assert!(guard.is_empty());
    }

    #[test]
    fn rewrite_extends_the_window() {
        let id = ItemId::try_new("a").unwrap();
        let mut guard = EchoGuard::new(2_000);
        guard.note_write(&id, 0);
        guard.note_write(&id, 1_500);
        assert!(guard.is_echo(&id, 3_000));
        assert!(!guard.is_echo(&ItemId::try_new("b").unwrap(), 3_000));
    }
}
