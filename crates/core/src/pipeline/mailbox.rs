use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Single-slot, latest-wins handoff between one producer and one consumer.
///
/// Publishing never blocks on the consumer and silently replaces whatever
/// was waiting. Values are shared behind `Arc`, so a published value is
/// read-only from then on. Every publish bumps a generation counter that
/// lets the consumer skip when nothing new has arrived.
///
/// Once closed, the mailbox stays empty and further publishes are dropped.
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    generation: AtomicU64,
}

struct Slot<T> {
    value: Option<Arc<T>>,
    closed: bool,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                closed: false,
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Replace the held value. Returns `false` when the mailbox is closed
    /// and the value was dropped.
    pub fn publish(&self, value: T) -> bool {
        let value = Arc::new(value);
        let mut slot = self.lock();
        if slot.closed {
            return false;
        }
        slot.value = Some(value);
        self.generation.fetch_add(1, Ordering::Release);
        true
    }

    /// The most recently published value, if any.
    pub fn latest(&self) -> Option<Arc<T>> {
        self.lock().value.clone()
    }

    /// The latest value and its generation if newer than `seen`.
    pub fn take_newer(&self, seen: u64) -> Option<(u64, Arc<T>)> {
        if self.generation.load(Ordering::Acquire) <= seen {
            return None;
        }
        let slot = self.lock();
        let generation = self.generation.load(Ordering::Acquire);
        slot.value.clone().map(|value| (generation, value))
    }

    /// Number of publishes so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Drop the held value. The generation is left alone.
    pub fn clear(&self) {
        self.lock().value.take();
    }

    /// Drop the held value and refuse every later publish.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.value = None;
        slot.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    // A panic while holding the lock cannot leave the slot half-written.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_mailbox() {
        let mailbox: Mailbox<u32> = Mailbox::new();
        assert!(mailbox.latest().is_none());
        assert!(mailbox.take_newer(0).is_none());
        assert_eq!(mailbox.generation(), 0);
    }

    #[test]
    fn test_latest_wins() {
        let mailbox = Mailbox::new();
        mailbox.publish(1);
        mailbox.publish(2);
        mailbox.publish(3);
        assert_eq!(*mailbox.latest().unwrap(), 3);
        assert_eq!(mailbox.generation(), 3);
    }

    #[test]
    fn test_take_newer_skips_seen_generation() {
        let mailbox = Mailbox::new();
        mailbox.publish("a");
        let (seen, value) = mailbox.take_newer(0).unwrap();
        assert_eq!(*value, "a");
        assert!(mailbox.take_newer(seen).is_none());

        mailbox.publish("b");
        let (next, value) = mailbox.take_newer(seen).unwrap();
        assert_eq!(*value, "b");
        assert!(next > seen);
    }

    #[test]
    fn test_clear_drops_value() {
        let mailbox = Mailbox::new();
        mailbox.publish(7);
        mailbox.clear();
        assert!(mailbox.latest().is_none());
        assert_eq!(mailbox.generation(), 1);
    }

    #[test]
    fn test_publish_after_close_is_dropped() {
        let mailbox = Mailbox::new();
        assert!(mailbox.publish(1));
        mailbox.close();
        assert!(mailbox.is_closed());
        assert!(!mailbox.publish(2));
        assert!(mailbox.latest().is_none());
        assert!(mailbox.take_newer(0).is_none());
        assert_eq!(mailbox.generation(), 1);
    }

    #[test]
    fn test_consumer_only_sees_published_values() {
        // A slow consumer never observes anything but complete values, and
        // the last thing it sees is the final publish.
        let mailbox = Arc::new(Mailbox::new());
        let producer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                for i in 0..1000u32 {
                    mailbox.publish(vec![i; 16]);
                }
            })
        };

        let mut seen = 0;
        let mut last = None;
        while !producer.is_finished() || mailbox.generation() > seen {
            if let Some((generation, value)) = mailbox.take_newer(seen) {
                assert!(value.iter().all(|&v| v == value[0]));
                if let Some(prev) = last {
                    assert!(value[0] >= prev);
                }
                last = Some(value[0]);
                seen = generation;
            }
        }
        producer.join().unwrap();
        assert_eq!(last, Some(999));
    }
}
