//! FIFO queue for engine notifications.

use std::collections::VecDeque;

use super::types::Notification;

/// Queue of pending notifications.
///
/// ```ignore
/// engine.on_tick(&tick);
/// for note in engine.drain_notifications() {
///     match note {
///         Notification::CandleClosed { candle } => log::info!("closed {}", candle.bucket_start),
///         _ => {}
///     }
/// }
/// ```
#[derive(Debug, Default)]
pub struct EventBus {
    queue: VecDeque<Notification>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, note: Notification) {
        self.queue.push_back(note);
    }

    pub fn emit_all(&mut self, notes: impl IntoIterator<Item = Notification>) {
        self.queue.extend(notes);
    }

    /// Removes and yields every queued notification in FIFO order.
    pub fn drain(&mut self) -> impl Iterator<Item = Notification> + '_ {
        self.queue.drain(..)
    }

    /// Take all pending notifications, leaving the queue empty.
    #[must_use]
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue).into()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Notification> {
        self.queue.front()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bus_is_empty() {
        let bus = EventBus::new();
        assert!(!bus.has_pending());
        assert_eq!(bus.len(), 0);
    }

    #[test]
    fn test_fifo_order() {
        let mut bus = EventBus::new();
        bus.emit(Notification::IndicatorsRecomputed);
        bus.emit(Notification::PriceUpdated { price: 1.5 });
        bus.emit(Notification::TradeFreezeChanged { frozen: true });

        let mut notes = bus.drain();
        assert_eq!(notes.next(), Some(Notification::IndicatorsRecomputed));
        assert_eq!(notes.next(), Some(Notification::PriceUpdated { price: 1.5 }));
        assert!(matches!(
            notes.next(),
            Some(Notification::TradeFreezeChanged { frozen: true })
        ));
        assert!(notes.next().is_none());
    }

    #[test]
    fn test_take_and_peek() {
        let mut bus = EventBus::new();
        assert!(bus.peek().is_none());
        bus.emit_all([
            Notification::IndicatorsRecomputed,
            Notification::TimestampsAdvanced {
                deadline: 30_000,
                expiration: 60_000,
            },
        ]);
        assert_eq!(bus.peek().map(Notification::name), Some("indicators-recomputed"));
        assert_eq!(bus.len(), 2);

        let notes = bus.take();
        assert_eq!(notes.len(), 2);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut bus = EventBus::new();
        bus.emit(Notification::IndicatorsRecomputed);
        bus.clear();
        assert!(!bus.has_pending());
    }
}
