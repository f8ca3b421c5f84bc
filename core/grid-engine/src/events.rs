//! FILENAME: core/grid-engine/src/events.rs
//! PURPOSE: Typed event bus owned by each grid controller.
//! CONTEXT: Everything the grid reports to its host travels as a
//! `GridEvent` value through subscriber callbacks. There is no global
//! string-keyed bus: each controller owns its bus, and subscribers are
//! plain closures registered on it.

use crate::record::RecordId;
use crate::sort::SortDirection;

/// Everything the grid signals outward.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// Initialization finished (strategies resolved, first load done).
    Initialized,
    /// A load resolved and the record set was replaced.
    Loaded,
    /// A point mutation changed the record set.
    Updated,
    /// A load failed; the record set is unchanged.
    LoadingFailed {
        status: Option<u16>,
        message: String,
    },
    /// The view strategy rendered.
    ViewRendered,
    /// The host reported a click on a record's presentation.
    ItemClick { id: RecordId },
    ItemSelected { id: RecordId },
    ItemDeselected { id: RecordId },
    AllSelected,
    AllDeselected,
    /// Emitted after every selection change.
    SelectionCount { count: usize },
    /// A save resolved and the canonical record was merged in.
    DataSaved { id: RecordId },
    /// A save failed; `field` names the offending column when the server
    /// reported one.
    DataSaveFailed {
        field: Option<String>,
        message: String,
    },
    /// A sort was issued (optimistically, before the load resolves).
    DataSorted {
        attribute: String,
        direction: SortDirection,
    },
    /// A page change was issued.
    PageChanged { page: u64 },
}

/// Subscriber callback.
pub type Subscriber = Box<dyn Fn(&GridEvent)>;

/// The controller's event bus.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    /// Registers a subscriber for every event the grid emits.
    pub fn subscribe(&mut self, subscriber: impl Fn(&GridEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Delivers an event to every subscriber, in registration order.
    pub fn emit(&self, event: &GridEvent) {
        for subscriber in &self.subscribers {
            subscriber(event);
        }
    }

    /// Drops all subscribers (used on destroy).
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_all_subscribers_in_order() {
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let first = Rc::clone(&seen);
        bus.subscribe(move |_| first.borrow_mut().push("first".to_string()));
        let second = Rc::clone(&seen);
        bus.subscribe(move |_| second.borrow_mut().push("second".to_string()));

        bus.emit(&GridEvent::Loaded);
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_subscribers_receive_event_payload() {
        let seen: Rc<RefCell<Vec<GridEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Rc::clone(&seen);
        bus.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        bus.emit(&GridEvent::SelectionCount { count: 2 });
        assert_eq!(
            *seen.borrow(),
            vec![GridEvent::SelectionCount { count: 2 }]
        );
    }

    #[test]
    fn test_clear_drops_subscribers() {
        let mut bus = EventBus::new();
        bus.subscribe(|_| {});
        assert_eq!(bus.subscriber_count(), 1);
        bus.clear();
        assert_eq!(bus.subscriber_count(), 0);
    }
}
