//! Explicit event subscription for the page controller.
//!
//! Hosts dispatch [`UiEvent`]s; components register handlers with
//! [`EventBus::subscribe`] and hand the returned [`Subscription`] back to
//! [`EventBus::unsubscribe`] on teardown.

use crate::progress::ScrollMetrics;

/// Kinds of host events a handler can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Resize,
}

/// A host event together with the geometry at the time it fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    Scroll(ScrollMetrics),
    Resize(ScrollMetrics),
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::Scroll(_) => EventKind::Scroll,
            UiEvent::Resize(_) => EventKind::Resize,
        }
    }

    pub fn metrics(&self) -> ScrollMetrics {
        match self {
            UiEvent::Scroll(m) | UiEvent::Resize(m) => *m,
        }
    }
}

/// Token returned by [`EventBus::subscribe`].
#[must_use = "dropping a Subscription leaks the handler; pass it to EventBus::unsubscribe"]
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
    kind: EventKind,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

type Handler = Box<dyn FnMut(&UiEvent)>;

struct Listener {
    id: u64,
    kind: EventKind,
    handler: Handler,
}

/// Single-threaded registry of event handlers.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> Subscription
    where
        F: FnMut(&UiEvent) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            kind,
            handler: Box::new(handler),
        });
        Subscription { id, kind }
    }

    /// Remove the handler behind `sub`. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != sub.id);
        self.listeners.len() != before
    }

    /// Run every handler registered for the event's kind, in subscription order.
    pub fn dispatch(&mut self, event: &UiEvent) {
        let kind = event.kind();
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            (listener.handler)(event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|l| l.kind == kind).count()
    }
}
