use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

/// Observer registration for a single event type.
///
/// Any number of listeners may subscribe. `emit` calls them in subscription
/// order, each with a shared reference to the same event; a listener cannot
/// change what later listeners see.
pub struct EventChannel<E> {
    next_listener_id: u64,
    listeners: Vec<(ListenerId, Listener<E>)>,
    emitted_count: u64,
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self {
            next_listener_id: 0,
            listeners: Vec::new(),
            emitted_count: 0,
        }
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("listener_count", &self.listeners.len())
            .field("emitted_count", &self.emitted_count)
            .finish()
    }
}

impl<E> EventChannel<E> {
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Returns how many listeners were notified.
    pub fn emit(&mut self, event: &E) -> usize {
        self.emitted_count = self.emitted_count.saturating_add(1);
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
        self.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn emitted_count(&self) -> u64 {
        self.emitted_count
    }
}
