//! Typed publish/subscribe bus for Sitedeck.
//!
//! Publishing is fire-and-forget: delivery is posted to the [`MainLoop`] and
//! reaches the handlers registered for the event's topic at delivery time, in
//! FIFO order. Subscriptions are RAII handles.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::runtime::MainLoop;
use crate::types::events::{BusEvent, Topic};

type Handler = Rc<dyn Fn(&BusEvent)>;

#[derive(Default)]
struct BusState {
    next_id: u64,
    subscribers: BTreeMap<Topic, Vec<(u64, Handler)>>,
}

impl BusState {
    fn is_subscribed(&self, topic: Topic, id: u64) -> bool {
        self.subscribers
            .get(&topic)
            .is_some_and(|list| list.iter().any(|(sid, _)| *sid == id))
    }
}

pub struct EventBus {
    main_loop: Rc<MainLoop>,
    state: Rc<RefCell<BusState>>,
}

impl EventBus {
    pub fn new(main_loop: Rc<MainLoop>) -> Rc<Self> {
        Rc::new(Self {
            main_loop,
            state: Rc::new(RefCell::new(BusState::default())),
        })
    }

    /// Registers `handler` for `topic` until the returned handle is dropped.
    pub fn subscribe(&self, topic: Topic, handler: impl Fn(&BusEvent) + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state
            .subscribers
            .entry(topic)
            .or_default()
            .push((id, Rc::new(handler)));
        Subscription {
            id,
            topic,
            state: Rc::downgrade(&self.state),
        }
    }

    pub fn publish(&self, event: BusEvent) {
        log::trace!("bus publish {} {:?}", event.topic(), event.site_id());
        let state = Rc::downgrade(&self.state);
        self.main_loop.post(move || deliver(&state, &event));
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.state
            .borrow()
            .subscribers
            .get(&topic)
            .map_or(0, Vec::len)
    }
}

fn deliver(state: &Weak<RefCell<BusState>>, event: &BusEvent) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let topic = event.topic();
    let handlers: Vec<(u64, Handler)> = state
        .borrow()
        .subscribers
        .get(&topic)
        .cloned()
        .unwrap_or_default();
    for (id, handler) in handlers {
        // An earlier handler may have dropped this subscription.
        if state.borrow().is_subscribed(topic, id) {
            handler(event);
        }
    }
}

/// Keeps a handler registered. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    topic: Topic,
    state: Weak<RefCell<BusState>>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            if let Ok(mut state) = state.try_borrow_mut() {
                if let Some(list) = state.subscribers.get_mut(&self.topic) {
                    list.retain(|(id, _)| *id != self.id);
                }
            }
        }
    }
}
