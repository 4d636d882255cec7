use std::collections::VecDeque;

use crate::dclass::DcValue;

/// One queued event: a string name plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub args: Vec<DcValue>,
}

/// A queued, injected event bus.
///
/// Producers `send`; consumers `drain` a batch and match on names. Events
/// sent while a drained batch is being handled land in the next batch, so
/// handler loops terminate. There is no global instance; whoever owns the
/// messenger decides who gets to see it.
#[derive(Debug, Default)]
pub struct Messenger {
    queue: VecDeque<Event>,
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&mut self, name: &str, args: Vec<DcValue>) {
        self.queue.push_back(Event {
            name: name.to_string(),
            args,
        });
    }

    /// Takes every queued event, oldest first, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Event> {
        self.queue.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
