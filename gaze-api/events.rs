/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::DisplayArea;
use crate::DriftState;
use crate::Sender;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// Drift compensation is collecting samples
    DriftCompensationStarted,
    /// A fixation was found and a new compensation is in effect
    DriftCompensated(DriftState),
    /// No fixation was found in time; the previous compensation stays in effect
    DriftCompensationTimedOut,
    /// Compensation dropped back to identity
    DriftCompensationReset,
    /// The device reported new display geometry
    DisplayAreaChanged(DisplayArea),
    /// Session ended by device
    SessionEnd,
}

/// Convenience structure for buffering up events
/// when no event destination has been set
pub enum EventBuffer {
    Buffered(Vec<Event>),
    Sink(Sender<Event>),
}

impl Default for EventBuffer {
    fn default() -> Self {
        EventBuffer::Buffered(vec![])
    }
}

impl EventBuffer {
    pub fn callback(&mut self, event: Event) {
        match *self {
            EventBuffer::Buffered(ref mut events) => events.push(event),
            EventBuffer::Sink(ref dest) => {
                let _ = dest.send(event);
            }
        }
    }

    pub fn upgrade(&mut self, dest: Sender<Event>) {
        if let EventBuffer::Buffered(ref mut events) = *self {
            for event in events.drain(..) {
                let _ = dest.send(event);
            }
        }
        *self = EventBuffer::Sink(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_events_are_flushed_on_upgrade() {
        let mut buffer = EventBuffer::default();
        buffer.callback(Event::DriftCompensationStarted);
        buffer.callback(Event::DriftCompensationTimedOut);

        let (sender, receiver) = crate::channel().unwrap();
        buffer.upgrade(sender);
        buffer.callback(Event::SessionEnd);

        assert_eq!(receiver.try_recv().ok(), Some(Event::DriftCompensationStarted));
        assert_eq!(receiver.try_recv().ok(), Some(Event::DriftCompensationTimedOut));
        assert_eq!(receiver.try_recv().ok(), Some(Event::SessionEnd));
        assert!(receiver.try_recv().is_err());
    }
}
