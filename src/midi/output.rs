// Output sinks - the capability the engine emits events through

use std::cell::RefCell;
use std::rc::Rc;

use crate::midi::event::MidiEvent;

/// Outbound event capability
///
/// The engine depends only on this trait, never on a concrete transport.
/// Sends are infallible at this seam; implementations log delivery
/// problems instead of failing the tick that produced them.
pub trait OutputSink {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, pitch: u8);
    fn program_change(&mut self, channel: u8, program: u8);
}

/// A shared handle still counts as a sink
///
/// Lets a caller keep a handle on a sink it hands to the session, which is
/// how the test suites observe emitted events.
impl<S: OutputSink> OutputSink for Rc<RefCell<S>> {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.borrow_mut().note_on(channel, pitch, velocity);
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        self.borrow_mut().note_off(channel, pitch);
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        self.borrow_mut().program_change(channel, program);
    }
}

/// Sink backed by a real MIDI output connection
pub struct MidirSink {
    connection: midir::MidiOutputConnection,
    port_name: String,
}

impl MidirSink {
    pub fn new(connection: midir::MidiOutputConnection, port_name: String) -> Self {
        Self {
            connection,
            port_name,
        }
    }

    /// Name of the connected output port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn send(&mut self, event: MidiEvent, channel: u8) {
        let bytes = event.to_bytes(channel);
        if let Err(e) = self.connection.send(&bytes) {
            log::warn!("MIDI send failed on '{}': {}", self.port_name, e);
        }
    }
}

impl OutputSink for MidirSink {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.send(MidiEvent::NoteOn { pitch, velocity }, channel);
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        self.send(MidiEvent::NoteOff { pitch }, channel);
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        self.send(MidiEvent::ProgramChange { program }, channel);
    }
}

/// Sink that records events in arrival order
///
/// Used by the test suites; per-player ordering guarantees (a player's
/// note-offs precede its next note-ons within one tick) are asserted
/// against the recorded sequence.
#[derive(Debug, Clone, Default)]
pub struct EventCollector {
    events: Vec<(u8, MidiEvent)>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> &[(u8, MidiEvent)] {
        &self.events
    }

    /// Drain and return the recorded events
    pub fn take(&mut self) -> Vec<(u8, MidiEvent)> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl OutputSink for EventCollector {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        self.events
            .push((channel, MidiEvent::NoteOn { pitch, velocity }));
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        self.events.push((channel, MidiEvent::NoteOff { pitch }));
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        self.events
            .push((channel, MidiEvent::ProgramChange { program }));
    }
}

/// Sink that logs events instead of delivering them (dry runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceSink;

impl OutputSink for TraceSink {
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8) {
        log::info!("ch{channel} note on  {pitch} vel {velocity}");
    }

    fn note_off(&mut self, channel: u8, pitch: u8) {
        log::info!("ch{channel} note off {pitch}");
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        log::info!("ch{channel} program {program}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_preserves_order() {
        let mut sink = EventCollector::new();
        sink.note_on(0, 60, 90);
        sink.note_off(0, 60);
        sink.program_change(1, 12);

        assert_eq!(
            sink.events(),
            &[
                (
                    0,
                    MidiEvent::NoteOn {
                        pitch: 60,
                        velocity: 90
                    }
                ),
                (0, MidiEvent::NoteOff { pitch: 60 }),
                (1, MidiEvent::ProgramChange { program: 12 }),
            ]
        );
    }

    #[test]
    fn test_collector_take_drains() {
        let mut sink = EventCollector::new();
        sink.note_on(0, 60, 90);

        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_shared_handle_forwards() {
        let shared = Rc::new(RefCell::new(EventCollector::new()));
        let mut handle = shared.clone();
        handle.note_on(2, 40, 77);

        assert_eq!(shared.borrow().len(), 1);
    }
}
