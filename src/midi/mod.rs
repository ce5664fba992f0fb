// MIDI output layer - events, sinks, and device access

pub mod device;
pub mod event;
pub mod output;

pub use device::{MidiError, connect, list_ports};
pub use event::MidiEvent;
pub use output::{EventCollector, MidirSink, OutputSink, TraceSink};
