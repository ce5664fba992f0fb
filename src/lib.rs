// aleator - stochastic note-event sequencer
// Library exports for the driver binary, tests, and benchmarks

pub mod config;
pub mod engine;
pub mod midi;
pub mod players;
pub mod theory;

// Re-export commonly used types for convenience
pub use config::{ConfigError, SessionConfig};
pub use engine::inputs::TickInputs;
pub use engine::session::{Session, Voice};
pub use engine::timing::{TICKS_PER_BEAT, Tempo, TimeSignature};
pub use engine::weights::{WeightError, WeightTable};
pub use midi::event::MidiEvent;
pub use midi::output::{EventCollector, OutputSink};
pub use players::{LoopState, Looper, Player, PlayerWeights, PolicyKind};
pub use theory::scale::Scale;
