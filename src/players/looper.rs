// Looper - records one measure of tick decisions and replays it verbatim
// A 4-state automaton layered over a plain player

use crate::engine::inputs::TickInputs;
use crate::engine::timing::TimeSignature;
use crate::engine::weights::{WeightError, WeightTable};
use crate::midi::output::OutputSink;
use crate::players::Player;

/// Looper automaton states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Silence,
    RepeatLast,
    RepeatAlternate,
    Recording,
}

impl LoopState {
    /// Number of states, and thus the state-choice table arity
    pub const COUNT: usize = 4;

    /// State for a resolved state-choice index
    fn from_index(index: usize) -> Self {
        match index {
            0 => LoopState::Silence,
            1 => LoopState::RepeatLast,
            2 => LoopState::RepeatAlternate,
            _ => LoopState::Recording,
        }
    }
}

/// One recorded measure: the tick-input tuples of a full Recording pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurePattern {
    inputs: Vec<TickInputs>,
}

impl MeasurePattern {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Recorded inputs at `tick`, if the pattern reaches that far
    pub fn get(&self, tick: usize) -> Option<TickInputs> {
        self.inputs.get(tick).copied()
    }

    fn push(&mut self, inputs: TickInputs) {
        self.inputs.push(inputs);
    }
}

/// The two most recently completed measures, oldest dropped on overflow
#[derive(Debug, Clone, Default)]
pub struct PatternMemory {
    // slot 0 holds the previous measure, slot 1 the latest
    slots: [Option<MeasurePattern>; 2],
}

impl PatternMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a completed measure, shifting the older one out if needed
    pub fn push(&mut self, pattern: MeasurePattern) {
        self.slots[0] = self.slots[1].take();
        self.slots[1] = Some(pattern);
    }

    /// Most recently completed measure
    pub fn latest(&self) -> Option<&MeasurePattern> {
        self.slots[1].as_ref()
    }

    /// The measure completed before the latest
    pub fn previous(&self) -> Option<&MeasurePattern> {
        self.slots[0].as_ref()
    }

    /// Number of stored measures (0 to 2)
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A player that records one measure of decisions and replays it verbatim
///
/// While Recording, every tick's inputs are appended to the in-progress
/// pattern and the wrapped player runs live. At each measure boundary the
/// pattern commits to `PatternMemory` and the state-choice table picks the
/// next state. Replay re-runs the wrapped player against recorded inputs,
/// which reproduces its decisions exactly for the memoryless policies.
#[derive(Debug, Clone)]
pub struct Looper {
    inner: Player,
    state: LoopState,
    state_weights: Vec<u32>,
    state_table: WeightTable,
    ticks_in_measure: u32,
    tick: u32,
    alternate: usize,
    recording: MeasurePattern,
    memory: PatternMemory,
}

impl Looper {
    /// Default state-choice weights: repeat-heavy, silence rare
    pub const DEFAULT_STATE_WEIGHTS: [u32; 4] = [1, 4, 3, 2];

    pub fn new(inner: Player, time_signature: TimeSignature) -> Self {
        let state_weights = Self::DEFAULT_STATE_WEIGHTS.to_vec();
        let state_table =
            WeightTable::normalize(&state_weights).expect("default state table is valid");
        Self {
            inner,
            state: LoopState::Recording,
            state_weights,
            state_table,
            ticks_in_measure: time_signature.ticks_in_measure(),
            tick: 0,
            alternate: 0,
            recording: MeasurePattern::default(),
            memory: PatternMemory::new(),
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn player(&self) -> &Player {
        &self.inner
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.inner
    }

    pub fn memory(&self) -> &PatternMemory {
        &self.memory
    }

    pub fn state_weights(&self) -> &[u32] {
        &self.state_weights
    }

    /// Replace the state-choice table (one entry per state)
    pub fn update_state_weights(&mut self, weights: Vec<u32>) -> Result<(), WeightError> {
        if weights.len() != LoopState::COUNT {
            return Err(WeightError::StateCount {
                got: weights.len(),
                expected: LoopState::COUNT,
            });
        }
        self.state_table = WeightTable::normalize(&weights)?;
        self.state_weights = weights;
        Ok(())
    }

    /// Enter `state`, resetting measure progress and silencing held notes
    pub fn change_state(&mut self, state: LoopState, sink: &mut dyn OutputSink) {
        log::debug!(
            "{}: loop state {:?} -> {:?}",
            self.inner.name(),
            self.state,
            state
        );
        self.state = state;
        self.tick = 0;
        self.alternate = 0;
        self.recording = MeasurePattern::default();
        self.inner.flush(sink);
    }

    /// Advance the looper by one tick
    ///
    /// Boundary transitions run before dispatch; the tick counter advances
    /// unconditionally afterwards, so the first tick in a new measure is
    /// offset 0.
    pub fn tick(&mut self, sink: &mut dyn OutputSink, inputs: TickInputs) {
        if self.tick >= self.ticks_in_measure {
            self.boundary(sink, inputs);
        }
        self.dispatch(sink, inputs);
        self.tick += 1;
    }

    /// Force note-off on anything the wrapped player holds
    pub fn flush(&mut self, sink: &mut dyn OutputSink) {
        self.inner.flush(sink);
    }

    fn boundary(&mut self, sink: &mut dyn OutputSink, inputs: TickInputs) {
        match self.state {
            // First alternate pass done: play the other stored measure
            LoopState::RepeatAlternate if self.alternate == 0 => {
                self.alternate = 1;
                self.tick = 0;
                self.inner.flush(sink);
            }
            LoopState::Recording => {
                self.memory.push(std::mem::take(&mut self.recording));
                self.resolve_state(inputs.func, sink);
            }
            _ => self.resolve_state(inputs.func, sink),
        }
    }

    fn resolve_state(&mut self, r: f64, sink: &mut dyn OutputSink) {
        let next = LoopState::from_index(self.state_table.resolve(r));
        self.change_state(next, sink);
    }

    fn dispatch(&mut self, sink: &mut dyn OutputSink, inputs: TickInputs) {
        match self.state {
            LoopState::Silence => {}
            LoopState::RepeatLast => {
                let recorded = self
                    .memory
                    .latest()
                    .and_then(|pattern| pattern.get(self.tick as usize));
                match recorded {
                    Some(replayed) => self.inner.tick(sink, replayed),
                    None => self.fall_back_to_recording(sink, inputs),
                }
            }
            LoopState::RepeatAlternate => {
                let pattern = if self.memory.len() < 2 {
                    None
                } else if self.alternate == 0 {
                    self.memory.previous()
                } else {
                    self.memory.latest()
                };
                let recorded = pattern.and_then(|pattern| pattern.get(self.tick as usize));
                match recorded {
                    Some(replayed) => self.inner.tick(sink, replayed),
                    None => self.fall_back_to_recording(sink, inputs),
                }
            }
            LoopState::Recording => {
                self.recording.push(inputs);
                self.inner.tick(sink, inputs);
            }
        }
    }

    /// A missing or short pattern must never halt playback
    fn fall_back_to_recording(&mut self, sink: &mut dyn OutputSink, inputs: TickInputs) {
        log::warn!(
            "{}: replay unavailable at tick {}, falling back to recording",
            self.inner.name(),
            self.tick
        );
        self.change_state(LoopState::Recording, sink);
        self.recording.push(inputs);
        self.inner.tick(sink, inputs);
    }
}
