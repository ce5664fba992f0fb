// Players - stochastic note sources ticked by the session
// A player owns its scale, weight tables, policy state, and note scheduler

pub mod looper;
pub mod policy;

pub use looper::{LoopState, Looper, MeasurePattern, PatternMemory};
pub use policy::{Policy, PolicyKind};

use crate::engine::inputs::TickInputs;
use crate::engine::scheduler::NoteScheduler;
use crate::engine::weights::{WeightError, WeightTable};
use crate::midi::output::OutputSink;
use crate::theory::scale::Scale;

/// Base duration lookup in ticks, indexed by duration-table draws
///
/// At 4 ticks per beat these run from a sixteenth note to a double note.
pub const DURATIONS: [u32; 10] = [1, 2, 3, 4, 6, 8, 12, 16, 24, 32];

/// Gaussian velocity parameters (MIDI mean and spread)
const VELOCITY_MEAN: f64 = 64.0;
const VELOCITY_STD_DEV: f64 = 16.0;

/// Raw integer weight tables, by role
///
/// The roles are named fields end to end; there is no positional form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerWeights {
    /// One entry per policy function; index 0 is the silence behavior
    pub function: Vec<u32>,
    /// Distribution over `DURATIONS` for notes with no explicit duration
    pub note_duration: Vec<u32>,
    /// Distribution over `DURATIONS` for the length of rests
    pub silence_duration: Vec<u32>,
}

/// Cumulative forms of the player's tables, rebuilt on every update
#[derive(Debug, Clone)]
struct NormalizedWeights {
    function: WeightTable,
    note_duration: WeightTable,
    silence_duration: WeightTable,
}

impl NormalizedWeights {
    fn build(weights: &PlayerWeights, kind: PolicyKind) -> Result<Self, WeightError> {
        let expected = kind.function_count();
        if weights.function.len() != expected {
            return Err(WeightError::FunctionCount {
                got: weights.function.len(),
                expected,
            });
        }
        for table in [&weights.note_duration, &weights.silence_duration] {
            if table.len() > DURATIONS.len() {
                return Err(WeightError::TooManyDurations {
                    got: table.len(),
                    max: DURATIONS.len(),
                });
            }
        }
        Ok(Self {
            function: WeightTable::normalize(&weights.function)?,
            note_duration: WeightTable::normalize(&weights.note_duration)?,
            silence_duration: WeightTable::normalize(&weights.silence_duration)?,
        })
    }
}

/// One stochastic voice: identity, output coordinates, scale, tables,
/// policy state, and the note scheduler
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    color: String, // opaque display tag for UI layers
    channel: u8,
    program: u8,
    volume: f64,
    active: bool,
    scale: Scale,
    weights: PlayerWeights,
    tables: NormalizedWeights,
    duration_multiplier: u32,
    policy: Policy,
    scheduler: NoteScheduler,
}

impl Player {
    /// Create a player with the policy's default tables and scale
    pub fn new(name: impl Into<String>, kind: PolicyKind, channel: u8) -> Self {
        let weights = kind.default_weights();
        let tables =
            NormalizedWeights::build(&weights, kind).expect("policy default tables are valid");
        Self {
            name: name.into(),
            color: String::new(),
            channel,
            program: 0,
            volume: 1.0,
            active: true,
            scale: Scale::default(),
            weights,
            tables,
            duration_multiplier: kind.duration_multiplier(),
            policy: Policy::new(kind),
            scheduler: NoteScheduler::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Move the player to another MIDI channel
    ///
    /// Sounding notes are not re-sent; the caller should flush first if
    /// notes are held, or the old channel keeps them until their note-off.
    pub fn set_channel(&mut self, channel: u8) {
        self.channel = channel;
    }

    pub fn program(&self) -> u8 {
        self.program
    }

    pub fn set_program(&mut self, program: u8) {
        self.program = program;
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Velocity multiplier; 1.0 is nominal
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.max(0.0);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activate or deactivate the player
    ///
    /// Deactivation takes effect on the next tick, which flushes any
    /// sounding pitches before the player goes silent.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: String) {
        self.color = color;
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    /// Replace the scale wholesale; safe between ticks at any time
    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
    }

    pub fn weights(&self) -> &PlayerWeights {
        &self.weights
    }

    /// Replace the raw weight tables, re-normalizing and re-validating
    pub fn update_weights(&mut self, weights: PlayerWeights) -> Result<(), WeightError> {
        self.tables = NormalizedWeights::build(&weights, self.kind())?;
        self.weights = weights;
        Ok(())
    }

    /// Pitches currently held on
    pub fn sounding(&self) -> &[u8] {
        self.scheduler.sounding()
    }

    /// Advance the player by one tick
    ///
    /// While the countdown runs, the tick only decrements it. Otherwise the
    /// sounding set is released and one of the active policy's functions is
    /// resolved from `inputs.func` and dispatched. An inactive player
    /// flushes whatever it still holds and stays silent.
    pub fn tick(&mut self, sink: &mut dyn OutputSink, inputs: TickInputs) {
        if !self.active {
            // Deactivation flushes held notes at the next tick boundary
            self.scheduler.flush(sink, self.channel);
            return;
        }
        if self.scheduler.holding() {
            self.scheduler.count_down();
            return;
        }
        self.scheduler.release_all(sink, self.channel);

        if self.forced_half_beat() {
            // Monotone's half-beat flag bypasses the function table
            self.monotone(2, sink, inputs);
            return;
        }
        let function = self.tables.function.resolve(inputs.func);
        self.dispatch(function, sink, inputs);
    }

    /// Force note-off on anything sounding and cancel the countdown
    pub fn flush(&mut self, sink: &mut dyn OutputSink) {
        self.scheduler.flush(sink, self.channel);
    }
}
