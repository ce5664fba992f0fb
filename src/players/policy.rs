// Player policies - the closed set of per-tick behaviors
// Function indices resolve into match arms, never into constructed names;
// table arity is validated at configuration time so every index lands

use serde::{Deserialize, Serialize};

use crate::engine::inputs::{TickInputs, split};
use crate::engine::timing::TICKS_PER_BEAT;
use crate::midi::output::OutputSink;
use crate::players::{DURATIONS, Player, PlayerWeights, VELOCITY_MEAN, VELOCITY_STD_DEV};

/// Which stochastic behavior family a player runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Chaotic,
    Basic,
    Soloist,
    Pad,
    Monotone,
}

impl PolicyKind {
    /// Entries the function-choice table must have
    /// (function 0 is the shared silence behavior)
    pub fn function_count(&self) -> usize {
        match self {
            PolicyKind::Soloist => 5,
            _ => 4,
        }
    }

    /// Multiplier applied to the base duration lookup
    pub fn duration_multiplier(&self) -> u32 {
        match self {
            PolicyKind::Pad | PolicyKind::Monotone => 4,
            _ => 1,
        }
    }

    /// The tables the policy ships with before any configuration
    pub fn default_weights(&self) -> PlayerWeights {
        match self {
            PolicyKind::Chaotic | PolicyKind::Basic => PlayerWeights {
                function: vec![5, 2, 2, 1],
                note_duration: vec![1, 2, 0, 10, 0, 3, 0, 1, 0, 0],
                silence_duration: vec![1, 2, 0, 10, 0, 3, 0, 1, 0, 0],
            },
            PolicyKind::Soloist => PlayerWeights {
                function: vec![2, 1, 4, 4, 2],
                note_duration: vec![8, 12, 1, 4, 0, 1, 0, 0, 0, 0],
                silence_duration: vec![1, 2, 0, 10, 0, 3, 0, 1, 0, 0],
            },
            PolicyKind::Pad => PlayerWeights {
                function: vec![6, 2, 2, 4],
                note_duration: vec![1, 2, 0, 10, 0, 6, 0, 6, 0, 4],
                silence_duration: vec![1, 2, 0, 10, 0, 3, 0, 1, 0, 0],
            },
            PolicyKind::Monotone => PlayerWeights {
                function: vec![1, 10, 2, 1],
                // Placeholder: every Monotone duration is explicit
                note_duration: vec![1],
                silence_duration: vec![1, 2, 0, 10, 0, 4, 0, 1, 0, 1],
            },
        }
    }
}

/// Policy tag plus any persistent per-policy state
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    Chaotic,
    Basic,
    Pad,
    Soloist { index: usize, direction: i8 },
    Monotone { pitch: Option<u8>, half_beat: bool },
}

impl Policy {
    pub fn new(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::Chaotic => Policy::Chaotic,
            PolicyKind::Basic => Policy::Basic,
            PolicyKind::Pad => Policy::Pad,
            PolicyKind::Soloist => Policy::Soloist {
                index: 0,
                direction: 1,
            },
            PolicyKind::Monotone => Policy::Monotone {
                pitch: None,
                half_beat: false,
            },
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Chaotic => PolicyKind::Chaotic,
            Policy::Basic => PolicyKind::Basic,
            Policy::Pad => PolicyKind::Pad,
            Policy::Soloist { .. } => PolicyKind::Soloist,
            Policy::Monotone { .. } => PolicyKind::Monotone,
        }
    }
}

impl Player {
    /// Monotone's forced half-beat branch bypasses the function table
    pub(super) fn forced_half_beat(&self) -> bool {
        matches!(
            self.policy,
            Policy::Monotone {
                half_beat: true,
                ..
            }
        )
    }

    /// Run the resolved function index for this tick
    pub(super) fn dispatch(&mut self, function: usize, sink: &mut dyn OutputSink, inputs: TickInputs) {
        debug_assert!(
            !self.scale.is_empty(),
            "active player requires a non-empty scale"
        );
        if function == 0 {
            self.rest(inputs);
            return;
        }
        match self.policy.kind() {
            PolicyKind::Chaotic => self.chaotic(function, sink, inputs),
            PolicyKind::Basic | PolicyKind::Pad => self.basic(function, sink, inputs),
            PolicyKind::Soloist => self.soloist(function, sink, inputs),
            PolicyKind::Monotone => self.monotone(function, sink, inputs),
        }
    }

    /// Function 0: hold silence for a duration drawn from the silence table
    fn rest(&mut self, inputs: TickInputs) {
        let i = self.tables.silence_duration.resolve(inputs.secondary);
        let duration = DURATIONS[i] * self.duration_multiplier;
        log::trace!("{}: rest for {duration} ticks", self.name);
        self.scheduler.start_silence(duration);
    }

    /// Resolve an unspecified duration from the note-duration table
    fn draw_duration(&self, r: f64) -> u32 {
        let i = self.tables.note_duration.resolve(r);
        DURATIONS[i] * self.duration_multiplier
    }

    /// Emit note-ons and arm the countdown
    ///
    /// With no explicit duration, one is drawn from the note-duration table
    /// against `inputs.secondary`.
    fn play_notes(
        &mut self,
        sink: &mut dyn OutputSink,
        pitches: Vec<u8>,
        duration: Option<u32>,
        inputs: &TickInputs,
    ) {
        let duration = duration.unwrap_or_else(|| self.draw_duration(inputs.secondary));
        let velocity = (self.volume * inputs.velocity_gauss(VELOCITY_MEAN, VELOCITY_STD_DEV))
            .clamp(0.0, 127.0) as u8;
        log::trace!(
            "{}: notes {pitches:?} for {duration} ticks at velocity {velocity}",
            self.name
        );
        self.scheduler
            .start_notes(sink, self.channel, pitches, duration, velocity);
    }

    /// Chaotic f1-f3: 1 to 3 distinct pitches anywhere on the scale
    fn chaotic(&mut self, function: usize, sink: &mut dyn OutputSink, inputs: TickInputs) {
        let (pitches, leftover) = self.pick_distinct(function, inputs.primary, inputs.secondary);
        let duration = self.draw_duration(leftover);
        self.play_notes(sink, pitches, Some(duration), &inputs);
    }

    /// Pick `count` distinct scale pitches from two uniform draws
    ///
    /// The first index comes straight from `primary`; later indices come
    /// from successive sub-draws of `secondary` over the shrinking set of
    /// unused slots, skip-adjusted past indices already taken. Returns the
    /// pitches and the unconsumed remainder of `secondary`.
    fn pick_distinct(&self, count: usize, primary: f64, secondary: f64) -> (Vec<u8>, f64) {
        let len = self.scale.len();
        let count = count.min(len);

        let mut taken: Vec<usize> = Vec::with_capacity(count);
        taken.push(split(primary, len).0);
        let mut r = secondary;
        while taken.len() < count {
            let (draw, rest) = split(r, len - taken.len());
            r = rest;
            let mut index = draw;
            for &used in &taken {
                if index >= used {
                    index += 1;
                }
            }
            let slot = taken.binary_search(&index).unwrap_or_else(|slot| slot);
            taken.insert(slot, index);
        }
        (taken.iter().map(|&i| self.scale.pitch(i)).collect(), r)
    }

    /// Basic/Pad f1-f3: fractional positions and a stacked-thirds triad
    fn basic(&mut self, function: usize, sink: &mut dyn OutputSink, inputs: TickInputs) {
        let pitches = match function {
            1 => vec![self.scale.at_fraction(inputs.primary)],
            2 => vec![
                self.scale.at_fraction(inputs.primary),
                self.scale.at_fraction(inputs.secondary),
            ],
            _ => {
                // Triad in scale steps: root, +2, +4, wrapping at the top
                let root = self.scale.index_at_fraction(inputs.primary);
                vec![
                    self.scale.pitch(root),
                    self.scale.pitch(root + 2),
                    self.scale.pitch(root + 4),
                ]
            }
        };
        self.play_notes(sink, pitches, None, &inputs);
    }

    /// Soloist f1-f4: a walking index over the scale
    fn soloist(&mut self, function: usize, sink: &mut dyn OutputSink, inputs: TickInputs) {
        let len = self.scale.len();
        let (mut index, mut direction) = match self.policy {
            Policy::Soloist { index, direction } => (index, direction),
            _ => return,
        };

        match function {
            // Jump anywhere
            1 => index = split(inputs.primary, len).0,
            // One step along the current direction
            2 => index = step_index(index, direction as i64, len),
            // Two steps
            3 => index = step_index(index, 2 * direction as i64, len),
            // Flip direction, then one step
            _ => {
                direction = -direction;
                index = step_index(index, direction as i64, len);
            }
        }

        self.policy = Policy::Soloist { index, direction };
        let pitch = self.scale.pitch(index);
        self.play_notes(sink, vec![pitch], None, &inputs);
    }

    /// Monotone f1-f3: one held pitch on beat or half-beat
    pub(super) fn monotone(&mut self, function: usize, sink: &mut dyn OutputSink, inputs: TickInputs) {
        let current = match self.policy {
            Policy::Monotone { pitch, .. } => pitch,
            _ => return,
        };
        // f3 re-picks the pitch; the very first use seeds it the same way
        let pitch = match (function, current) {
            (3, _) | (_, None) => self.scale.at_fraction(inputs.primary),
            (_, Some(p)) => p,
        };
        let (duration, toggle) = match function {
            2 => (TICKS_PER_BEAT / 2, true),
            _ => (TICKS_PER_BEAT, false),
        };

        if let Policy::Monotone {
            pitch: stored,
            half_beat,
        } = &mut self.policy
        {
            *stored = Some(pitch);
            if toggle {
                *half_beat = !*half_beat;
            }
        }
        self.play_notes(sink, vec![pitch], Some(duration), &inputs);
    }
}

/// Wrap `index + by` into [0, len), stepping over the scale circularly
fn step_index(index: usize, by: i64, len: usize) -> usize {
    (index as i64 + by).rem_euclid(len as i64) as usize
}
