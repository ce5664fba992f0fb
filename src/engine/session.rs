// Session - top-level owner of the output sink and the player list
// Drives ticks and serializes configuration changes with them

use crate::engine::inputs::TickInputs;
use crate::midi::output::OutputSink;
use crate::players::{Looper, Player};

/// A scheduled voice: a plain player or a looper-wrapped one
#[derive(Debug)]
pub enum Voice {
    Player(Player),
    Looper(Looper),
}

impl Voice {
    pub fn name(&self) -> &str {
        self.player().name()
    }

    pub fn player(&self) -> &Player {
        match self {
            Voice::Player(player) => player,
            Voice::Looper(looper) => looper.player(),
        }
    }

    pub fn player_mut(&mut self) -> &mut Player {
        match self {
            Voice::Player(player) => player,
            Voice::Looper(looper) => looper.player_mut(),
        }
    }

    fn tick(&mut self, sink: &mut dyn OutputSink, inputs: TickInputs) {
        match self {
            Voice::Player(player) => player.tick(sink, inputs),
            Voice::Looper(looper) => looper.tick(sink, inputs),
        }
    }

    fn flush(&mut self, sink: &mut dyn OutputSink) {
        match self {
            Voice::Player(player) => player.flush(sink),
            Voice::Looper(looper) => looper.flush(sink),
        }
    }
}

/// Owns the output sink and the active voices
///
/// One `tick` call advances every voice by one time step. Configuration
/// mutations go through `&mut self` between ticks, which serializes them
/// with in-flight ticks by construction.
pub struct Session {
    sink: Box<dyn OutputSink>,
    voices: Vec<Voice>,
}

impl Session {
    pub fn new(sink: Box<dyn OutputSink>) -> Self {
        Self {
            sink,
            voices: Vec::new(),
        }
    }

    pub fn add_voice(&mut self, voice: Voice) {
        log::info!("voice added: {}", voice.name());
        self.voices.push(voice);
    }

    pub fn add_player(&mut self, player: Player) {
        self.add_voice(Voice::Player(player));
    }

    pub fn add_looper(&mut self, looper: Looper) {
        self.add_voice(Voice::Looper(looper));
    }

    /// Remove a voice by name, flushing its sounding notes first
    pub fn remove_voice(&mut self, name: &str) -> bool {
        match self.voices.iter().position(|voice| voice.name() == name) {
            Some(index) => {
                let mut voice = self.voices.remove(index);
                voice.flush(self.sink.as_mut());
                log::info!("voice removed: {name}");
                true
            }
            None => false,
        }
    }

    /// Advance every voice by one tick
    ///
    /// `draw` supplies the uniform random values in [0, 1); three are
    /// consumed per voice. The engine itself never sources randomness.
    pub fn tick(&mut self, mut draw: impl FnMut() -> f64) {
        for voice in &mut self.voices {
            let inputs = TickInputs::new(draw(), draw(), draw());
            voice.tick(self.sink.as_mut(), inputs);
        }
    }

    /// Replace the output sink, flushing sounding notes to the old one
    pub fn rebind_sink(&mut self, sink: Box<dyn OutputSink>) {
        self.silence_all();
        self.sink = sink;
        log::info!("output sink rebound");
    }

    /// Note-off everything currently sounding
    pub fn silence_all(&mut self) {
        for voice in &mut self.voices {
            voice.flush(self.sink.as_mut());
        }
    }

    /// Send each player's program number on its channel
    pub fn program_change_all(&mut self) {
        for voice in &self.voices {
            let player = voice.player();
            self.sink.program_change(player.channel(), player.program());
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice_mut(&mut self, name: &str) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|voice| voice.name() == name)
    }

    /// Between-tick access for configuration mutations
    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.voice_mut(name).map(Voice::player_mut)
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
