// Session configuration - serde model of the session file
// Validated into players and loopers; every error surfaces before the
// first tick, nothing defaults silently

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::session::{Session, Voice};
use crate::engine::timing::{Tempo, TimeSignature};
use crate::engine::weights::WeightError;
use crate::midi::output::OutputSink;
use crate::players::{Looper, Player, PolicyKind};
use crate::theory::scale::{C1, C3, Scale, ScaleError, patterns};

/// Errors raised while loading or validating a session configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Weight(#[from] WeightError),

    #[error(transparent)]
    Scale(#[from] ScaleError),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown scale pattern '{0}'")]
    UnknownPattern(String),

    #[error("player '{0}' is active with an empty scale")]
    EmptyScale(String),

    #[error("tempo {0} is out of range (20-999 BPM)")]
    TempoRange(f64),
}

/// On-disk session description
///
/// Setup only: runtime state is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    #[serde(default)]
    pub time_signature: TimeSignature,
    pub players: Vec<PlayerConfig>,
}

fn default_tempo() -> f64 {
    120.0
}

/// One player entry; everything except `name` and `policy` has a default
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub policy: PolicyKind,
    #[serde(default)]
    pub channel: u8,
    #[serde(default)]
    pub program: u8,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub scale: Option<ScaleConfig>,
    #[serde(default)]
    pub weights: Option<WeightsConfig>,
    #[serde(default)]
    pub looper: bool,
    /// State-choice table for loopers (4 entries)
    #[serde(default)]
    pub state_weights: Option<Vec<u32>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_volume() -> f64 {
    1.0
}

fn default_active() -> bool {
    true
}

/// Either a tonic plus a named pattern, or an explicit pitch list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleConfig {
    Pattern {
        tonic: u8,
        pattern: String,
        #[serde(default = "default_octaves")]
        octaves: u8,
    },
    Pitches {
        pitches: Vec<u8>,
    },
}

fn default_octaves() -> u8 {
    1
}

/// Partial override of a policy's default tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default)]
    pub function: Option<Vec<u32>>,
    #[serde(default)]
    pub note_duration: Option<Vec<u32>>,
    #[serde(default)]
    pub silence_duration: Option<Vec<u32>>,
}

impl SessionConfig {
    /// Load a session config from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Validated tempo
    pub fn tempo(&self) -> Result<Tempo, ConfigError> {
        if !(20.0..=999.0).contains(&self.tempo) {
            return Err(ConfigError::TempoRange(self.tempo));
        }
        Ok(Tempo::new(self.tempo))
    }

    /// Built-in demo session: a monotone pulse and a soloist lead
    pub fn demo() -> Self {
        SessionConfig {
            tempo: 120.0,
            time_signature: TimeSignature::four_four(),
            players: vec![
                PlayerConfig {
                    name: "pulse".into(),
                    policy: PolicyKind::Monotone,
                    channel: 0,
                    program: 92,
                    volume: 1.0,
                    color: None,
                    scale: Some(ScaleConfig::Pattern {
                        tonic: C1,
                        pattern: "gypsy".into(),
                        octaves: 2,
                    }),
                    weights: None,
                    looper: false,
                    state_weights: None,
                    active: true,
                },
                PlayerConfig {
                    name: "lead".into(),
                    policy: PolicyKind::Soloist,
                    channel: 1,
                    program: 84,
                    volume: 0.5,
                    color: None,
                    scale: Some(ScaleConfig::Pattern {
                        tonic: C3,
                        pattern: "major".into(),
                        octaves: 2,
                    }),
                    weights: None,
                    looper: false,
                    state_weights: None,
                    active: true,
                },
            ],
        }
    }

    /// Validate the player list and build a session over `sink`
    pub fn build(&self, sink: Box<dyn OutputSink>) -> Result<Session, ConfigError> {
        let mut session = Session::new(sink);
        for player_config in &self.players {
            session.add_voice(player_config.build(self.time_signature)?);
        }
        Ok(session)
    }
}

impl PlayerConfig {
    fn build(&self, time_signature: TimeSignature) -> Result<Voice, ConfigError> {
        let mut player = Player::new(self.name.clone(), self.policy, self.channel);
        player.set_program(self.program);
        player.set_volume(self.volume);
        player.set_active(self.active);
        if let Some(color) = &self.color {
            player.set_color(color.clone());
        }
        if let Some(scale) = &self.scale {
            player.set_scale(scale.build()?);
        }
        if let Some(overrides) = &self.weights {
            let mut weights = player.weights().clone();
            if let Some(function) = &overrides.function {
                weights.function = function.clone();
            }
            if let Some(note_duration) = &overrides.note_duration {
                weights.note_duration = note_duration.clone();
            }
            if let Some(silence_duration) = &overrides.silence_duration {
                weights.silence_duration = silence_duration.clone();
            }
            player.update_weights(weights)?;
        }
        if self.active && player.scale().is_empty() {
            return Err(ConfigError::EmptyScale(self.name.clone()));
        }

        if self.looper {
            let mut looper = Looper::new(player, time_signature);
            if let Some(state_weights) = &self.state_weights {
                looper.update_state_weights(state_weights.clone())?;
            }
            Ok(Voice::Looper(looper))
        } else {
            Ok(Voice::Player(player))
        }
    }
}

impl ScaleConfig {
    fn build(&self) -> Result<Scale, ConfigError> {
        match self {
            ScaleConfig::Pattern {
                tonic,
                pattern,
                octaves,
            } => {
                let intervals = patterns::by_name(pattern)
                    .ok_or_else(|| ConfigError::UnknownPattern(pattern.clone()))?;
                Ok(Scale::from_pattern(*tonic, intervals, *octaves)?)
            }
            ScaleConfig::Pitches { pitches } => Ok(Scale::from_pitches(pitches.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::output::EventCollector;

    fn sink() -> Box<dyn OutputSink> {
        Box::new(EventCollector::new())
    }

    #[test]
    fn test_demo_config_builds() {
        let session = SessionConfig::demo().build(sink()).unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.voices()[0].player().program(), 92);
        assert_eq!(session.voices()[1].player().channel(), 1);
    }

    #[test]
    fn test_parse_full_player_entry() {
        let json = r##"{
            "tempo": 96.0,
            "time_signature": { "numerator": 3, "denominator": 4 },
            "players": [
                {
                    "name": "lead",
                    "policy": "soloist",
                    "channel": 1,
                    "program": 84,
                    "volume": 0.5,
                    "scale": { "tonic": 60, "pattern": "minor", "octaves": 2 },
                    "weights": { "function": [2, 1, 4, 4, 2] },
                    "color": "#7caadc"
                }
            ]
        }"##;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tempo, 96.0);
        assert_eq!(config.time_signature, TimeSignature::three_four());

        let session = config.build(sink()).unwrap();
        let player = session.voices()[0].player();
        assert_eq!(player.name(), "lead");
        assert_eq!(player.volume(), 0.5);
        assert_eq!(player.color(), "#7caadc");
        assert_eq!(player.weights().function, vec![2, 1, 4, 4, 2]);
    }

    #[test]
    fn test_parse_pitch_list_scale() {
        let json = r#"{
            "players": [
                { "name": "p", "policy": "basic",
                  "scale": { "pitches": [64, 48, 55] } }
            ]
        }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        let session = config.build(sink()).unwrap();
        assert_eq!(session.voices()[0].player().scale().pitches(), &[48, 55, 64]);
    }

    #[test]
    fn test_defaults_fill_in() {
        let json = r#"{ "players": [ { "name": "p", "policy": "chaotic" } ] }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tempo, 120.0);

        let session = config.build(sink()).unwrap();
        let player = session.voices()[0].player();
        assert_eq!(player.channel(), 0);
        assert_eq!(player.volume(), 1.0);
        assert!(player.is_active());
        assert!(!player.scale().is_empty());
    }

    #[test]
    fn test_unknown_pattern_rejected() {
        let json = r#"{
            "players": [
                { "name": "p", "policy": "basic",
                  "scale": { "tonic": 48, "pattern": "klingon" } }
            ]
        }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(
            config.build(sink()),
            Err(ConfigError::UnknownPattern(name)) if name == "klingon"
        ));
    }

    #[test]
    fn test_bad_function_table_rejected() {
        let json = r#"{
            "players": [
                { "name": "p", "policy": "basic",
                  "weights": { "function": [1, 1] } }
            ]
        }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(
            config.build(sink()),
            Err(ConfigError::Weight(WeightError::FunctionCount { got: 2, expected: 4 }))
        ));
    }

    #[test]
    fn test_zero_sum_table_rejected() {
        let json = r#"{
            "players": [
                { "name": "p", "policy": "basic",
                  "weights": { "silence_duration": [0, 0, 0] } }
            ]
        }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(
            config.build(sink()),
            Err(ConfigError::Weight(WeightError::ZeroSum))
        ));
    }

    #[test]
    fn test_empty_scale_rejected_for_active_player() {
        let json = r#"{
            "players": [
                { "name": "p", "policy": "basic",
                  "scale": { "pitches": [] } }
            ]
        }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(
            config.build(sink()),
            Err(ConfigError::EmptyScale(name)) if name == "p"
        ));

        // The same scale is fine on an inactive player
        let json = r#"{
            "players": [
                { "name": "p", "policy": "basic", "active": false,
                  "scale": { "pitches": [] } }
            ]
        }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert!(config.build(sink()).is_ok());
    }

    #[test]
    fn test_looper_entry_builds() {
        let json = r#"{
            "players": [
                { "name": "loop", "policy": "basic", "looper": true,
                  "state_weights": [0, 1, 0, 0] }
            ]
        }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        let session = config.build(sink()).unwrap();
        assert!(matches!(session.voices()[0], Voice::Looper(_)));
    }

    #[test]
    fn test_bad_state_table_rejected() {
        let json = r#"{
            "players": [
                { "name": "loop", "policy": "basic", "looper": true,
                  "state_weights": [1, 2] } ]
        }"#;
        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(
            config.build(sink()),
            Err(ConfigError::Weight(WeightError::StateCount { got: 2, expected: 4 }))
        ));
    }

    #[test]
    fn test_tempo_range_validated() {
        let mut config = SessionConfig::demo();
        config.tempo = 5.0;
        assert!(matches!(config.tempo(), Err(ConfigError::TempoRange(_))));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = SessionConfig::demo();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.players.len(), config.players.len());
        assert_eq!(parsed.players[0].name, "pulse");
    }
}
