// Scale - ordered pitch sets for stochastic note selection
// Built from a tonic and an interval pattern, or from an explicit pitch list

use thiserror::Error;

/// MIDI pitch anchors for common octaves
pub const C1: u8 = 36;
pub const C2: u8 = 48;
pub const C3: u8 = 60;

/// Errors raised while building a scale
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScaleError {
    /// Interval patterns must span exactly one octave
    #[error("interval pattern spans {0} semitones, expected 12")]
    IntervalSpan(u32),

    /// The tonic is outside the valid MIDI pitch range
    #[error("tonic {0} is outside the MIDI pitch range (0-127)")]
    TonicRange(u8),
}

/// An ordered, duplicate-free set of MIDI pitches a policy can choose from
///
/// Pitches are kept strictly ascending. Policies read scales by index or by
/// fractional position; the scale is never mutated mid-tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    pitches: Vec<u8>,
}

impl Scale {
    /// Build an octave-repeating scale from a tonic and an interval pattern
    ///
    /// The pattern must sum to exactly 12 semitones (one octave). It is
    /// repeated `octaves` times starting at `tonic`; pitches that would
    /// exceed 127 are dropped, not wrapped, so every derived pitch stays in
    /// range without octave reduction.
    pub fn from_pattern(tonic: u8, intervals: &[u8], octaves: u8) -> Result<Self, ScaleError> {
        if tonic > 127 {
            return Err(ScaleError::TonicRange(tonic));
        }
        let span: u32 = intervals.iter().map(|&i| i as u32).sum();
        if span != 12 {
            return Err(ScaleError::IntervalSpan(span));
        }

        let mut pitches = vec![tonic];
        let mut note = tonic as u32;
        for _ in 0..octaves {
            for &step in intervals {
                note += step as u32;
                if note <= 127 {
                    pitches.push(note as u8);
                }
            }
        }
        Ok(Self { pitches })
    }

    /// Build a scale from an explicit pitch list, sorted ascending
    ///
    /// Deduplication is the caller's responsibility; duplicate entries skew
    /// fractional lookups but are not rejected here.
    pub fn from_pitches(mut pitches: Vec<u8>) -> Self {
        pitches.sort_unstable();
        Self { pitches }
    }

    /// Number of pitches in the scale
    pub fn len(&self) -> usize {
        self.pitches.len()
    }

    /// True when the scale holds no pitches
    pub fn is_empty(&self) -> bool {
        self.pitches.is_empty()
    }

    /// Pitch at `index`, wrapping modulo the scale length
    pub fn pitch(&self, index: usize) -> u8 {
        self.pitches[index % self.pitches.len()]
    }

    /// Pitch at fractional position `r` in [0, 1)
    pub fn at_fraction(&self, r: f64) -> u8 {
        self.pitches[self.index_at_fraction(r)]
    }

    /// Index at fractional position `r` in [0, 1)
    pub fn index_at_fraction(&self, r: f64) -> usize {
        ((r * self.pitches.len() as f64) as usize).min(self.pitches.len() - 1)
    }

    /// The raw ascending pitch list
    pub fn pitches(&self) -> &[u8] {
        &self.pitches
    }
}

impl Default for Scale {
    /// Two octaves of the major scale from C2
    fn default() -> Self {
        Self::from_pattern(C2, &patterns::MAJOR, 2).expect("major pattern spans one octave")
    }
}

/// Named interval patterns, each spanning one octave
pub mod patterns {
    // Diatonic modes
    pub const IONIAN: [u8; 7] = [2, 2, 1, 2, 2, 2, 1];
    pub const MAJOR: [u8; 7] = IONIAN;
    pub const DORIAN: [u8; 7] = [2, 1, 2, 2, 2, 1, 2];
    pub const PHRYGIAN: [u8; 7] = [1, 2, 2, 2, 1, 2, 2];
    pub const LYDIAN: [u8; 7] = [2, 2, 2, 1, 2, 2, 1];
    pub const MIXOLYDIAN: [u8; 7] = [2, 2, 1, 2, 2, 1, 2];
    pub const AEOLIAN: [u8; 7] = [2, 1, 2, 2, 1, 2, 2];
    pub const MINOR: [u8; 7] = AEOLIAN;
    pub const LOCRIAN: [u8; 7] = [1, 2, 2, 1, 2, 2, 2];

    // Pentatonic
    pub const HIRAJOSHI: [u8; 5] = [4, 2, 1, 4, 1];
    pub const INSEN: [u8; 5] = [1, 4, 2, 3, 2];
    pub const IWATO: [u8; 5] = [1, 4, 1, 4, 2];

    // Others
    pub const ENIGMATIC: [u8; 7] = [1, 3, 2, 2, 2, 1, 1];
    pub const FLAMENCO: [u8; 7] = [1, 3, 1, 2, 1, 3, 1];
    pub const GYPSY: [u8; 7] = [2, 1, 3, 1, 1, 2, 2];
    pub const PROMETHEUS: [u8; 6] = [2, 2, 2, 3, 1, 2];
    pub const PHRYGIAN_DOMINANT: [u8; 7] = [1, 3, 1, 2, 1, 2, 2];

    /// Look up a pattern by its lowercase name (used by the config layer)
    pub fn by_name(name: &str) -> Option<&'static [u8]> {
        Some(match name {
            "ionian" | "major" => &IONIAN,
            "dorian" => &DORIAN,
            "phrygian" => &PHRYGIAN,
            "lydian" => &LYDIAN,
            "mixolydian" => &MIXOLYDIAN,
            "aeolian" | "minor" => &AEOLIAN,
            "locrian" => &LOCRIAN,
            "hirajoshi" => &HIRAJOSHI,
            "insen" => &INSEN,
            "iwato" => &IWATO,
            "enigmatic" => &ENIGMATIC,
            "flamenco" => &FLAMENCO,
            "gypsy" => &GYPSY,
            "prometheus" => &PROMETHEUS,
            "phrygian_dominant" => &PHRYGIAN_DOMINANT,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pattern_one_octave() {
        let scale = Scale::from_pattern(C2, &patterns::MAJOR, 1).unwrap();

        // 7 intervals + tonic = 8 pitches: C D E F G A B C
        assert_eq!(scale.pitches(), &[48, 50, 52, 53, 55, 57, 59, 60]);
        assert_eq!(scale.len(), 8);
    }

    #[test]
    fn test_from_pattern_strictly_increasing() {
        let scale = Scale::from_pattern(C1, &patterns::GYPSY, 2).unwrap();
        for pair in scale.pitches().windows(2) {
            assert!(pair[0] < pair[1]);
        }
        // 2 octaves of a 7-interval pattern, all within range
        assert_eq!(scale.len(), 15);
    }

    #[test]
    fn test_from_pattern_rejects_bad_span() {
        let err = Scale::from_pattern(C2, &[2, 2, 2], 1).unwrap_err();
        assert_eq!(err, ScaleError::IntervalSpan(6));

        let err = Scale::from_pattern(C2, &[], 1).unwrap_err();
        assert_eq!(err, ScaleError::IntervalSpan(0));
    }

    #[test]
    fn test_from_pattern_drops_overflow() {
        // Tonic 120: only 120, 122, 124, 125, 127 fit in one octave of major
        let scale = Scale::from_pattern(120, &patterns::MAJOR, 1).unwrap();
        assert_eq!(scale.pitches(), &[120, 122, 124, 125, 127]);
    }

    #[test]
    fn test_from_pattern_rejects_bad_tonic() {
        let err = Scale::from_pattern(130, &patterns::MAJOR, 1).unwrap_err();
        assert_eq!(err, ScaleError::TonicRange(130));
    }

    #[test]
    fn test_from_pitches_sorts() {
        let scale = Scale::from_pitches(vec![64, 48, 55]);
        assert_eq!(scale.pitches(), &[48, 55, 64]);
    }

    #[test]
    fn test_fractional_lookup() {
        let scale = Scale::from_pattern(C2, &patterns::MAJOR, 1).unwrap();

        assert_eq!(scale.at_fraction(0.0), 48);
        // 0.5 * 8 = 4 -> fifth pitch
        assert_eq!(scale.at_fraction(0.5), 55);
        assert_eq!(scale.at_fraction(0.999), 60);
    }

    #[test]
    fn test_index_wraps() {
        let scale = Scale::from_pitches(vec![48, 50, 52]);
        assert_eq!(scale.pitch(0), 48);
        assert_eq!(scale.pitch(3), 48);
        assert_eq!(scale.pitch(5), 52);
    }

    #[test]
    fn test_pattern_lookup_by_name() {
        assert_eq!(patterns::by_name("major"), Some(&patterns::MAJOR[..]));
        assert_eq!(patterns::by_name("gypsy"), Some(&patterns::GYPSY[..]));
        assert_eq!(patterns::by_name("unknown"), None);
    }

    #[test]
    fn test_all_named_patterns_span_one_octave() {
        for name in [
            "ionian",
            "dorian",
            "phrygian",
            "lydian",
            "mixolydian",
            "aeolian",
            "locrian",
            "hirajoshi",
            "insen",
            "iwato",
            "enigmatic",
            "flamenco",
            "gypsy",
            "prometheus",
            "phrygian_dominant",
        ] {
            let pattern = patterns::by_name(name).unwrap();
            assert!(Scale::from_pattern(C2, pattern, 1).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_default_scale() {
        let scale = Scale::default();
        assert_eq!(scale.pitches()[0], C2);
        assert!(!scale.is_empty());
        // 2 octaves of major: tonic + 14 steps
        assert_eq!(scale.len(), 15);
    }
}
