// MIDI event types - the outbound messages the engine can emit

/// An outbound MIDI message; the channel is supplied at render time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
    ProgramChange { program: u8 },
}

impl MidiEvent {
    /// Render the wire bytes for `channel` (0-15)
    ///
    /// Note messages are three bytes, program change two. Data bytes are
    /// masked to 7 bits; note-off carries the conventional release
    /// velocity of 64.
    pub fn to_bytes(&self, channel: u8) -> Vec<u8> {
        let ch = channel & 0x0F;
        match *self {
            MidiEvent::NoteOn { pitch, velocity } => {
                vec![0x90 | ch, pitch & 0x7F, velocity & 0x7F]
            }
            MidiEvent::NoteOff { pitch } => vec![0x80 | ch, pitch & 0x7F, 0x40],
            MidiEvent::ProgramChange { program } => vec![0xC0 | ch, program & 0x7F],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_bytes() {
        let event = MidiEvent::NoteOn {
            pitch: 60,
            velocity: 100,
        };
        assert_eq!(event.to_bytes(0), vec![0x90, 60, 100]);
        assert_eq!(event.to_bytes(9), vec![0x99, 60, 100]);
    }

    #[test]
    fn test_note_off_bytes() {
        let event = MidiEvent::NoteOff { pitch: 64 };
        assert_eq!(event.to_bytes(1), vec![0x81, 64, 0x40]);
    }

    #[test]
    fn test_program_change_bytes() {
        let event = MidiEvent::ProgramChange { program: 92 };
        assert_eq!(event.to_bytes(15), vec![0xCF, 92]);
    }

    #[test]
    fn test_channel_masked_to_four_bits() {
        let event = MidiEvent::NoteOff { pitch: 60 };
        // Channel 16 wraps to 0
        assert_eq!(event.to_bytes(16)[0], 0x80);
    }
}
