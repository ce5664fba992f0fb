// Note scheduler - sounding-set and countdown bookkeeping for one player
// Holds notes across ticks and releases them when the countdown expires

use crate::midi::output::OutputSink;

/// The pitches a player currently holds "on", plus the remaining tick count
///
/// A duration of `n` ticks arms a countdown of `n - 1`: the tick that
/// starts a note (or a rest) already counts against its duration.
#[derive(Debug, Clone, Default)]
pub struct NoteScheduler {
    wait_ticks: u32,
    sounding: Vec<u8>,
}

impl NoteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a prior note or rest still has ticks to run
    pub fn holding(&self) -> bool {
        self.wait_ticks > 0
    }

    /// Consume one tick of the countdown
    pub fn count_down(&mut self) {
        self.wait_ticks = self.wait_ticks.saturating_sub(1);
    }

    /// Release every sounding pitch (no-op when none are sounding)
    pub fn release_all(&mut self, sink: &mut dyn OutputSink, channel: u8) {
        for &pitch in &self.sounding {
            sink.note_off(channel, pitch);
        }
        self.sounding.clear();
    }

    /// Start a pitch set: note-on each pitch, then hold for `duration` ticks
    ///
    /// Pitches above 127 are logged and skipped; they are neither sent nor
    /// remembered for release.
    pub fn start_notes(
        &mut self,
        sink: &mut dyn OutputSink,
        channel: u8,
        pitches: Vec<u8>,
        duration: u32,
        velocity: u8,
    ) {
        let mut sounding = Vec::with_capacity(pitches.len());
        for pitch in pitches {
            if pitch > 127 {
                log::warn!("dropping out-of-range pitch {pitch} on channel {channel}");
                continue;
            }
            sink.note_on(channel, pitch, velocity);
            sounding.push(pitch);
        }
        self.wait_ticks = duration.saturating_sub(1);
        self.sounding = sounding;
    }

    /// Rest: emit nothing and hold for `duration` ticks
    pub fn start_silence(&mut self, duration: u32) {
        self.wait_ticks = duration.saturating_sub(1);
    }

    /// Pitches currently held on
    pub fn sounding(&self) -> &[u8] {
        &self.sounding
    }

    /// Ticks left before the scheduler acts again
    pub fn wait_ticks(&self) -> u32 {
        self.wait_ticks
    }

    /// Immediate flush: release everything and cancel the countdown
    pub fn flush(&mut self, sink: &mut dyn OutputSink, channel: u8) {
        self.release_all(sink, channel);
        self.wait_ticks = 0;
    }
}
