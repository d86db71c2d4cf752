//! Transport and playback scheduling.
//!
//! The transport ticks once per sixteenth note: the UI loop feeds frame
//! deltas into an accumulator, and every elapsed step duration advances the
//! playhead and fires triggers. Because ticks and command execution
//! interleave on the UI thread, every tick sees the model either fully
//! before or fully after any given command.
//!
//! Trigger order within one tick is deterministic: patterns in placement
//! enumeration order, channels ascending, step events before pitched-note
//! events on the same channel.

use std::path::Path;
use std::time::Duration;

use crate::audio::AudioHandle;
use crate::coords::{BarIdx, StepIdx};
use crate::song::{ChannelKind, Pattern, Song};

/// What the transport follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Loop the current pattern
    #[default]
    Pattern,
    /// Follow the arrangement timeline
    Arrangement,
}

/// Transport state: playing flag, mode, and the playhead.
///
/// Stopping cancels the tick but does not reset the playhead; starting
/// fires the current step immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transport {
    pub playing: bool,
    pub mode: TransportMode,
    step: StepIdx,
    bar: BarIdx,
    accumulator: Duration,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playhead_step(&self) -> usize {
        self.step.as_usize()
    }

    pub fn arrangement_bar(&self) -> usize {
        self.bar.as_usize()
    }

    /// Start playback, firing the current step immediately
    pub fn start(&mut self, mode: TransportMode, song: &Song, samples_root: &Path, audio: &AudioHandle) {
        self.mode = mode;
        self.playing = true;
        self.accumulator = Duration::ZERO;
        self.fire_step(song, samples_root, audio);
    }

    /// Start arrangement playback from a specific bar
    pub fn start_arrangement_from(
        &mut self,
        bar: usize,
        song: &Song,
        samples_root: &Path,
        audio: &AudioHandle,
    ) {
        self.bar = BarIdx(bar % BarIdx::COUNT);
        self.step = StepIdx::FIRST;
        self.start(TransportMode::Arrangement, song, samples_root, audio);
    }

    /// Stop playback. The playhead stays where it is.
    pub fn stop(&mut self) {
        self.playing = false;
        self.accumulator = Duration::ZERO;
    }

    /// One sixteenth note at the song's BPM
    fn step_duration(song: &Song) -> Duration {
        let bpm = song.bpm.clamp(20.0, 999.0);
        Duration::from_secs_f64(60.0 / bpm / 4.0)
    }

    /// Feed a frame delta into the tick accumulator.
    ///
    /// The step duration is re-read from the song every tick, so a BPM
    /// change takes effect on the next tick without touching the playhead.
    pub fn tick(&mut self, delta: Duration, song: &Song, samples_root: &Path, audio: &AudioHandle) {
        if !self.playing {
            return;
        }

        self.accumulator += delta;
        let mut step_duration = Self::step_duration(song);
        while self.accumulator >= step_duration {
            self.accumulator -= step_duration;
            self.advance_step(song, samples_root, audio);
            step_duration = Self::step_duration(song);
        }
    }

    /// Advance the playhead one step and fire it.
    ///
    /// In arrangement mode the bar advances exactly once per step wrap.
    pub fn advance_step(&mut self, song: &Song, samples_root: &Path, audio: &AudioHandle) {
        self.step = self.step.next();
        if self.step == StepIdx::FIRST && self.mode == TransportMode::Arrangement {
            self.bar = self.bar.next();
        }
        self.fire_step(song, samples_root, audio);
    }

    /// Emit triggers for the playhead position
    fn fire_step(&self, song: &Song, samples_root: &Path, audio: &AudioHandle) {
        let step = self.step.as_usize();
        match self.mode {
            TransportMode::Pattern => {
                if let Some(pattern) = song.current_pattern() {
                    fire_pattern_step(song, pattern, step, samples_root, audio);
                }
            }
            TransportMode::Arrangement => {
                for placement in song.arrangement.active_placements_at_bar(self.bar.as_usize()) {
                    if let Some(pattern) = song.pattern(placement.pattern_id) {
                        fire_pattern_step(song, pattern, step, samples_root, audio);
                    }
                }
            }
        }
    }
}

/// Fire one pattern's triggers for a step, channels in ascending order
fn fire_pattern_step(
    song: &Song,
    pattern: &Pattern,
    step: usize,
    samples_root: &Path,
    audio: &AudioHandle,
) {
    let has_solo = song.has_solo();
    let step_secs = Transport::step_duration(song).as_secs_f32();

    for (idx, channel) in song.channels.iter().enumerate() {
        if channel.muted || (has_solo && !channel.solo) {
            continue;
        }

        match channel.kind {
            ChannelKind::Sample => {
                // An unassigned sample channel contributes silence
                if channel.sample_ref.is_empty() {
                    continue;
                }
                let path = samples_root.join(&channel.sample_ref);
                if pattern.get_step(idx, step) {
                    audio.trigger_sample(&path, channel.gain());
                }
                for note in pattern.notes(idx) {
                    if note.start_step == step {
                        audio.trigger_sample_pitched(&path, note.pitch, channel.gain());
                    }
                }
            }
            ChannelKind::Synth => {
                for note in pattern.notes(idx) {
                    if note.start_step == step {
                        audio.trigger_synth(
                            &channel.synth_patch,
                            note.pitch,
                            note.duration as f32 * step_secs,
                            channel.gain(),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioCommand;
    use crate::song::{Note, PatternPlacement};
    use std::path::PathBuf;

    fn song_with_steps() -> Song {
        let mut song = Song::new("test");
        song.channels[0].sample_ref = "kick.wav".to_string();
        song.channels[1].sample_ref = "snare.wav".to_string();
        let pattern = song.pattern_or_create(0);
        pattern.set_step(0, 0, true);
        pattern.set_step(0, 8, true);
        pattern.set_step(1, 4, true);
        song
    }

    fn root() -> PathBuf {
        PathBuf::from("samples")
    }

    #[test]
    fn test_start_fires_current_step() {
        let song = song_with_steps();
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();

        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        assert!(audio.has_captured(|c| matches!(
            c,
            AudioCommand::TriggerSample { path, .. } if path.ends_with("kick.wav")
        )));
    }

    #[test]
    fn test_pattern_mode_wraps_without_touching_bar() {
        let song = song_with_steps();
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();
        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        for _ in 0..40 {
            transport.advance_step(&song, &root(), &audio);
        }

        assert_eq!(transport.playhead_step(), 40 % 16);
        assert_eq!(transport.arrangement_bar(), 0);
    }

    #[test]
    fn test_arrangement_bar_advances_once_per_wrap() {
        let song = song_with_steps();
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();
        transport.start(TransportMode::Arrangement, &song, &root(), &audio);

        for _ in 0..16 {
            transport.advance_step(&song, &root(), &audio);
        }
        assert_eq!(transport.arrangement_bar(), 1);
        assert_eq!(transport.playhead_step(), 0);

        for _ in 0..16 {
            transport.advance_step(&song, &root(), &audio);
        }
        assert_eq!(transport.arrangement_bar(), 2);
    }

    #[test]
    fn test_stop_preserves_playhead() {
        let song = song_with_steps();
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();
        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        for _ in 0..5 {
            transport.advance_step(&song, &root(), &audio);
        }
        transport.stop();

        assert!(!transport.playing);
        assert_eq!(transport.playhead_step(), 5);
    }

    #[test]
    fn test_bpm_change_does_not_move_playhead() {
        let mut song = song_with_steps();
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();
        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        for _ in 0..3 {
            transport.advance_step(&song, &root(), &audio);
        }
        song.bpm = 180.0;
        assert_eq!(transport.playhead_step(), 3);

        // Next tick at the new tempo advances normally
        transport.advance_step(&song, &root(), &audio);
        assert_eq!(transport.playhead_step(), 4);
    }

    #[test]
    fn test_tick_accumulates_frame_deltas() {
        let song = song_with_steps();
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();
        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        // 140 bpm -> one step is ~107ms; two 60ms frames cross one step
        transport.tick(Duration::from_millis(60), &song, &root(), &audio);
        assert_eq!(transport.playhead_step(), 0);
        transport.tick(Duration::from_millis(60), &song, &root(), &audio);
        assert_eq!(transport.playhead_step(), 1);
    }

    #[test]
    fn test_muted_channel_is_silent() {
        let mut song = song_with_steps();
        song.channels[0].muted = true;
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();

        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        assert!(!audio.has_captured(|c| matches!(
            c,
            AudioCommand::TriggerSample { path, .. } if path.ends_with("kick.wav")
        )));
    }

    #[test]
    fn test_solo_gates_other_channels() {
        let mut song = song_with_steps();
        song.channels[1].solo = true;
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();
        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        // Step 0: kick would fire, but snare holds solo
        assert!(!audio.has_captured(|c| matches!(c, AudioCommand::TriggerSample { .. })));

        for _ in 0..4 {
            transport.advance_step(&song, &root(), &audio);
        }
        assert!(audio.has_captured(|c| matches!(
            c,
            AudioCommand::TriggerSample { path, .. } if path.ends_with("snare.wav")
        )));
    }

    #[test]
    fn test_empty_sample_ref_skipped_silently() {
        let mut song = Song::new("test");
        song.pattern_or_create(0).set_step(2, 0, true); // channel 2 has no sample
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();

        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        assert!(audio.captured().is_empty());
    }

    #[test]
    fn test_synth_notes_fire_with_duration() {
        let mut song = Song::new("test");
        let pattern = song.pattern_or_create(0);
        pattern.add_note(6, Note::new(64, 4, 2)); // Lead channel
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();
        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        for _ in 0..4 {
            transport.advance_step(&song, &root(), &audio);
        }

        let step_secs = 60.0 / 140.0 / 4.0;
        assert!(audio.has_captured(|c| matches!(
            c,
            AudioCommand::TriggerSynth { pitch: 64, duration_secs, .. }
                if (*duration_secs - 2.0 * step_secs as f32).abs() < 0.001
        )));
    }

    #[test]
    fn test_pitched_sample_notes_fire() {
        let mut song = Song::new("test");
        song.channels[0].sample_ref = "kick.wav".to_string();
        song.pattern_or_create(0).add_note(0, Note::new(67, 0, 1));
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();

        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        assert!(audio.has_captured(|c| matches!(
            c,
            AudioCommand::TriggerSamplePitched { pitch: 67, .. }
        )));
    }

    #[test]
    fn test_step_event_precedes_pitched_note_on_same_channel() {
        let mut song = Song::new("test");
        song.channels[0].sample_ref = "kick.wav".to_string();
        let pattern = song.pattern_or_create(0);
        pattern.set_step(0, 0, true);
        pattern.add_note(0, Note::new(72, 0, 1));
        let audio = AudioHandle::capture();
        let mut transport = Transport::new();

        transport.start(TransportMode::Pattern, &song, &root(), &audio);

        let commands = audio.captured();
        assert!(matches!(commands[0], AudioCommand::TriggerSample { .. }));
        assert!(matches!(
            commands[1],
            AudioCommand::TriggerSamplePitched { .. }
        ));
    }

    // Scenario: placements (p1 bar 0 len 2), (p2 bar 1 len 1); at bar 0 only
    // p1 fires, at bar 1 both fire, at bars 2+ nothing fires; muting p1
    // mid-play leaves only p2 at bar 1.
    #[test]
    fn test_arrangement_playback_scenario() {
        let mut song = Song::new("test");
        song.channels[0].sample_ref = "kick.wav".to_string();
        song.channels[1].sample_ref = "snare.wav".to_string();
        song.pattern_or_create(1).set_step(0, 0, true);
        song.pattern_or_create(2).set_step(1, 0, true);
        song.arrangement
            .add_placement(PatternPlacement::with_length(1, 0, 2));
        song.arrangement
            .add_placement(PatternPlacement::with_length(2, 1, 1));

        let audio = AudioHandle::capture();
        let mut transport = Transport::new();
        transport.start_arrangement_from(0, &song, &root(), &audio);

        // Bar 0 step 0: only p1 (kick)
        assert!(audio.has_captured(|c| matches!(
            c, AudioCommand::TriggerSample { path, .. } if path.ends_with("kick.wav"))));
        assert!(!audio.has_captured(|c| matches!(
            c, AudioCommand::TriggerSample { path, .. } if path.ends_with("snare.wav"))));

        // Advance into bar 1: both p1 and p2 fire at step 0
        audio.clear_captured();
        for _ in 0..16 {
            transport.advance_step(&song, &root(), &audio);
        }
        assert_eq!(transport.arrangement_bar(), 1);
        assert!(audio.has_captured(|c| matches!(
            c, AudioCommand::TriggerSample { path, .. } if path.ends_with("kick.wav"))));
        assert!(audio.has_captured(|c| matches!(
            c, AudioCommand::TriggerSample { path, .. } if path.ends_with("snare.wav"))));

        // Bars 2..15: nothing fires
        audio.clear_captured();
        for _ in 0..16 {
            transport.advance_step(&song, &root(), &audio);
        }
        assert_eq!(transport.arrangement_bar(), 2);
        assert!(audio.captured().is_empty());

        // Mute p1 mid-play and wrap around to bar 0: nothing fires there
        song.arrangement.toggle_pattern_mute(1);
        audio.clear_captured();
        for _ in 0..(14 * 16) {
            transport.advance_step(&song, &root(), &audio);
        }
        assert_eq!(transport.arrangement_bar(), 0);
        assert!(audio.captured().is_empty());

        // Bar 1 now fires only p2
        for _ in 0..16 {
            transport.advance_step(&song, &root(), &audio);
        }
        assert!(!audio.has_captured(|c| matches!(
            c, AudioCommand::TriggerSample { path, .. } if path.ends_with("kick.wav"))));
        assert!(audio.has_captured(|c| matches!(
            c, AudioCommand::TriggerSample { path, .. } if path.ends_with("snare.wav"))));
    }
}
