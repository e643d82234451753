//! Beat-tracking conductor: turns frame deltas plus the audio engine's
//! reported beat duration into a fractional beat position.

use crate::audio::{AudioInterface, PlaybackHandle};
use log::{debug, info};
use std::sync::Arc;

/// Fractional-beat remainders closer than this to the next whole beat snap
/// up to it when seeking, so a resume target of 3.9999999 starts on beat 4
/// instead of drifting one beat early.
const SEEK_SNAP_EPSILON: f64 = 1e-6;

pub struct Conductor {
    audio: Arc<dyn AudioInterface>,
    music_play_event: String,
    music_stop_event: String,
    music: PlaybackHandle,

    beat_duration_seconds: f32,
    time_since_last_beat: f32,
    time_until_next_beat: f32,
    /// Signed so the count-in occupies beats `-count_in..0`.
    elapsed_beats: i32,
    count_in_beats: i32,
    input_delay_seconds: f32,
    /// Beat boundaries reported since the last `advance`, applied at the
    /// top of the next tick so every reader within a frame sees the same
    /// beat count.
    pending_beats: u32,
    playing: bool,
}

impl Conductor {
    pub fn new(
        bpm: f32,
        music_play_event: impl Into<String>,
        music_stop_event: impl Into<String>,
        count_in_beats: i32,
        input_delay_seconds: f32,
        audio: Arc<dyn AudioInterface>,
    ) -> Self {
        let beat_duration_seconds = if bpm > 0.0 { 60.0 / bpm } else { 0.0 };
        Self {
            audio,
            music_play_event: music_play_event.into(),
            music_stop_event: music_stop_event.into(),
            music: PlaybackHandle::NONE,
            beat_duration_seconds,
            time_since_last_beat: 0.0,
            time_until_next_beat: beat_duration_seconds,
            elapsed_beats: -count_in_beats,
            count_in_beats,
            input_delay_seconds,
            pending_beats: 0,
            playing: false,
        }
    }

    /// Begins (or seeks) playback. `at_beat` is the fractional beat the
    /// playhead lands on, before the count-in is subtracted; `None` starts
    /// from the top. Any prior playback is stopped first.
    pub fn start(&mut self, at_beat: Option<f64>) {
        if self.music.is_valid() {
            self.audio.stop_event(self.music);
        }

        let target = at_beat.unwrap_or(0.0).max(0.0);
        let mut whole = target.trunc();
        let mut fraction = target.fract();
        if fraction > 1.0 - SEEK_SNAP_EPSILON {
            whole += 1.0;
            fraction = 0.0;
        }

        self.elapsed_beats = whole as i32 - self.count_in_beats;
        self.time_since_last_beat = fraction as f32 * self.beat_duration_seconds;
        self.time_until_next_beat = (1.0 - fraction) as f32 * self.beat_duration_seconds;
        self.pending_beats = 0;
        self.playing = true;

        let offset_ms = target * self.beat_duration_seconds as f64 * 1000.0;
        self.music = self.audio.play_music_event(&self.music_play_event, offset_ms);
        info!(
            "Conductor started at beat {:.3} (count-in {}), music {}",
            target, self.count_in_beats, self.music
        );
    }

    /// Beat-boundary notification from the audio engine. May arrive from a
    /// different execution context; only marks the beat as pending. The
    /// next `advance` applies it.
    pub fn on_beat(&mut self) {
        if !self.playing {
            return;
        }
        self.pending_beats = self.pending_beats.saturating_add(1);
    }

    /// Per-frame tick. Must run before any beat query this frame. Applies
    /// pending beat boundaries first, then accumulates `delta_seconds`.
    pub fn advance(&mut self, delta_seconds: f32) {
        if !self.playing {
            return;
        }

        while self.pending_beats > 0 {
            self.pending_beats -= 1;
            self.elapsed_beats += 1;

            let reported = self.audio.current_beat_duration(self.music);
            if reported > 0.0 {
                self.beat_duration_seconds = reported;
            }
            self.time_since_last_beat = 0.0;
            self.time_until_next_beat = self.beat_duration_seconds;
            debug!("Beat #{}", self.elapsed_beats);
        }

        self.time_since_last_beat += delta_seconds;
        self.time_until_next_beat -= delta_seconds;
    }

    /// Fractional beats elapsed since playback start, compensated for
    /// input latency. 0.0 while the beat duration is still unknown.
    pub fn current_beat_position(&self) -> f64 {
        let beat_duration = self.beat_duration_seconds as f64;
        if beat_duration == 0.0 {
            return 0.0;
        }

        let beat_integer = self.elapsed_beats as f64;
        let beat_fraction = self.time_since_last_beat as f64 / beat_duration;
        let delay_beats = self.input_delay_seconds as f64 / beat_duration;
        beat_integer + beat_fraction - delay_beats
    }

    pub fn current_beat(&self) -> i32 {
        self.elapsed_beats
    }

    pub fn beat_fraction(&self) -> f32 {
        if self.beat_duration_seconds == 0.0 {
            return 0.0;
        }
        self.time_since_last_beat / self.beat_duration_seconds
    }

    pub fn beat_duration(&self) -> f32 {
        self.beat_duration_seconds
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Degrades playback for the fail state.
    pub fn slow(&mut self) {
        if self.music.is_valid() {
            self.audio.slow_event(self.music);
        }
    }

    /// Halts playback and beat advancement. Idempotent.
    pub fn stop(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.pending_beats = 0;
        if self.music.is_valid() {
            self.audio.stop_event(self.music);
            if !self.music_stop_event.is_empty() {
                self.audio.play_sound_event(&self.music_stop_event);
            }
            self.music = PlaybackHandle::NONE;
        }
        info!("Conductor stopped.");
    }
}

impl Drop for Conductor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;

    fn conductor(bpm: f32, count_in: i32) -> Conductor {
        let audio = Arc::new(NullAudio::new(60.0 / bpm));
        Conductor::new(bpm, "play_test", "stop_test", count_in, 0.0, audio)
    }

    #[test]
    fn test_beat_applies_on_next_advance_only() {
        let mut c = conductor(120.0, 0);
        c.start(None);

        c.on_beat();
        // Not yet applied: the callback only marks the beat pending.
        assert_eq!(c.current_beat(), 0);

        c.advance(0.0);
        assert_eq!(c.current_beat(), 1);
    }

    #[test]
    fn test_one_beat_of_deltas_increments_once() {
        let mut c = conductor(120.0, 0);
        c.start(None);

        // 0.5s of frames at 120 bpm = exactly one beat.
        for _ in 0..50 {
            c.advance(0.01);
        }
        c.on_beat();
        c.advance(0.0);
        assert_eq!(c.current_beat(), 1);
        assert!(c.beat_fraction() < 1e-4);
    }

    #[test]
    fn test_count_in_starts_negative() {
        let mut c = conductor(120.0, 4);
        c.start(None);
        assert_eq!(c.current_beat(), -4);
        assert!(c.current_beat_position() < 0.0);
    }

    #[test]
    fn test_seek_snaps_near_integer_beats() {
        let mut c = conductor(120.0, 0);
        c.start(Some(3.9999999));
        assert_eq!(c.current_beat(), 4);
        assert_eq!(c.beat_fraction(), 0.0);
    }

    #[test]
    fn test_seek_keeps_real_fraction() {
        let mut c = conductor(120.0, 4);
        c.start(Some(6.5));
        assert_eq!(c.current_beat(), 2); // 6 - 4 count-in
        assert!((c.beat_fraction() - 0.5).abs() < 1e-5);
        assert!((c.current_beat_position() - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_zero_beat_duration_degrades_to_zero() {
        let audio = Arc::new(NullAudio::new(0.0));
        let mut c = Conductor::new(0.0, "play", "stop", 0, 0.0, audio);
        c.start(None);
        c.advance(0.25);
        assert_eq!(c.current_beat_position(), 0.0);
        assert_eq!(c.beat_fraction(), 0.0);
    }

    #[test]
    fn test_input_delay_shifts_position_back() {
        let audio = Arc::new(NullAudio::new(0.5));
        let mut c = Conductor::new(120.0, "play", "stop", 0, 0.05, audio);
        c.start(None);
        c.advance(0.25);
        // 0.5 beats elapsed, minus 0.05s / 0.5s-per-beat = 0.1 beats.
        assert!((c.current_beat_position() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut c = conductor(120.0, 0);
        c.start(None);
        c.stop();
        c.stop();
        assert!(!c.is_playing());
        c.on_beat();
        c.advance(0.1);
        assert_eq!(c.current_beat(), 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn position_is_monotone_between_beats(deltas in proptest::collection::vec(0.0f32..0.05, 1..50)) {
                let mut c = conductor(120.0, 0);
                c.start(None);
                let mut last = c.current_beat_position();
                for d in deltas {
                    c.advance(d);
                    let now = c.current_beat_position();
                    prop_assert!(now >= last);
                    last = now;
                }
            }
        }
    }
}
