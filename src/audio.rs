use std::fmt;

/// Opaque handle to an in-flight playback event, as issued by the audio
/// engine. Handle 0 is reserved for "no playback".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackHandle(pub u64);

impl PlaybackHandle {
    pub const NONE: PlaybackHandle = PlaybackHandle(0);

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for PlaybackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Narrow seam to the external audio engine. The core only ever plays and
/// stops named events and queries the live beat duration; mixing, decoding
/// and device handling live entirely on the other side.
///
/// Beat-boundary notifications are NOT delivered through this trait. The
/// application shell forwards them to [`crate::game::Level::on_music_beat`],
/// which defers the increment onto the next update tick.
pub trait AudioInterface {
    /// Starts a music event, seeking `offset_ms` into it. Returns a handle
    /// for later stop/query calls.
    fn play_music_event(&self, event_id: &str, offset_ms: f64) -> PlaybackHandle;

    /// Fires a one-shot sound event.
    fn play_sound_event(&self, event_id: &str);

    /// Stops a playback event. Must tolerate already-stopped handles.
    fn stop_event(&self, handle: PlaybackHandle);

    /// Degrades playback of an event (the fail-state slow-down effect).
    fn slow_event(&self, handle: PlaybackHandle);

    /// Beat duration in seconds the engine is currently reporting for this
    /// playback, or 0.0 if not yet known.
    fn current_beat_duration(&self, handle: PlaybackHandle) -> f32;
}

/// Audio stub that satisfies the interface without an engine. Records the
/// events it is asked to play so tests can assert against them, and reports
/// a fixed beat duration.
pub struct NullAudio {
    beat_duration: f32,
    played: std::sync::Mutex<Vec<String>>,
    next_handle: std::sync::Mutex<u64>,
}

impl NullAudio {
    pub fn new(beat_duration: f32) -> Self {
        Self {
            beat_duration,
            played: std::sync::Mutex::new(Vec::new()),
            next_handle: std::sync::Mutex::new(0),
        }
    }

    /// Every event id passed to `play_music_event`/`play_sound_event`, in
    /// call order.
    pub fn played_events(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }
}

impl AudioInterface for NullAudio {
    fn play_music_event(&self, event_id: &str, _offset_ms: f64) -> PlaybackHandle {
        self.played.lock().unwrap().push(event_id.to_string());
        let mut next = self.next_handle.lock().unwrap();
        *next += 1;
        PlaybackHandle(*next)
    }

    fn play_sound_event(&self, event_id: &str) {
        self.played.lock().unwrap().push(event_id.to_string());
    }

    fn stop_event(&self, _handle: PlaybackHandle) {}

    fn slow_event(&self, _handle: PlaybackHandle) {}

    fn current_beat_duration(&self, _handle: PlaybackHandle) -> f32 {
        self.beat_duration
    }
}
