//! Level orchestration: owns the conductor, path, player pair and tap
//! queue for one level, and sequences Countdown -> Playing -> Fail/Win ->
//! Inactive with checkpoint-based resumption.

use crate::audio::AudioInterface;
use crate::config::GameConfig;
use crate::error::{OrbitError, Result};
use crate::game::conductor::Conductor;
use crate::game::judgment::Judgement;
use crate::game::metrics::LevelMetrics;
use crate::game::path::{Path, PathSpec};
use crate::game::player::{PlanetSettings, PlayerEvent, PlayerPlanets};
use crate::game::props::FeedbackArena;
use crate::game::tap::TapQueue;
use crate::input::InputInterface;
use cgmath::Vector2;
use log::{info, warn};
use serde::Deserialize;
use std::path::Path as FsPath;
use std::sync::Arc;

/// Beats-until-start threshold below which Countdown hands over to
/// Playing. Input is never judged before this.
const COUNTDOWN_START_THRESHOLD_BEATS: f64 = 0.25;

/// How long a judgement feedback marker stays alive.
const FEEDBACK_LIFETIME_SECONDS: f32 = 2.0;

/// System keys that never count as taps: Escape, backtick, F1-F12.
const TAP_IGNORED_KEYS: [u8; 14] = [
    27, 192, 112, 113, 114, 115, 116, 117, 118, 119, 120, 121, 122, 123,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    Countdown,
    Playing,
    Fail,
    Win,
    Inactive,
}

/// Hand-off requests for the outer game shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSignal {
    /// The win screen was confirmed; return to level select.
    ReturnToSelect,
}

#[derive(Debug, Clone, Default)]
pub struct LevelInfo {
    pub name: String,
    pub source: String,
    pub difficulty: f32,
}

/// Declarative level description, loadable from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub difficulty: f32,
    pub bpm: f32,
    pub music_play_event: String,
    #[serde(default)]
    pub music_stop_event: String,
    #[serde(default = "LevelSpec::default_countdown")]
    pub countdown_length: i32,
    pub path: PathRef,
}

impl LevelSpec {
    fn default_countdown() -> i32 {
        4
    }
}

/// Either a sibling path file or an inline path spec.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathRef {
    File(String),
    Inline(PathSpec),
}

pub struct Level {
    audio: Arc<dyn AudioInterface>,
    config: GameConfig,
    info: LevelInfo,
    countdown_length: i32,

    conductor: Conductor,
    path: Path,
    player: Option<PlayerPlanets>,
    player_settings: PlanetSettings,
    taps: TapQueue,
    feedback: FeedbackArena,

    current_metrics: LevelMetrics,
    checkpoint_metrics: LevelMetrics,
    checkpoint_node_index: u32,

    state: LevelState,
    start_time_beats: f64,
    input_lock_remaining: f64,
}

impl Level {
    pub fn from_spec(
        spec: &LevelSpec,
        config: GameConfig,
        audio: Arc<dyn AudioInterface>,
    ) -> Result<Self> {
        Self::from_spec_with_base(spec, None, config, audio)
    }

    /// Loads a level description from a JSON file. A missing or
    /// unparseable file (or referenced path file) aborts the load.
    pub fn load_from_file(
        file: impl AsRef<FsPath>,
        config: GameConfig,
        audio: Arc<dyn AudioInterface>,
    ) -> Result<Self> {
        let file = file.as_ref();
        let text = std::fs::read_to_string(file).map_err(|e| {
            OrbitError::Level(file.display().to_string(), format!("failed to read: {}", e))
        })?;
        let spec: LevelSpec = serde_json::from_str(&text).map_err(|e| {
            OrbitError::Level(file.display().to_string(), format!("failed to parse: {}", e))
        })?;
        Self::from_spec_with_base(&spec, file.parent(), config, audio)
    }

    fn from_spec_with_base(
        spec: &LevelSpec,
        base_dir: Option<&FsPath>,
        config: GameConfig,
        audio: Arc<dyn AudioInterface>,
    ) -> Result<Self> {
        let path = match &spec.path {
            PathRef::Inline(path_spec) => Path::build(path_spec),
            PathRef::File(file) => {
                let resolved = match base_dir {
                    Some(base) => base.join(file),
                    None => FsPath::new(file).to_path_buf(),
                };
                Path::load_from_file(resolved)?
            }
        };

        let conductor = Conductor::new(
            spec.bpm,
            spec.music_play_event.clone(),
            spec.music_stop_event.clone(),
            spec.countdown_length,
            config.input_delay_seconds,
            Arc::clone(&audio),
        );

        let mut taps = TapQueue::new();
        for key in TAP_IGNORED_KEYS {
            taps.ignore_key(key);
        }

        let player_settings = PlanetSettings {
            planet_radius: path.width() * 0.4,
            ..PlanetSettings::default()
        };

        info!(
            "Loaded level \"{}\" ({} bpm, {} nodes).",
            spec.name,
            spec.bpm,
            path.node_count()
        );

        Ok(Self {
            audio,
            config,
            info: LevelInfo {
                name: spec.name.clone(),
                source: spec.source.clone(),
                difficulty: spec.difficulty,
            },
            countdown_length: spec.countdown_length,
            conductor,
            path,
            player: None,
            player_settings,
            taps,
            feedback: FeedbackArena::new(),
            current_metrics: LevelMetrics::default(),
            checkpoint_metrics: LevelMetrics::default(),
            checkpoint_node_index: 0,
            state: LevelState::Inactive,
            start_time_beats: 0.0,
            input_lock_remaining: 0.0,
        })
    }

    pub fn startup(&mut self) {
        self.go_to_state(LevelState::Countdown);
    }

    pub fn shutdown(&mut self) {
        self.go_to_state(LevelState::Inactive);
    }

    /// Beat-boundary notification forwarded by the shell. Only marks the
    /// beat pending; the next `update` applies it.
    pub fn on_music_beat(&mut self) {
        self.conductor.on_beat();
    }

    /// Per-frame tick in fixed order: tap capture, conductor, player,
    /// state dispatch. Returns a signal when the level wants to hand
    /// control back to the shell.
    pub fn update(
        &mut self,
        delta_seconds: f32,
        input: &dyn InputInterface,
    ) -> Option<LevelSignal> {
        self.taps.tick(delta_seconds as f64);
        self.taps.poll(input);
        self.conductor.advance(delta_seconds);
        self.input_lock_remaining = (self.input_lock_remaining - delta_seconds as f64).max(0.0);
        self.feedback.update(delta_seconds);

        let events = match self.player.as_mut() {
            Some(player) => player.update(&self.path, &self.conductor, &mut self.taps, &self.config),
            None => Vec::new(),
        };
        for event in events {
            match event {
                PlayerEvent::Judged { judgement, position } => {
                    self.report_timing_judgement(position, judgement);
                }
                PlayerEvent::Checkpoint(index) => self.report_checkpoint(index),
                PlayerEvent::Won => self.go_to_state(LevelState::Win),
                PlayerEvent::Died => self.go_to_state(LevelState::Fail),
            }
        }

        match self.state {
            LevelState::Countdown => {
                let beats_until_start =
                    self.start_time_beats - self.conductor.current_beat_position();
                if beats_until_start < COUNTDOWN_START_THRESHOLD_BEATS {
                    self.go_to_state(LevelState::Playing);
                }
                None
            }
            LevelState::Playing => None,
            LevelState::Fail => {
                if self.rearm_tap() {
                    self.go_to_state(LevelState::Countdown);
                }
                None
            }
            LevelState::Win => {
                if self.rearm_tap() {
                    Some(LevelSignal::ReturnToSelect)
                } else {
                    None
                }
            }
            LevelState::Inactive => None,
        }
    }

    /// Consumes a rearm tap once the input-lock grace period has elapsed;
    /// discards all pending taps otherwise.
    fn rearm_tap(&mut self) -> bool {
        if self.input_lock_remaining <= 0.0 && self.taps.pop_if_tap().is_some() {
            true
        } else {
            self.taps.pop_all();
            false
        }
    }

    pub fn go_to_state(&mut self, new_state: LevelState) {
        if new_state == self.state {
            return;
        }

        self.input_lock_remaining = self.config.input_lock_seconds;

        match self.state {
            LevelState::Playing => self.on_exit_playing(),
            LevelState::Countdown | LevelState::Fail | LevelState::Win | LevelState::Inactive => {}
        }

        self.state = new_state;

        match self.state {
            LevelState::Countdown => self.on_enter_countdown(),
            LevelState::Playing => self.on_enter_playing(),
            LevelState::Fail => self.on_enter_fail(),
            LevelState::Win => self.on_enter_win(),
            LevelState::Inactive => self.on_enter_inactive(),
        }
    }

    fn on_enter_countdown(&mut self) {
        // Fresh pair each attempt, seeded from the checkpoint.
        self.player = Some(PlayerPlanets::new(
            &self.path,
            self.player_settings.clone(),
            self.checkpoint_node_index,
            Arc::clone(&self.audio),
        ));

        self.start_time_beats = self
            .path
            .node(self.checkpoint_node_index as i32 + 1)
            .map_or(0.0, |node| node.time_in_beats);
        self.conductor.start(Some(self.start_time_beats));
    }

    fn on_enter_playing(&mut self) {
        if self.checkpoint_node_index != 0 {
            self.current_metrics = self.checkpoint_metrics.clone();
            self.current_metrics.checkpoints_used += 1;
        } else {
            self.current_metrics = LevelMetrics::default();
        }

        // No stale pre-countdown taps leak into judgement.
        self.taps.pop_all();
        if let Some(player) = self.player.as_mut() {
            player.enable();
        }
    }

    fn on_enter_fail(&mut self) {
        self.conductor.slow();

        let total_nodes = self.path.node_count();
        let last_node = self
            .player
            .as_ref()
            .map_or(0, |p| p.node_index().max(0)) as f32;
        self.current_metrics.percent_clear = if total_nodes > 1 {
            last_node / (total_nodes as f32 - 1.0)
        } else {
            0.0
        };
        info!(
            "Attempt failed at {:.0}% of \"{}\".",
            self.current_metrics.percent_clear * 100.0,
            self.info.name
        );
    }

    fn on_enter_win(&mut self) {
        self.current_metrics.percent_clear = 1.0;
        // A full clear invalidates mid-level checkpoints.
        self.reset_checkpoints();
        info!(
            "Level \"{}\" cleared, score {:.1}.",
            self.info.name,
            self.current_metrics.score(&self.config)
        );
    }

    fn on_enter_inactive(&mut self) {
        self.conductor.stop();
        self.player = None;
    }

    fn on_exit_playing(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.disable();
        }
        self.taps.pop_all();
    }

    /// Counts a judgement into the live metrics and spawns its feedback
    /// marker for the renderer.
    pub fn report_timing_judgement(&mut self, position: Vector2<f32>, judgement: Judgement) {
        self.current_metrics.record(judgement);
        self.feedback
            .spawn(position, judgement, FEEDBACK_LIFETIME_SECONDS);
    }

    /// Snapshots the live metrics as the new resume baseline. Only called
    /// when a checkpoint node is passed.
    pub fn report_checkpoint(&mut self, checkpoint_node_index: u32) {
        info!("Checkpoint reached at node {}.", checkpoint_node_index);
        self.checkpoint_metrics = self.current_metrics.clone();
        self.checkpoint_node_index = checkpoint_node_index;
    }

    pub fn reset_checkpoints(&mut self) {
        self.checkpoint_node_index = 0;
        self.checkpoint_metrics = LevelMetrics::default();
    }

    /// Countdown digit to display, while within the count-in window.
    pub fn countdown_label(&self) -> Option<i32> {
        let beats_until_start = self.start_time_beats - self.conductor.current_beat_position();
        let label = beats_until_start.ceil() as i32;
        if label > 0 && label <= self.countdown_length {
            Some(label)
        } else {
            None
        }
    }

    pub fn set_player_settings(&mut self, settings: PlanetSettings) {
        if settings.planet_radius <= 0.0 {
            warn!("Ignoring non-positive planet radius.");
            return;
        }
        self.player_settings = settings.clone();
        if let Some(player) = self.player.as_mut() {
            player.settings = settings;
        }
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == LevelState::Playing
    }

    pub fn metrics(&self) -> &LevelMetrics {
        &self.current_metrics
    }

    pub fn score(&self) -> f32 {
        self.current_metrics.score(&self.config)
    }

    pub fn checkpoint_node_index(&self) -> u32 {
        self.checkpoint_node_index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn conductor(&self) -> &Conductor {
        &self.conductor
    }

    pub fn player(&self) -> Option<&PlayerPlanets> {
        self.player.as_ref()
    }

    pub fn feedback(&self) -> &FeedbackArena {
        &self.feedback
    }

    pub fn info(&self) -> &LevelInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::game::path::NodeSpec;
    use crate::input::ScriptedInput;

    fn node(beat: f32, checkpoint: bool) -> NodeSpec {
        NodeSpec {
            beat,
            speed: None,
            spin: false,
            checkpoint,
        }
    }

    fn test_level(config: GameConfig) -> Level {
        let spec = LevelSpec {
            name: "test level".to_string(),
            source: "test".to_string(),
            difficulty: 1.0,
            bpm: 60.0,
            music_play_event: "play_test".to_string(),
            music_stop_event: "stop_test".to_string(),
            countdown_length: 2,
            path: PathRef::Inline(PathSpec {
                name: "test path".to_string(),
                width: 0.8,
                scale: 1.0,
                nodes: vec![
                    node(2.0, false),
                    node(1.0, false),
                    node(1.0, true),
                    node(1.0, false),
                    node(1.0, false),
                ],
            }),
        };
        let audio = Arc::new(NullAudio::new(1.0));
        Level::from_spec(&spec, config, audio).unwrap()
    }

    #[test]
    fn test_startup_enters_countdown() {
        let mut level = test_level(GameConfig::default());
        assert_eq!(level.state(), LevelState::Inactive);
        level.startup();
        assert_eq!(level.state(), LevelState::Countdown);
        assert!(level.conductor().is_playing());
        assert!(level.player().is_some());
        assert!(!level.player().unwrap().is_active());
    }

    #[test]
    fn test_countdown_hands_over_near_start_beat() {
        let mut level = test_level(GameConfig::default());
        level.startup();
        let input = ScriptedInput::new();

        // Countdown spans the 2-beat count-in; at 1s/beat that is 2s of
        // frames minus the 0.25-beat threshold.
        let mut ticks = 0;
        while level.state() == LevelState::Countdown && ticks < 400 {
            level.update(0.01, &input);
            ticks += 1;
        }
        assert_eq!(level.state(), LevelState::Playing);
        assert!(ticks >= 170, "handed over too early ({} ticks)", ticks);
    }

    #[test]
    fn test_countdown_label_only_inside_count_in() {
        let mut level = test_level(GameConfig::default());
        level.startup();
        assert_eq!(level.countdown_label(), Some(2));
        let input = ScriptedInput::new();
        for _ in 0..110 {
            level.update(0.01, &input);
        }
        assert_eq!(level.countdown_label(), Some(1));
    }

    #[test]
    fn test_death_transitions_to_fail_and_rearms() {
        let mut level = test_level(GameConfig::default());
        level.startup();
        let input = ScriptedInput::new();

        // Run without any taps: the first node's death window passes and
        // the player dies.
        let mut ticks = 0;
        while level.state() != LevelState::Fail && ticks < 2000 {
            level.update(0.01, &input);
            ticks += 1;
        }
        assert_eq!(level.state(), LevelState::Fail);
        assert!(level.metrics().percent_clear < 1.0);

        // Taps during the grace period are swallowed.
        input.press(32);
        level.update(0.01, &input);
        assert_eq!(level.state(), LevelState::Fail);
        input.clear();

        // After the grace period a tap rearms into Countdown.
        for _ in 0..110 {
            level.update(0.01, &input);
        }
        input.press(32);
        level.update(0.01, &input);
        assert_eq!(level.state(), LevelState::Countdown);
    }

    #[test]
    fn test_ignored_keys_never_tap() {
        let mut level = test_level(GameConfig::default());
        level.startup();
        let input = ScriptedInput::new();

        let mut ticks = 0;
        while level.state() != LevelState::Fail && ticks < 2000 {
            level.update(0.01, &input);
            ticks += 1;
        }
        for _ in 0..110 {
            level.update(0.01, &input);
        }
        // Escape is on the ignore list, so it must not rearm.
        input.press(27);
        level.update(0.01, &input);
        assert_eq!(level.state(), LevelState::Fail);
    }

    #[test]
    fn test_autoplay_clears_level_and_wins() {
        let config = GameConfig {
            autoplay: true,
            ..GameConfig::default()
        };
        let mut level = test_level(config);
        level.startup();
        let input = ScriptedInput::new();

        let mut ticks = 0;
        while level.state() != LevelState::Win && ticks < 4000 {
            level.update(0.01, &input);
            ticks += 1;
        }
        assert_eq!(level.state(), LevelState::Win);
        assert_eq!(level.metrics().percent_clear, 1.0);
        assert_eq!(level.checkpoint_node_index(), 0, "win clears checkpoints");
        assert!(level.metrics().total_judgements >= 4);

        // Win confirm hands control back to the shell.
        for _ in 0..110 {
            level.update(0.01, &input);
        }
        input.press(32);
        let signal = level.update(0.01, &input);
        assert_eq!(signal, Some(LevelSignal::ReturnToSelect));
    }

    #[test]
    fn test_shutdown_stops_and_discards_player() {
        let mut level = test_level(GameConfig::default());
        level.startup();
        level.shutdown();
        assert_eq!(level.state(), LevelState::Inactive);
        assert!(!level.conductor().is_playing());
        assert!(level.player().is_none());
    }

    #[test]
    fn test_judgement_report_feeds_metrics_and_feedback() {
        let mut level = test_level(GameConfig::default());
        level.report_timing_judgement(Vector2::new(1.0, 0.0), Judgement::Perfect);
        assert_eq!(level.metrics().total_judgements, 1);
        assert_eq!(level.feedback().live_count(), 1);
    }
}
