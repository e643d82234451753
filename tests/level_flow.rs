//! Full gameplay-loop scenarios driven through the public API with a
//! deterministic fixed-step frame pump.

use orbitsync::audio::NullAudio;
use orbitsync::config::GameConfig;
use orbitsync::game::level::{Level, LevelSignal, LevelSpec, LevelState, PathRef};
use orbitsync::game::path::{NodeSpec, PathSpec};
use orbitsync::input::ScriptedInput;
use std::sync::Arc;

const DT: f32 = 0.005;
const TICKS_PER_BEAT: u64 = 100; // 0.5s beat at 120 bpm, 5ms frames
const TAP_KEY: u8 = 32;

fn node(beat: f32, checkpoint: bool) -> NodeSpec {
    NodeSpec {
        beat,
        speed: None,
        spin: false,
        checkpoint,
    }
}

/// A 120 bpm level with a 4-beat count-in and five tappable nodes spaced
/// one beat apart behind the origin node.
fn level_spec(checkpoint_at_node_2: bool) -> LevelSpec {
    LevelSpec {
        name: "flow test".to_string(),
        source: "tests".to_string(),
        difficulty: 1.0,
        bpm: 120.0,
        music_play_event: "play_flow".to_string(),
        music_stop_event: "stop_flow".to_string(),
        countdown_length: 4,
        path: PathRef::Inline(PathSpec {
            name: "flow path".to_string(),
            width: 0.8,
            scale: 1.0,
            nodes: vec![
                node(2.0, false),
                node(1.0, false),
                node(1.0, checkpoint_at_node_2),
                node(1.0, false),
                node(1.0, false),
                node(1.0, false),
            ],
        }),
    }
}

/// Fixed-step frame pump. Forwards a beat-boundary notification whenever
/// the accumulated phase time crosses a beat, exactly as the shell would.
struct Pump {
    level: Level,
    input: ScriptedInput,
    phase_tick: u64,
    last_signal: Option<LevelSignal>,
}

impl Pump {
    fn new(spec: &LevelSpec) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let audio = Arc::new(NullAudio::new(0.5));
        let mut level = Level::from_spec(spec, GameConfig::default(), audio).unwrap();
        level.startup();
        Self {
            level,
            input: ScriptedInput::new(),
            phase_tick: 0,
            last_signal: None,
        }
    }

    /// Runs one frame; `tap` injects a key press for this frame only.
    fn tick(&mut self, tap: bool) {
        if tap {
            self.input.press(TAP_KEY);
        }
        let state_before = self.level.state();
        self.last_signal = self.level.update(DT, &self.input);
        self.input.clear();
        self.phase_tick += 1;

        // The conductor restarts when an attempt (re-)enters Countdown, so
        // beat delivery and the phase clock re-align with it.
        if self.level.state() == LevelState::Countdown && state_before != LevelState::Countdown {
            self.phase_tick = 0;
        } else if self.phase_tick % TICKS_PER_BEAT == 0 {
            self.level.on_music_beat();
        }
    }

    fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick(false);
        }
    }

    /// Advances to the next exact node-arrival tick and taps on it.
    fn run_then_tap_at(&mut self, phase_tick: u64) {
        assert!(self.phase_tick < phase_tick, "target tick already passed");
        while self.phase_tick + 1 < phase_tick {
            self.tick(false);
        }
        self.tick(true);
    }
}

/// Phase tick on which the playhead sits exactly on node `k`'s beat. The
/// conductor starts `count_in` beats before the first tappable node.
fn arrival_tick(node_index: u64, count_in: u64, resume_node: u64) -> u64 {
    (node_index + count_in - resume_node) * TICKS_PER_BEAT
}

#[test]
fn perfect_run_clears_with_full_score() {
    let mut pump = Pump::new(&level_spec(false));
    assert_eq!(pump.level.state(), LevelState::Countdown);

    // Tap exactly on each of the five node beats.
    for k in 1..=5 {
        pump.run_then_tap_at(arrival_tick(k, 4, 1));
    }

    assert_eq!(pump.level.state(), LevelState::Win, "final tap should win");
    let metrics = pump.level.metrics();
    assert_eq!(metrics.count(orbitsync::Judgement::Perfect), 5);
    assert_eq!(metrics.total_judgements, 5);
    assert!(metrics.is_pure_perfect());
    assert_eq!(metrics.percent_clear, 1.0);
    assert!((pump.level.score() - 100.0).abs() < 1e-3);

    // Confirming the win hands control back to the shell.
    pump.run(250); // input-lock grace at 5ms frames
    pump.tick(true);
    assert_eq!(pump.last_signal, Some(LevelSignal::ReturnToSelect));
}

#[test]
fn checkpoint_resumes_at_node_with_snapshot() {
    let mut pump = Pump::new(&level_spec(true));

    // Clear nodes 1 and 2; node 2 is the checkpoint.
    pump.run_then_tap_at(arrival_tick(1, 4, 1));
    pump.run_then_tap_at(arrival_tick(2, 4, 1));
    assert_eq!(pump.level.checkpoint_node_index(), 2);
    assert_eq!(pump.level.metrics().total_judgements, 2);

    // Stop tapping; node 3's death window passes and the attempt fails.
    let mut guard = 0;
    while pump.level.state() != LevelState::Fail {
        pump.tick(false);
        guard += 1;
        assert!(guard < 2000, "never failed");
    }
    assert!((pump.level.metrics().percent_clear - 0.4).abs() < 1e-5);

    // Rearm after the grace period; the new attempt counts down again.
    pump.run(250);
    pump.tick(true);
    assert_eq!(pump.level.state(), LevelState::Countdown);

    // The resumed player starts at the checkpoint node, not node 0.
    assert_eq!(pump.level.player().unwrap().node_index(), 2);

    // Finish from the checkpoint: nodes 3, 4, 5.
    for k in 3..=5 {
        pump.run_then_tap_at(arrival_tick(k, 4, 3));
    }

    assert_eq!(pump.level.state(), LevelState::Win);
    let metrics = pump.level.metrics();
    assert_eq!(metrics.checkpoints_used, 1);
    assert_eq!(metrics.total_judgements, 5, "snapshot restored plus resumed taps");
    assert!(!metrics.is_pure_perfect(), "checkpoint use forfeits pure perfect");
    assert!((pump.level.score() - 90.0).abs() < 0.1, "one checkpoint decays the score");
}

#[test]
fn stale_countdown_taps_never_reach_judgement() {
    let mut pump = Pump::new(&level_spec(false));

    // Mash through most of the countdown.
    for _ in 0..40 {
        pump.tick(true);
        pump.run(4);
    }
    assert_eq!(pump.level.state(), LevelState::Countdown);

    // Reach Playing and the first node beat without further taps: if any
    // countdown tap leaked, it would have been judged TooEarly.
    pump.run_then_tap_at(arrival_tick(1, 4, 1));
    let metrics = pump.level.metrics();
    assert_eq!(metrics.total_judgements, 1);
    assert_eq!(metrics.count(orbitsync::Judgement::Perfect), 1);
}
