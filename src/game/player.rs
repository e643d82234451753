//! The player's planet pair: one planet parked on the current node, the
//! other swinging around it half a turn per (speed-scaled) beat. Taps are
//! graded against the next node's beat and drive node advances, overload
//! and death.

use crate::audio::AudioInterface;
use crate::config::GameConfig;
use crate::game::conductor::Conductor;
use crate::game::judgment::{Judgement, is_acceptable, judge, label};
use crate::game::path::Path;
use crate::game::tap::TapQueue;
use crate::utils::{fraction_within, lerp, normalize_degrees, normalize_degrees_exclusive, polar_degrees};
use cgmath::Vector2;
use log::{debug, info, warn};
use std::sync::Arc;

pub const PLANET_COUNT: usize = 2;

const NODE_CLICK_EVENT: &str = "play_node_click";
const DEATH_EVENT: &str = "play_player_death";

/// Cosmetic per-attempt customization, owned by the level.
#[derive(Debug, Clone)]
pub struct PlanetSettings {
    pub planet_colors: [[f32; 4]; PLANET_COUNT],
    pub planet_radius: f32,
}

impl Default for PlanetSettings {
    fn default() -> Self {
        Self {
            planet_colors: [[1.0, 0.2, 0.2, 1.0], [0.2, 0.2, 1.0, 1.0]],
            planet_radius: 0.25,
        }
    }
}

/// Gameplay outcomes surfaced to the owning level, in the order they
/// happened within the tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Judged {
        judgement: Judgement,
        position: Vector2<f32>,
    },
    /// A checkpoint node was passed; the payload is its node index.
    Checkpoint(u32),
    /// Advanced past the final node.
    Won,
    Died,
}

pub struct PlayerPlanets {
    pub settings: PlanetSettings,
    audio: Arc<dyn AudioInterface>,

    position: Vector2<f32>,
    current_planet: usize,
    current_node_index: i32,
    overload_count: i32,
    /// Angle from the stationary planet to the orbiting one, degrees.
    angle: f32,
    clockwise: bool,
    active: bool,
    dead: bool,
}

impl PlayerPlanets {
    /// Seeds the pair at `resume_index` (node 0 on a fresh attempt, the
    /// last checkpoint otherwise). Spawning carries none of the
    /// node-advance side effects.
    pub fn new(
        path: &Path,
        settings: PlanetSettings,
        resume_index: u32,
        audio: Arc<dyn AudioInterface>,
    ) -> Self {
        let current_node_index = resume_index as i32;
        let node = path.node(current_node_index);
        Self {
            settings,
            audio,
            position: node.map_or(Vector2::new(0.0, 0.0), |n| n.position),
            current_planet: 0,
            current_node_index,
            overload_count: 0,
            angle: 180.0,
            clockwise: node.map_or(true, |n| n.clockwise),
            active: false,
            dead: false,
        }
    }

    /// Per-frame update: the continuous orbit angle always advances (the
    /// pair keeps swinging through countdown); tap judgement and node
    /// transitions only run while active.
    pub fn update(
        &mut self,
        path: &Path,
        conductor: &Conductor,
        taps: &mut TapQueue,
        config: &GameConfig,
    ) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        if self.dead {
            return events;
        }

        self.update_orbit_angle(path, conductor);

        if !self.active {
            return events;
        }

        let windows = config.judge_windows();
        let beat_duration = conductor.beat_duration() as f64;
        let time_in_beats = conductor.current_beat_position();
        let current_seconds = time_in_beats * beat_duration;

        if config.autoplay {
            if let Some(next) = path.node(self.current_node_index + 1) {
                if time_in_beats > next.time_in_beats {
                    taps.push_tap();
                }
            }
        }

        let Some(next) = path.node(self.current_node_index + 1) else {
            return events;
        };

        let mut judgement = judge(next.time_in_beats * beat_duration, current_seconds, &windows);

        // A fatal miss needs no tap; under no-fail it becomes a forced
        // advance instead.
        if judgement == Judgement::Death
            || (config.nofail && judgement == Judgement::TooLate)
        {
            if config.nofail {
                self.advance_node(path, &mut events);
            } else {
                debug!("Fatal miss at node {}", self.current_node_index + 1);
                self.die(&mut events);
                return events;
            }

            match path.node(self.current_node_index + 1) {
                Some(next) => {
                    judgement =
                        judge(next.time_in_beats * beat_duration, current_seconds, &windows);
                }
                None => return events,
            }
        }

        while taps.pop_if_tap().is_some() {
            if self.dead || !self.active {
                break;
            }
            self.handle_tap(judgement, path, config, &mut events);

            match path.node(self.current_node_index + 1) {
                Some(next) => {
                    judgement =
                        judge(next.time_in_beats * beat_duration, current_seconds, &windows);
                }
                None => break,
            }
        }

        events
    }

    fn update_orbit_angle(&mut self, path: &Path, conductor: &Conductor) {
        let turn_direction = if self.clockwise { -1.0 } else { 1.0 };
        let current = path.node(self.current_node_index);
        let previous = path.node(self.current_node_index - 1);

        let speed = current.map_or(1.0, |n| n.speed);
        let node_time = current.map_or(0.0, |n| n.time_in_beats);
        let interval = if speed > 0.0 { 1.0 / speed as f64 } else { 1.0 };
        let fraction = fraction_within(
            conductor.current_beat_position(),
            node_time,
            node_time + interval,
        );

        let displacement = lerp(0.0, turn_direction * 180.0, fraction as f32);
        let in_angle = previous.map_or(0.0, |n| n.angle);
        self.angle = normalize_degrees(180.0 + in_angle + displacement);
    }

    fn handle_tap(
        &mut self,
        judgement: Judgement,
        path: &Path,
        config: &GameConfig,
        events: &mut Vec<PlayerEvent>,
    ) {
        debug!("Tap judged {}", label(judgement));

        if is_acceptable(judgement) {
            // Feedback spawns where the pair lands. The judgement is
            // reported before the advance so a checkpoint snapshot taken
            // there includes it.
            let landing = path
                .node(self.current_node_index + 1)
                .map_or(self.position, |n| n.position);
            events.push(PlayerEvent::Judged {
                judgement,
                position: landing,
            });
            self.advance_node(path, events);
            self.overload_count = (self.overload_count - 1).max(0);
        } else {
            events.push(PlayerEvent::Judged {
                judgement,
                position: self.position,
            });
            self.overload_count += 1;
            if self.overload_count >= config.overload_threshold {
                warn!("Overload at node {}!", self.current_node_index);
                self.die(events);
            }
        }
    }

    /// Moves to the next node and applies its side effects: adopt the
    /// node's spin and position, half-turn the cached angle, swap which
    /// planet is stationary, report checkpoints, and deactivate past the
    /// final node.
    fn advance_node(&mut self, path: &Path, events: &mut Vec<PlayerEvent>) {
        if !self.active {
            return;
        }

        self.current_node_index += 1;
        if let Some(node) = path.node(self.current_node_index) {
            self.clockwise = node.clockwise;
            self.position = node.position;
            if node.checkpoint {
                events.push(PlayerEvent::Checkpoint(self.current_node_index as u32));
            }
        }

        self.audio.play_sound_event(NODE_CLICK_EVENT);

        // Angle must land in (0, 360] after the half-turn flip.
        self.angle = normalize_degrees_exclusive(self.angle + 180.0);

        self.current_planet = (self.current_planet + 1) % PLANET_COUNT;

        if path.node(self.current_node_index + 1).is_none() {
            info!("Reached final node {}, level clear.", self.current_node_index);
            self.active = false;
            events.push(PlayerEvent::Won);
        }
    }

    fn die(&mut self, events: &mut Vec<PlayerEvent>) {
        self.dead = true;
        self.active = false;
        self.audio.play_sound_event(DEATH_EVENT);
        events.push(PlayerEvent::Died);
    }

    pub fn enable(&mut self) {
        if !self.dead {
            self.active = true;
        }
    }

    pub fn disable(&mut self) {
        self.active = false;
    }

    pub fn node_index(&self) -> i32 {
        self.current_node_index
    }

    pub fn position(&self) -> Vector2<f32> {
        self.position
    }

    /// Position `lookahead` nodes ahead, clamped to the final node. The
    /// camera tracks this during play.
    pub fn position_ahead(&self, path: &Path, lookahead: i32) -> Vector2<f32> {
        path.node(self.current_node_index + lookahead)
            .or_else(|| path.last_node())
            .map_or(self.position, |n| n.position)
    }

    /// World position of the travelling planet: the stationary one plus a
    /// polar offset at twice the node radius.
    pub fn orbiting_planet_position(&self, path: &Path) -> Vector2<f32> {
        let travel_radius = path
            .node(self.current_node_index)
            .map_or(1.0, |n| n.radius * 2.0);
        self.position + polar_degrees(self.angle, travel_radius)
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn overload_count(&self) -> i32 {
        self.overload_count
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }
}
