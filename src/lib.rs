//! Rhythm-timing and orbital-motion core for a music-synchronized arcade
//! game: a pair of planets swings along a procedurally built, beat-timed
//! path, and taps are graded against each node's target beat.
//!
//! The crate is engine-agnostic. The application shell owns the window,
//! renderer, audio engine and input device, and talks to the core through
//! the [`audio::AudioInterface`] and [`input::InputInterface`] seams plus a
//! once-per-frame [`game::Level::update`] call. Beat boundaries reported by
//! the audio engine are forwarded to [`game::Level::on_music_beat`] and
//! applied at the start of the next tick, so every reader within a frame
//! sees a consistent beat count.

pub mod audio;
pub mod config;
pub mod error;
pub mod game;
pub mod input;
pub mod utils;

pub use config::GameConfig;
pub use error::{OrbitError, Result};
pub use game::judgment::{Judgement, is_acceptable, judge};
pub use game::{Level, LevelSignal, LevelSpec, LevelState};
