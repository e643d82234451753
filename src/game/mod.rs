pub mod conductor;
pub mod judgment;
pub mod level;
pub mod metrics;
pub mod path;
pub mod player;
pub mod props;
pub mod tap;

pub use conductor::Conductor;
pub use level::{Level, LevelSignal, LevelSpec, LevelState};
pub use path::{Path, PathSpec};
pub use player::PlayerPlanets;
