//! Grading of tap timing against a node's target beat.

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Judgement {
    TooEarly,
    Early,
    EarlyPerfect,
    Perfect,
    LatePerfect,
    Late,
    TooLate,
    Death,
}

pub const JUDGEMENT_COUNT: usize = 8;

pub const ALL_JUDGEMENTS: [Judgement; JUDGEMENT_COUNT] = [
    Judgement::TooEarly,
    Judgement::Early,
    Judgement::EarlyPerfect,
    Judgement::Perfect,
    Judgement::LatePerfect,
    Judgement::Late,
    Judgement::TooLate,
    Judgement::Death,
];

/// Concentric timing bands in seconds. `death` only applies on the late
/// side: an early tap can never be fatal, only soft-rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeWindows {
    pub perfect: f32,
    pub near_perfect: f32,
    pub acceptable: f32,
    pub death: f32,
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            perfect: 0.05,
            near_perfect: 0.25,
            acceptable: 0.40,
            death: 0.40,
        }
    }
}

/// Classifies a tap landing at `actual_seconds` against a target of
/// `target_seconds`. Bands are checked tightest first with inclusive
/// thresholds.
pub fn judge(target_seconds: f64, actual_seconds: f64, windows: &JudgeWindows) -> Judgement {
    let offset = (actual_seconds - target_seconds) as f32;
    let abs_offset = offset.abs();

    if abs_offset <= windows.perfect {
        return Judgement::Perfect;
    }

    let is_early = offset < 0.0;
    if abs_offset <= windows.near_perfect {
        return if is_early {
            Judgement::EarlyPerfect
        } else {
            Judgement::LatePerfect
        };
    }

    if abs_offset <= windows.acceptable {
        return if is_early { Judgement::Early } else { Judgement::Late };
    }

    if !is_early && abs_offset >= windows.death {
        return Judgement::Death;
    }

    if is_early {
        Judgement::TooEarly
    } else {
        Judgement::TooLate
    }
}

/// Whether a tap with this judgement advances the player. Early misses are
/// soft-rejected rather than fatal; that asymmetry is deliberate.
pub fn is_acceptable(judgement: Judgement) -> bool {
    match judgement {
        Judgement::Early
        | Judgement::EarlyPerfect
        | Judgement::Perfect
        | Judgement::LatePerfect
        | Judgement::Late => true,
        Judgement::TooEarly | Judgement::TooLate | Judgement::Death => false,
    }
}

/// Display label for the feedback spawner.
pub fn label(judgement: Judgement) -> &'static str {
    match judgement {
        Judgement::TooEarly => "Too Early!",
        Judgement::Early => "Early",
        Judgement::EarlyPerfect => "E-Perfect",
        Judgement::Perfect => "Perfect!",
        Judgement::LatePerfect => "L-Perfect",
        Judgement::Late => "Late",
        Judgement::TooLate => "Miss!",
        Judgement::Death => "",
    }
}

/// Feedback tint, RGBA in 0..=1.
pub fn color(judgement: Judgement) -> [f32; 4] {
    match judgement {
        Judgement::TooEarly => [0.69, 0.0, 0.0, 1.0],
        Judgement::Early => [1.0, 0.2, 0.0, 1.0],
        Judgement::EarlyPerfect => [0.78, 0.78, 0.0, 1.0],
        Judgement::Perfect => [0.0, 1.0, 0.2, 1.0],
        Judgement::LatePerfect => [0.78, 0.78, 0.0, 1.0],
        Judgement::Late => [1.0, 0.2, 0.0, 1.0],
        Judgement::TooLate => [0.69, 0.0, 0.0, 1.0],
        Judgement::Death => [0.0, 0.0, 0.0, 0.0],
    }
}
