//! Per-attempt judgement accounting and the derived score.

use crate::config::GameConfig;
use crate::game::judgment::{ALL_JUDGEMENTS, JUDGEMENT_COUNT, Judgement, label};

#[derive(Debug, Clone, Default)]
pub struct LevelMetrics {
    pub judgement_counts: [u32; JUDGEMENT_COUNT],
    pub total_judgements: u32,
    pub checkpoints_used: u32,
    /// Fraction of the path reached, 0..=1.
    pub percent_clear: f32,
}

impl LevelMetrics {
    pub fn record(&mut self, judgement: Judgement) {
        self.judgement_counts[judgement as usize] += 1;
        self.total_judgements += 1;
    }

    pub fn count(&self, judgement: Judgement) -> u32 {
        self.judgement_counts[judgement as usize]
    }

    /// Score in 0..=100: weighted judgement average, multiplicatively
    /// decayed per checkpoint used. 0 before any judgement lands.
    pub fn score(&self, config: &GameConfig) -> f32 {
        if self.total_judgements == 0 {
            return 0.0;
        }

        let perfect = self.count(Judgement::Perfect) as f32;
        let near_perfect =
            (self.count(Judgement::EarlyPerfect) + self.count(Judgement::LatePerfect)) as f32;
        let non_perfect = (self.count(Judgement::Early) + self.count(Judgement::Late)) as f32;

        let weighted = config.perfect_multiplier * perfect
            + config.near_perfect_multiplier * near_perfect
            + config.non_perfect_multiplier * non_perfect;
        let percent_score = weighted / self.total_judgements as f32;

        let checkpoint_penalty = config
            .checkpoint_score_penalty
            .powi(self.checkpoints_used as i32);

        checkpoint_penalty * percent_score * 100.0
    }

    /// Nothing but Perfects, without a checkpoint resume.
    pub fn is_pure_perfect(&self) -> bool {
        if self.checkpoints_used > 0 {
            return false;
        }
        ALL_JUDGEMENTS
            .iter()
            .filter(|&&j| j != Judgement::Perfect)
            .all(|&j| self.count(j) == 0)
    }

    /// Nothing outside the perfect tiers, without a checkpoint resume.
    pub fn is_full_combo(&self) -> bool {
        if self.checkpoints_used > 0 {
            return false;
        }
        ALL_JUDGEMENTS
            .iter()
            .filter(|&&j| {
                !matches!(
                    j,
                    Judgement::Perfect | Judgement::EarlyPerfect | Judgement::LatePerfect
                )
            })
            .all(|&j| self.count(j) == 0)
    }

    /// Multi-line HUD breakdown.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Perfects: {}\n", self.count(Judgement::Perfect)));
        out.push_str(&format!(
            "E-Perfect: {} | L-Perfect: {}\n",
            self.count(Judgement::EarlyPerfect),
            self.count(Judgement::LatePerfect)
        ));
        out.push_str(&format!(
            "Too Early: {} | Early: {} | Late: {} | Too Late: {}\n",
            self.count(Judgement::TooEarly),
            self.count(Judgement::Early),
            self.count(Judgement::Late),
            self.count(Judgement::TooLate)
        ));
        out.push('\n');
        out.push_str(&format!("Checkpoints Used: {}", self.checkpoints_used));
        out
    }

    /// Win-screen headline for this attempt.
    pub fn clear_title(&self) -> &'static str {
        if self.is_pure_perfect() {
            "Pure Perfect!"
        } else if self.is_full_combo() {
            "Full Combo!"
        } else {
            "Level Clear!"
        }
    }
}

/// Re-exported so HUD code can label individual counters.
pub fn judgement_label(judgement: Judgement) -> &'static str {
    label(judgement)
}
