//! Arena of short-lived judgement feedback markers. Slots are tombstoned
//! on expiry and reused by later spawns; the dead tail is compacted once it
//! outgrows the live set. Single writer (the level), read by the renderer.

use crate::game::judgment::Judgement;
use cgmath::Vector2;

#[derive(Debug, Clone)]
pub struct FeedbackEntry {
    pub position: Vector2<f32>,
    pub judgement: Judgement,
    pub age_seconds: f32,
    pub lifetime_seconds: f32,
    alive: bool,
}

impl FeedbackEntry {
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// 0 at spawn, 1 at expiry; drives the renderer's fade-out.
    pub fn fade(&self) -> f32 {
        if self.lifetime_seconds <= 0.0 {
            return 1.0;
        }
        (self.age_seconds / self.lifetime_seconds).clamp(0.0, 1.0)
    }
}

#[derive(Default)]
pub struct FeedbackArena {
    entries: Vec<FeedbackEntry>,
}

impl FeedbackArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, position: Vector2<f32>, judgement: Judgement, lifetime_seconds: f32) {
        let entry = FeedbackEntry {
            position,
            judgement,
            age_seconds: 0.0,
            lifetime_seconds,
            alive: true,
        };

        if let Some(slot) = self.entries.iter_mut().find(|e| !e.alive) {
            *slot = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Ages live entries, tombstones expired ones, and compacts when dead
    /// slots outnumber live ones.
    pub fn update(&mut self, delta_seconds: f32) {
        let mut dead = 0usize;
        for entry in &mut self.entries {
            if !entry.alive {
                dead += 1;
                continue;
            }
            entry.age_seconds += delta_seconds;
            if entry.age_seconds >= entry.lifetime_seconds {
                entry.alive = false;
                dead += 1;
            }
        }

        if dead > self.entries.len() / 2 {
            self.entries.retain(|e| e.alive);
        }
    }

    pub fn iter_live(&self) -> impl Iterator<Item = &FeedbackEntry> {
        self.entries.iter().filter(|e| e.alive)
    }

    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.alive).count()
    }

    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
