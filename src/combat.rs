//! Battle against a single boss: resolved combos deal damage, the boss hits back.

use dropcombo::ComboSink;
use std::time::{Duration, Instant};
use tracing::info;

pub const PLAYER_MAX_HP: u32 = 1000;
pub const ENEMY_MAX_HP: u32 = 5000;
/// Damage per combo step.
const DAMAGE_PER_COMBO: u32 = 200;
const COUNTERATTACK_DAMAGE: u32 = 200;
const COUNTERATTACK_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Victory,
    Defeat,
}

#[derive(Debug, Clone)]
pub struct Combat {
    pub player_hp: u32,
    pub enemy_hp: u32,
    pub enemy_name: &'static str,
    /// Damage dealt by the last resolved combo.
    pub last_damage: Option<u32>,
    /// Counterattacks waiting to land. Never cancelled once queued.
    pending_counters: Vec<Instant>,
    now: Instant,
}

impl Combat {
    pub fn new(now: Instant) -> Self {
        Self {
            player_hp: PLAYER_MAX_HP,
            enemy_hp: ENEMY_MAX_HP,
            enemy_name: "Dragon Boss",
            last_damage: None,
            pending_counters: Vec::new(),
            now,
        }
    }

    /// Advance the clock and land any counterattack that is due.
    pub fn tick(&mut self, now: Instant) {
        self.now = now;
        let before = self.pending_counters.len();
        self.pending_counters.retain(|due| *due > now);
        for _ in self.pending_counters.len()..before {
            self.player_hp = self.player_hp.saturating_sub(COUNTERATTACK_DAMAGE);
            info!(player_hp = self.player_hp, "enemy counterattack");
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.enemy_hp == 0 {
            Some(Outcome::Victory)
        } else if self.player_hp == 0 {
            Some(Outcome::Defeat)
        } else {
            None
        }
    }

    pub fn player_ratio(&self) -> f64 {
        f64::from(self.player_hp) / f64::from(PLAYER_MAX_HP)
    }

    pub fn enemy_ratio(&self) -> f64 {
        f64::from(self.enemy_hp) / f64::from(ENEMY_MAX_HP)
    }
}

impl ComboSink for Combat {
    fn on_combo_resolved(&mut self, combo: u32) {
        let damage = combo.saturating_mul(DAMAGE_PER_COMBO);
        self.enemy_hp = self.enemy_hp.saturating_sub(damage);
        self.last_damage = Some(damage);
        info!(combo, damage, enemy_hp = self.enemy_hp, "combo hit");
        if self.enemy_hp > 0 {
            self.pending_counters.push(self.now + COUNTERATTACK_DELAY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_damages_enemy_and_queues_counter() {
        let t0 = Instant::now();
        let mut combat = Combat::new(t0);
        combat.on_combo_resolved(3);
        assert_eq!(combat.enemy_hp, ENEMY_MAX_HP - 600);
        assert_eq!(combat.last_damage, Some(600));

        combat.tick(t0 + Duration::from_millis(999));
        assert_eq!(combat.player_hp, PLAYER_MAX_HP);
        combat.tick(t0 + Duration::from_millis(1000));
        assert_eq!(combat.player_hp, PLAYER_MAX_HP - 200);
        // Lands once.
        combat.tick(t0 + Duration::from_millis(5000));
        assert_eq!(combat.player_hp, PLAYER_MAX_HP - 200);
    }

    #[test]
    fn test_killing_blow_wins_without_counter() {
        let t0 = Instant::now();
        let mut combat = Combat::new(t0);
        combat.on_combo_resolved(30);
        assert_eq!(combat.enemy_hp, 0);
        assert_eq!(combat.outcome(), Some(Outcome::Victory));
        combat.tick(t0 + Duration::from_secs(2));
        assert_eq!(combat.player_hp, PLAYER_MAX_HP);
    }

    #[test]
    fn test_player_defeat_floors_at_zero() {
        let t0 = Instant::now();
        let mut combat = Combat::new(t0);
        for _ in 0..6 {
            combat.on_combo_resolved(1);
        }
        combat.tick(t0 + Duration::from_secs(1));
        assert_eq!(combat.player_hp, 0);
        assert_eq!(combat.outcome(), Some(Outcome::Defeat));
    }
}
