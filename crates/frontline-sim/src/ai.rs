//! Enemy behavior: a six-state machine re-evaluated every frame.
//!
//! Each call to [`think`] runs the current state's movement behavior and then
//! checks its exit conditions against the straight-line distance between the
//! enemy's and the player's centers. Random transitions draw from the
//! caller's RNG so runs are reproducible from a seed.

use fastrand::Rng;
use frontline_common::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::body::Body;
use crate::combatant::Facing;
use crate::enemy::Enemy;

/// Time in CHASE before flanking becomes possible.
pub const CHASE_FLANK_AFTER_MS: f64 = 3000.0;
/// Per-tick chance to flank once allowed.
pub const FLANK_CHANCE: f32 = 0.3;
/// Time in ATTACK before hiding becomes possible.
pub const ATTACK_HIDE_AFTER_MS: f64 = 2000.0;
/// Per-tick chance to hide once allowed.
pub const HIDE_CHANCE: f32 = 0.2;
/// Longest FLANK lasts.
pub const FLANK_MAX_MS: f64 = 4000.0;
/// How long HIDE lasts.
pub const HIDE_MS: f64 = 2000.0;

/// Behavior state of an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiState {
    /// Walk back and forth around the spawn point
    #[default]
    Patrol,
    /// Close in on the player
    Chase,
    /// Stand and shoot
    Attack,
    /// Sidestep around the player
    Flank,
    /// Back off slowly
    Hide,
    /// Run away while wounded
    Retreat,
}

impl AiState {
    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Patrol => "patrol",
            Self::Chase => "chase",
            Self::Attack => "attack",
            Self::Flank => "flank",
            Self::Hide => "hide",
            Self::Retreat => "retreat",
        }
    }
}

/// Per-enemy state machine bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Brain {
    state: AiState,
    state_timer_ms: f64,
    entered_at_ms: f64,
    flank_sign: f32,
}

/// A state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// State left
    pub from: AiState,
    /// State entered
    pub to: AiState,
}

impl Brain {
    /// Starts in `state` at `now`.
    #[must_use]
    pub fn new(state: AiState, now: f64) -> Self {
        Self {
            state,
            state_timer_ms: 0.0,
            entered_at_ms: now,
            flank_sign: 1.0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    /// Time spent in the current state.
    #[must_use]
    pub const fn state_timer_ms(&self) -> f64 {
        self.state_timer_ms
    }

    /// When the current state was entered.
    #[must_use]
    pub const fn entered_at_ms(&self) -> f64 {
        self.entered_at_ms
    }

    /// Side chosen for the current flank, ±1.
    #[must_use]
    pub const fn flank_sign(&self) -> f32 {
        self.flank_sign
    }

    /// Enters `to`, resetting the state timer. Entering FLANK picks a side.
    pub fn change(&mut self, to: AiState, now: f64, rng: &mut Rng) -> Transition {
        let from = self.state;
        self.state = to;
        self.state_timer_ms = 0.0;
        self.entered_at_ms = now;
        if to == AiState::Flank {
            self.flank_sign = if rng.bool() { 1.0 } else { -1.0 };
        }
        Transition { from, to }
    }
}

/// What an enemy decided this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Decision {
    /// Fire at this point
    pub fire_at: Option<Vec2>,
    /// State change taken this frame
    pub transition: Option<Transition>,
}

/// Runs one frame of behavior for `enemy` against the player's body.
///
/// Sets horizontal velocity and facing, then evaluates exit conditions.
/// With no live player the enemy patrols.
pub fn think(enemy: &mut Enemy, player: Option<&Body>, now: f64, delta_ms: f64, rng: &mut Rng) -> Decision {
    let mut decision = Decision::default();
    if !enemy.combatant.is_alive() {
        return decision;
    }
    enemy.brain.state_timer_ms += delta_ms;

    let Some(player) = player.filter(|p| p.active) else {
        patrol(enemy);
        return decision;
    };

    let distance = enemy.combatant.body.center_distance(player);
    let timer = enemy.brain.state_timer_ms;
    let next = match enemy.brain.state {
        AiState::Patrol => {
            patrol(enemy);
            (distance < enemy.aggro_range).then_some(AiState::Chase)
        },
        AiState::Chase => {
            move_relative(enemy, player, 1.0);
            if distance < enemy.attack_range {
                Some(AiState::Attack)
            } else if distance > enemy.aggro_range * 1.5 {
                Some(AiState::Patrol)
            } else if timer > CHASE_FLANK_AFTER_MS && rng.f32() < FLANK_CHANCE {
                Some(AiState::Flank)
            } else {
                None
            }
        },
        AiState::Attack => {
            decision.fire_at = attack(enemy, player, now);
            if distance > enemy.attack_range * 1.2 {
                Some(AiState::Chase)
            } else if timer > ATTACK_HIDE_AFTER_MS && rng.f32() < HIDE_CHANCE {
                Some(AiState::Hide)
            } else {
                None
            }
        },
        AiState::Flank => {
            flank(enemy, player);
            (timer > FLANK_MAX_MS || distance < enemy.attack_range).then_some(AiState::Attack)
        },
        AiState::Hide => {
            move_relative(enemy, player, -0.5);
            (timer > HIDE_MS).then_some(AiState::Attack)
        },
        AiState::Retreat => {
            move_relative(enemy, player, -1.5);
            (distance > enemy.aggro_range).then_some(AiState::Patrol)
        },
    };

    if let Some(to) = next {
        let transition = enemy.brain.change(to, now, rng);
        trace!(
            enemy = %enemy.combatant.id,
            from = transition.from.name(),
            to = transition.to.name(),
            distance,
            "AI transition"
        );
        decision.transition = Some(transition);
    }
    decision
}

/// Forced reaction to surviving a hit: RETREAT when below the retreat
/// threshold, CHASE otherwise.
pub fn on_damaged(enemy: &mut Enemy, now: f64, rng: &mut Rng) -> Option<Transition> {
    if !enemy.combatant.is_alive() {
        return None;
    }
    let to = if enemy.combatant.health_fraction() < enemy.retreat_threshold {
        AiState::Retreat
    } else {
        AiState::Chase
    };
    let transition = enemy.brain.change(to, now, rng);
    trace!(
        enemy = %enemy.combatant.id,
        from = transition.from.name(),
        to = transition.to.name(),
        "AI interrupted by damage"
    );
    Some(transition)
}

fn patrol(enemy: &mut Enemy) {
    let x = enemy.combatant.body.position.x;
    if x <= enemy.patrol_min {
        enemy.patrol_dir = 1.0;
    } else if x >= enemy.patrol_max {
        enemy.patrol_dir = -1.0;
    }
    enemy.combatant.body.velocity.x = enemy.patrol_dir * enemy.combatant.speed * 0.5;
    enemy.combatant.facing = Facing::from_dx(enemy.patrol_dir);
}

/// Moves toward (positive `mult`) or away from (negative) the player along x.
fn move_relative(enemy: &mut Enemy, player: &Body, mult: f32) {
    let toward = if enemy.combatant.body.center().x < player.center().x {
        1.0
    } else {
        -1.0
    };
    let dx = toward * mult * enemy.combatant.speed;
    enemy.combatant.body.velocity.x = dx;
    enemy.combatant.facing = Facing::from_dx(dx);
}

fn attack(enemy: &mut Enemy, player: &Body, now: f64) -> Option<Vec2> {
    let target = player.center();
    enemy.combatant.body.velocity.x = 0.0;
    enemy.combatant.facing = Facing::from_dx(target.x - enemy.combatant.body.center().x);
    enemy
        .last_shot_ms
        .map_or(true, |last| now - last > enemy.shot_cooldown_ms)
        .then_some(target)
}

fn flank(enemy: &mut Enemy, player: &Body) {
    let to_player = (player.center() - enemy.combatant.body.center()).normalize_or_zero();
    let side = to_player.perp() * enemy.brain.flank_sign;
    let dx = side.x * enemy.combatant.speed * 1.2;
    enemy.combatant.body.velocity.x = dx;
    enemy.combatant.facing = Facing::from_dx(dx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::EnemyKind;
    use frontline_common::EntityId;

    const GROUND: f32 = 550.0;

    fn infantry_at(x: f32) -> Enemy {
        Enemy::spawn(EntityId::from_raw(2), EnemyKind::Infantry, x, GROUND, 1.0, 0.0)
    }

    fn player_at(x: f32) -> Body {
        Body::new(x, GROUND - 50.0, 30.0, 50.0)
    }

    #[test]
    fn test_patrol_oscillates_without_aggro() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        let player = player_at(2000.0);
        let step = enemy.combatant.speed * 0.5;
        let mut saw_left_turn = false;
        let mut saw_right_turn = false;
        let mut now = 0.0;
        for _ in 0..600 {
            now += 16.0;
            let before = enemy.patrol_dir;
            let decision = think(&mut enemy, Some(&player), now, 16.0, &mut rng);
            assert_eq!(decision.transition, None);
            enemy.combatant.body.integrate(1.0);
            let x = enemy.combatant.body.position.x;
            assert!(x >= enemy.patrol_min - step && x <= enemy.patrol_max + step);
            saw_left_turn |= before > 0.0 && enemy.patrol_dir < 0.0;
            saw_right_turn |= before < 0.0 && enemy.patrol_dir > 0.0;
        }
        assert_eq!(enemy.brain.state(), AiState::Patrol);
        assert!(saw_left_turn && saw_right_turn);
    }

    #[test]
    fn test_patrol_to_chase_in_one_call() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        let player = player_at(1350.0);
        let decision = think(&mut enemy, Some(&player), 16.0, 16.0, &mut rng);
        assert_eq!(
            decision.transition,
            Some(Transition {
                from: AiState::Patrol,
                to: AiState::Chase
            })
        );
        assert_eq!(enemy.brain.state_timer_ms(), 0.0);
        assert_eq!(enemy.brain.entered_at_ms(), 16.0);
    }

    #[test]
    fn test_chase_moves_toward_then_attacks() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        enemy.brain = Brain::new(AiState::Chase, 0.0);
        let player = player_at(1350.0);
        think(&mut enemy, Some(&player), 16.0, 16.0, &mut rng);
        assert_eq!(enemy.combatant.body.velocity.x, enemy.combatant.speed);
        assert_eq!(enemy.combatant.facing, Facing::Right);

        let close = player_at(1200.0);
        let decision = think(&mut enemy, Some(&close), 32.0, 16.0, &mut rng);
        assert_eq!(decision.transition.map(|t| t.to), Some(AiState::Attack));
    }

    #[test]
    fn test_chase_gives_up_far_away() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        enemy.brain = Brain::new(AiState::Chase, 0.0);
        let player = player_at(1700.0);
        let decision = think(&mut enemy, Some(&player), 16.0, 16.0, &mut rng);
        assert_eq!(decision.transition.map(|t| t.to), Some(AiState::Patrol));
    }

    #[test]
    fn test_attack_halts_and_respects_cooldown() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        enemy.brain = Brain::new(AiState::Attack, 0.0);
        enemy.combatant.body.velocity.x = 3.0;
        let player = player_at(900.0);

        let first = think(&mut enemy, Some(&player), 100.0, 16.0, &mut rng);
        assert_eq!(first.fire_at, Some(player.center()));
        assert_eq!(enemy.combatant.body.velocity.x, 0.0);
        assert_eq!(enemy.combatant.facing, Facing::Left);
        assert!(!enemy.fire_at(player.center(), 100.0, &mut rng).is_empty());

        let early = think(&mut enemy, Some(&player), 1100.0, 16.0, &mut rng);
        assert_eq!(early.fire_at, None);
        let late = think(&mut enemy, Some(&player), 1100.5, 16.0, &mut rng);
        assert!(late.fire_at.is_some() || late.transition.is_some());
    }

    #[test]
    fn test_refused_shot_does_not_restart_cooldown() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        enemy.brain = Brain::new(AiState::Attack, 0.0);
        let player = player_at(900.0);
        let target = player.center();

        assert_eq!(think(&mut enemy, Some(&player), 0.0, 16.0, &mut rng).fire_at, Some(target));
        assert!(!enemy.fire_at(target, 0.0, &mut rng).is_empty());
        assert!(enemy.combatant.weapon_mut().reload(10.0));

        // Cooldown has elapsed but the pistol is still reloading
        assert_eq!(think(&mut enemy, Some(&player), 1200.0, 16.0, &mut rng).fire_at, Some(target));
        assert!(enemy.fire_at(target, 1200.0, &mut rng).is_empty());
        assert_eq!(enemy.last_shot_ms, Some(0.0));

        assert!(enemy.combatant.weapon_mut().update(1510.0));
        assert_eq!(think(&mut enemy, Some(&player), 1520.0, 16.0, &mut rng).fire_at, Some(target));
        assert!(!enemy.fire_at(target, 1520.0, &mut rng).is_empty());
        assert_eq!(enemy.last_shot_ms, Some(1520.0));
    }

    #[test]
    fn test_attack_breaks_off_beyond_margin() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        enemy.brain = Brain::new(AiState::Attack, 0.0);
        let player = player_at(1400.0);
        let decision = think(&mut enemy, Some(&player), 16.0, 16.0, &mut rng);
        assert_eq!(decision.transition.map(|t| t.to), Some(AiState::Chase));
    }

    #[test]
    fn test_hide_returns_to_attack() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        enemy.brain = Brain::new(AiState::Hide, 0.0);
        let player = player_at(1100.0);
        think(&mut enemy, Some(&player), 16.0, 16.0, &mut rng);
        assert_eq!(enemy.combatant.body.velocity.x, -enemy.combatant.speed * 0.5);
        let decision = think(&mut enemy, Some(&player), 2100.0, 2000.0, &mut rng);
        assert_eq!(decision.transition.map(|t| t.to), Some(AiState::Attack));
    }

    #[test]
    fn test_flank_keeps_its_side_and_times_out() {
        let mut rng = Rng::with_seed(3);
        let mut enemy = infantry_at(1000.0);
        enemy.brain.change(AiState::Flank, 0.0, &mut rng);
        let sign = enemy.brain.flank_sign();
        let player = Body::new(1000.0, 0.0, 30.0, 50.0);
        for i in 1..10 {
            think(&mut enemy, Some(&player), f64::from(i) * 16.0, 16.0, &mut rng);
            assert_eq!(enemy.brain.flank_sign(), sign);
        }
        let decision = think(&mut enemy, Some(&player), 5000.0, 4000.0, &mut rng);
        assert_eq!(decision.transition.map(|t| t.to), Some(AiState::Attack));
    }

    #[test]
    fn test_retreat_flees_until_out_of_range() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        enemy.brain = Brain::new(AiState::Retreat, 0.0);
        let near = player_at(900.0);
        think(&mut enemy, Some(&near), 16.0, 16.0, &mut rng);
        assert_eq!(enemy.combatant.body.velocity.x, enemy.combatant.speed * 1.5);
        let far = player_at(500.0);
        let decision = think(&mut enemy, Some(&far), 32.0, 16.0, &mut rng);
        assert_eq!(decision.transition.map(|t| t.to), Some(AiState::Patrol));
    }

    #[test]
    fn test_damage_forces_chase_or_retreat() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        enemy.combatant.take_damage(10.0);
        on_damaged(&mut enemy, 5.0, &mut rng);
        assert_eq!(enemy.brain.state(), AiState::Chase);
        enemy.combatant.take_damage(30.0);
        on_damaged(&mut enemy, 6.0, &mut rng);
        assert_eq!(enemy.brain.state(), AiState::Retreat);
    }

    #[test]
    fn test_no_player_means_patrol() {
        let mut rng = Rng::with_seed(7);
        let mut enemy = infantry_at(1000.0);
        enemy.brain = Brain::new(AiState::Attack, 0.0);
        let decision = think(&mut enemy, None, 16.0, 16.0, &mut rng);
        assert_eq!(decision, Decision::default());
        assert_ne!(enemy.combatant.body.velocity.x, 0.0);
    }
}
