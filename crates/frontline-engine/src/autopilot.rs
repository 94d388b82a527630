//! Scripted player for headless runs.
//!
//! Walks toward the nearest enemy, keeps a firing distance, shoots, reloads
//! when dry and hops over whatever stops it.

use frontline_common::Vec2;
use frontline_sim::{CombatantSnapshot, FrameReport, PlayerInput};

/// Preferred distance to the target.
pub const ENGAGE_DISTANCE: f32 = 300.0;
/// Closer than this the autopilot backs off.
pub const TOO_CLOSE: f32 = 120.0;
/// Targets beyond this are not shot at.
pub const FIRE_DISTANCE: f32 = 650.0;
/// Frames without horizontal progress before jumping.
pub const STUCK_FRAMES: u32 = 20;

/// Produces one [`PlayerInput`] per frame from the previous report.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    last_x: Option<f32>,
    stuck_frames: u32,
}

impl Autopilot {
    /// Creates an autopilot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides the next input.
    pub fn next_input(&mut self, report: Option<&FrameReport>) -> PlayerInput {
        let Some(report) = report else {
            return PlayerInput::default();
        };
        let player = &report.player;
        let center = center_of(player);

        let Some(target) = nearest(center, &report.enemies) else {
            self.last_x = Some(player.position.x);
            return PlayerInput::default().moving(1.0);
        };
        let aim = center_of(target);
        let gap = aim.x - center.x;
        let distance = center.distance(aim);

        let mut input = PlayerInput::default();
        if distance > ENGAGE_DISTANCE {
            input.move_axis = gap.signum();
        } else if distance < TOO_CLOSE {
            input.move_axis = -gap.signum();
        }

        if player.ammo == 0 {
            input.reload = true;
        } else if distance < FIRE_DISTANCE {
            input.fire_at = Some(aim);
        }

        let moved = self.last_x.map_or(f32::MAX, |x| (player.position.x - x).abs());
        self.stuck_frames = if input.move_axis != 0.0 && moved < 0.1 {
            self.stuck_frames + 1
        } else {
            0
        };
        if self.stuck_frames >= STUCK_FRAMES && player.on_ground {
            input.jump = true;
            self.stuck_frames = 0;
        }
        self.last_x = Some(player.position.x);
        input
    }
}

fn center_of(snapshot: &CombatantSnapshot) -> Vec2 {
    snapshot.position + snapshot.size / 2.0
}

fn nearest(from: Vec2, enemies: &[CombatantSnapshot]) -> Option<&CombatantSnapshot> {
    enemies
        .iter()
        .min_by(|a, b| from.distance(center_of(a)).total_cmp(&from.distance(center_of(b))))
}
