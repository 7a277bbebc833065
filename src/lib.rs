//! Sidestorm - a side-scrolling survival-combat simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, weapons, collisions, progression)
//! - `highscores`: Local leaderboard with submit/fetch semantics
//! - `settings`: Player preferences

pub mod highscores;
pub mod settings;
pub mod sim;

pub use highscores::{HighScores, SubmitResult};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Simulation rate. Every timer in the sim counts frames, never wall
    /// clock, so a run replays identically at any real frame rate.
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Visible field dimensions (x grows rightward, y grows downward)
    pub const FIELD_WIDTH: f32 = 900.0;
    pub const FIELD_HEIGHT: f32 = 500.0;
    /// Top of the ground plane
    pub const GROUND_Y: f32 = 440.0;

    /// Player geometry and physics
    pub const PLAYER_X: f32 = 120.0;
    pub const PLAYER_WIDTH: f32 = 40.0;
    pub const PLAYER_HEIGHT: f32 = 56.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    /// Downward acceleration per frame
    pub const GRAVITY: f32 = 0.6;
    /// Initial upward velocity of a jump (negative = up)
    pub const JUMP_VELOCITY: f32 = -13.0;
    /// Fraction of upward velocity kept when the jump button is released
    /// early (variable jump height)
    pub const JUMP_CUTOFF: f32 = 0.45;
    /// Invulnerability window after taking a hit, in frames
    pub const HURT_INVULN_TICKS: u32 = 60;

    /// World scroll
    pub const BASE_GAME_SPEED: f32 = 4.0;
    pub const MAX_GAME_SPEED: f32 = 10.0;
    /// Score interval between speed-up milestones
    pub const SPEED_MILESTONE: u64 = 500;
    /// Base speed increment per milestone, before the diminishing factor
    pub const SPEED_STEP: f32 = 0.8;

    /// Pickups
    pub const BASE_MAGNET_RADIUS: f32 = 90.0;
    /// Speed at which a magnetized pickup homes toward the player
    pub const PICKUP_PULL_SPEED: f32 = 9.0;
    pub const PICKUP_DRIFT_SPEED: f32 = 1.0;

    /// Off-field cull buffers. Pickups get a wider one so magnet overshoot
    /// past the player doesn't destroy them.
    pub const CULL_BUFFER: f32 = 80.0;
    pub const PICKUP_CULL_BUFFER: f32 = 240.0;

    /// Contact damage
    pub const ENEMY_TOUCH_DAMAGE: f32 = 10.0;
    pub const OBSTACLE_TOUCH_DAMAGE: f32 = 15.0;

    /// Maximum weapons the player can carry at once
    pub const WEAPON_SLOT_CAP: usize = 3;
    /// Player level required before ultimate upgrades are offered
    pub const ULTIMATE_LEVEL_GATE: u32 = 10;
}

/// Unit vector for a launch angle (0 = forward along +x, positive = down,
/// matching the screen-space y axis)
#[inline]
pub fn angle_to_vec(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Cubic ease-out, used for orb return interpolation
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_to_vec_forward() {
        let v = angle_to_vec(0.0);
        assert!((v.x - 1.0).abs() < 1e-6);
        assert!(v.y.abs() < 1e-6);
    }

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert!(ease_out_cubic(0.0).abs() < 1e-6);
        assert!((ease_out_cubic(1.0) - 1.0).abs() < 1e-6);
        // Monotone in between
        assert!(ease_out_cubic(0.3) < ease_out_cubic(0.6));
    }
}
