//! Difficulty scaling
//!
//! Pure functions of player level and score, no hidden state. Spawn pacing
//! is piecewise over coarse level bands; enemy stat multipliers scale
//! continuously; world speed steps up on score milestones with diminishing
//! increments so long runs decelerate instead of running away.

use crate::consts::{BASE_GAME_SPEED, MAX_GAME_SPEED, SPEED_MILESTONE, SPEED_STEP};

/// Level thresholds that open a new spawn band
const BAND_LEVELS: [u32; 5] = [1, 2, 3, 6, 9];
/// Frames between spawn attempts, per band
const BAND_INTERVALS: [u32; 5] = [96, 84, 72, 60, 48];
/// Probability that a spawn attempt produces an enemy, per band
const BAND_PROBABILITIES: [f32; 5] = [0.35, 0.45, 0.55, 0.65, 0.75];

/// Index of the band containing `level`. Levels below the lowest defined
/// band clamp to it; levels past the highest stay in the highest.
fn band_index(level: u32) -> usize {
    let mut idx = 0;
    for (i, &threshold) in BAND_LEVELS.iter().enumerate() {
        if level >= threshold {
            idx = i;
        }
    }
    idx
}

/// Frames between spawn attempts at the given level
pub fn spawn_interval(level: u32) -> u32 {
    BAND_INTERVALS[band_index(level)]
}

/// Probability that a spawn attempt produces an enemy at the given level
pub fn spawn_probability(level: u32) -> f32 {
    BAND_PROBABILITIES[band_index(level)]
}

/// Enemy health multiplier, continuous in level
pub fn enemy_health_mult(level: u32) -> f32 {
    1.0 + 0.15 * level.saturating_sub(1) as f32
}

/// Enemy speed multiplier, continuous in level
pub fn enemy_speed_mult(level: u32) -> f32 {
    1.0 + 0.04 * level.saturating_sub(1) as f32
}

/// World scroll speed for a score. Each milestone adds a step scaled by the
/// remaining headroom below the cap, so increments shrink as speed
/// approaches [`MAX_GAME_SPEED`] and the cap is never crossed.
pub fn game_speed_for(score: u64) -> f32 {
    let milestones = score / SPEED_MILESTONE;
    // Each milestone shrinks the headroom below the cap by a fixed factor,
    // which has a closed form: cap - headroom * factor^milestones.
    let factor = 1.0 - SPEED_STEP / MAX_GAME_SPEED;
    let headroom = (MAX_GAME_SPEED - BASE_GAME_SPEED) * factor.powf(milestones as f32);
    (MAX_GAME_SPEED - headroom).min(MAX_GAME_SPEED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_clamping() {
        // Level 0 clamps to the lowest band
        assert_eq!(spawn_interval(0), spawn_interval(1));
        assert_eq!(spawn_probability(0), spawn_probability(1));
        // Far past the highest band stays in the highest
        assert_eq!(spawn_interval(99), spawn_interval(9));
        assert_eq!(spawn_probability(99), spawn_probability(9));
    }

    #[test]
    fn test_bands_step_at_thresholds() {
        assert!(spawn_interval(2) < spawn_interval(1));
        assert!(spawn_interval(6) < spawn_interval(5));
        assert!(spawn_probability(9) > spawn_probability(8));
        // Within a band nothing changes
        assert_eq!(spawn_interval(4), spawn_interval(5));
        assert_eq!(spawn_probability(4), spawn_probability(5));
    }

    #[test]
    fn test_stat_multipliers_baseline() {
        assert_eq!(enemy_health_mult(1), 1.0);
        assert_eq!(enemy_speed_mult(1), 1.0);
        assert!(enemy_health_mult(10) > enemy_health_mult(5));
    }

    #[test]
    fn test_game_speed_milestones() {
        assert_eq!(game_speed_for(0), BASE_GAME_SPEED);
        assert_eq!(game_speed_for(SPEED_MILESTONE - 1), BASE_GAME_SPEED);
        let first = game_speed_for(SPEED_MILESTONE);
        assert!(first > BASE_GAME_SPEED);
        // Diminishing increments
        let second = game_speed_for(SPEED_MILESTONE * 2);
        let third = game_speed_for(SPEED_MILESTONE * 3);
        assert!(second - first > third - second);
    }

    #[test]
    fn test_game_speed_capped() {
        assert!(game_speed_for(u64::MAX / SPEED_MILESTONE) <= MAX_GAME_SPEED);
        assert!(game_speed_for(1_000_000) <= MAX_GAME_SPEED);
    }

    proptest! {
        #[test]
        fn prop_spawn_curves_monotone(l1 in 0u32..40, l2 in 0u32..40) {
            let (lo, hi) = if l1 <= l2 { (l1, l2) } else { (l2, l1) };
            prop_assert!(spawn_probability(hi) >= spawn_probability(lo));
            prop_assert!(spawn_interval(hi) <= spawn_interval(lo));
        }

        #[test]
        fn prop_game_speed_monotone_and_capped(s1 in 0u64..100_000, s2 in 0u64..100_000) {
            let (lo, hi) = if s1 <= s2 { (s1, s2) } else { (s2, s1) };
            prop_assert!(game_speed_for(hi) >= game_speed_for(lo));
            prop_assert!(game_speed_for(hi) <= MAX_GAME_SPEED);
        }

        #[test]
        fn prop_stat_multipliers_monotone(l1 in 1u32..60, l2 in 1u32..60) {
            let (lo, hi) = if l1 <= l2 { (l1, l2) } else { (l2, l1) };
            prop_assert!(enemy_health_mult(hi) >= enemy_health_mult(lo));
            prop_assert!(enemy_speed_mult(hi) >= enemy_speed_mult(lo));
        }
    }
}
