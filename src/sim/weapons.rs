//! Weapon variants and hit resolution
//!
//! A closed set of weapon kinds, each a flat record dispatched on its tag.
//! `advance` reads the enemy slice and writes deferred output (projectiles
//! to spawn, hits to apply) so the driver can mutate the store afterwards
//! without borrow gymnastics.
//!
//! Hit-tracking scope is each weapon's own contract:
//! - bullets: per projectile lifetime (see `Projectile::hit_ids`)
//! - beam: per damage tick
//! - cleaver: per swing
//! - orbiters: per hunt (cleared when the orb regains its orbit slot)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, within_radius};
use super::entity::{Burn, Enemy, HazardSpec, Projectile, ProjectileEffects};
use super::progression::EffectModifiers;
use crate::consts::WEAPON_SLOT_CAP;
use crate::ease_out_cubic;

/// Weapon roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Straight-shot projectile emitter; fans bullets at higher levels
    Blaster,
    /// Continuous forward beam, damage gated by its own tick interval
    Beam,
    /// Short-lived melee arc in front of the player
    Cleaver,
    /// Gravity-arc shell that becomes a ground-fire hazard on landing
    Mortar,
    /// Auto-targeting orbs that break orbit to strike nearby enemies
    Orbiters,
}

pub const ALL_WEAPON_KINDS: [WeaponKind; 5] = [
    WeaponKind::Blaster,
    WeaponKind::Beam,
    WeaponKind::Cleaver,
    WeaponKind::Mortar,
    WeaponKind::Orbiters,
];

impl WeaponKind {
    pub fn name(&self) -> &'static str {
        match self {
            WeaponKind::Blaster => "Blaster",
            WeaponKind::Beam => "Beam",
            WeaponKind::Cleaver => "Cleaver",
            WeaponKind::Mortar => "Mortar",
            WeaponKind::Orbiters => "Orbiters",
        }
    }

    pub fn max_level(&self) -> u32 {
        5
    }
}

/// Level-derived weapon parameters. Every formula in `for_level` is
/// monotone in level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    /// Frames between fire events (before the fire-rate modifier)
    pub cadence: u32,
    pub damage: f32,
    /// Reach: bullet travel budget, beam length, arc depth, or orb
    /// acquisition radius depending on the variant
    pub range: f32,
    pub pierce: u32,
    /// Fan spread in radians when `count > 1`
    pub spread: f32,
    /// Projectiles per shot / orb count
    pub count: u32,
    /// Cross-axis extent: beam height or arc height
    pub width: f32,
    /// Projectile launch speed
    pub speed: f32,
}

impl WeaponSpec {
    pub fn for_level(kind: WeaponKind, level: u32) -> Self {
        let level = level.clamp(1, kind.max_level());
        let step = level - 1;
        match kind {
            WeaponKind::Blaster => {
                // Range grows a fixed increment per level up to a cap;
                // levels past the cap grant pierce instead.
                const RANGE_CAP_STEPS: u32 = 3;
                let range_steps = step.min(RANGE_CAP_STEPS);
                Self {
                    cadence: 45 - 3 * step,
                    damage: 1.0 + 0.25 * step as f32,
                    range: 300.0 + 40.0 * range_steps as f32,
                    pierce: step.saturating_sub(RANGE_CAP_STEPS),
                    spread: 0.4,
                    count: 1 + step / 2,
                    width: 6.0,
                    speed: 8.0,
                }
            }
            WeaponKind::Beam => Self {
                // Cadence here is the damage tick interval; the beam itself
                // is active every frame
                cadence: 24 - 2 * step,
                damage: 0.6 + 0.2 * step as f32,
                range: 220.0 + 30.0 * step as f32,
                pierce: 0,
                spread: 0.0,
                count: 1,
                width: 14.0 + 4.0 * step as f32,
                speed: 0.0,
            },
            WeaponKind::Cleaver => Self {
                cadence: 70 - 5 * step,
                damage: 2.5 + 0.75 * step as f32,
                range: 80.0 + 12.0 * step as f32,
                pierce: 0,
                spread: 0.0,
                count: 1,
                width: 90.0 + 10.0 * step as f32,
                speed: 0.0,
            },
            WeaponKind::Mortar => Self {
                cadence: 110 - 8 * step,
                damage: 1.0 + 0.3 * step as f32,
                range: 4000.0,
                pierce: 0,
                spread: 0.0,
                count: 1,
                width: 90.0 + 10.0 * step as f32,
                speed: 9.0,
            },
            WeaponKind::Orbiters => Self {
                cadence: 0,
                damage: 2.0 + 0.5 * step as f32,
                range: 180.0 + 25.0 * step as f32,
                pierce: 0,
                spread: 0.0,
                count: 1 + step / 2,
                width: 0.0,
                speed: 7.0,
            },
        }
    }
}

/// Cadence after the fire-rate modifier, floored so a maxed build still
/// has a real interval
fn scaled_cadence(base: u32, fire_rate: f32) -> u32 {
    ((base as f32 / fire_rate.max(0.1)).round() as u32).max(6)
}

/// A damage application for the driver to resolve against the store
#[derive(Debug, Clone)]
pub struct HitEvent {
    pub enemy_id: u32,
    pub damage: f32,
    pub knockback: f32,
    pub burn: Option<Burn>,
}

/// Deferred per-frame weapon output
#[derive(Debug, Clone, Default)]
pub struct WeaponOutput {
    /// Projectiles to hand to the store (ids assigned there)
    pub projectiles: Vec<Projectile>,
    /// Direct hits (beam, cleaver, orb contact)
    pub hits: Vec<HitEvent>,
    /// Which weapons fired this frame, for sound cues
    pub fired: Vec<WeaponKind>,
}

const ORBIT_RADIUS: f32 = 70.0;
const ORBIT_RATE: f32 = 0.07;
const ORB_HIT_RADIUS: f32 = 16.0;
const ORB_RETURN_TICKS: f32 = 24.0;
const ORB_COOLDOWN: u32 = 72;
/// Frames an orb may chase before giving up and returning to orbit
const ORB_HUNT_TICKS: u32 = 72;
const CLEAVE_DURATION: u32 = 18;
const MORTAR_ANGLE: f32 = -0.9;
const MORTAR_GRAVITY: f32 = 0.5;
const MORTAR_FUSE: u32 = 12;

/// What an orb is currently doing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrbPhase {
    /// Tracking the shared orbit angle at this orb's slot
    Orbit,
    /// Breaking orbit toward an acquired enemy
    Seek { target: u32 },
    /// Easing back to the orbital slot after a strike or lost target
    Return { from: Vec2, t: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orb {
    pub phase: OrbPhase,
    pub pos: Vec2,
    pub cooldown: u32,
    /// Frames spent in the current hunt
    hunt_ticks: u32,
    /// Enemies struck during the current hunt. Scope: one hunt; cleared
    /// when the orb settles back into orbit.
    pub hit_ids: Vec<u32>,
}

impl Orb {
    fn new() -> Self {
        Self {
            phase: OrbPhase::Orbit,
            pos: Vec2::ZERO,
            cooldown: 0,
            hunt_ticks: 0,
            hit_ids: Vec::new(),
        }
    }
}

/// One active melee swing. Scope of `hit_ids`: this swing only — one arc
/// hits each enemy exactly once regardless of overlap duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeleeSwing {
    pub age: u32,
    pub hit_ids: Vec<u32>,
}

/// A carried weapon with its per-variant state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub level: u32,
    fire_timer: u32,
    /// Beam: frames since the last damage tick
    beam_timer: u32,
    /// Beam: enemies damaged in the current tick. Scope: one damage tick.
    beam_hit_ids: Vec<u32>,
    pub swings: Vec<MeleeSwing>,
    pub orbs: Vec<Orb>,
    orbit_angle: f32,
}

impl Weapon {
    pub fn new(kind: WeaponKind) -> Self {
        let mut weapon = Self {
            kind,
            level: 1,
            fire_timer: 0,
            beam_timer: 0,
            beam_hit_ids: Vec::new(),
            swings: Vec::new(),
            orbs: Vec::new(),
            orbit_angle: 0.0,
        };
        weapon.sync_orbs();
        weapon
    }

    pub fn spec(&self) -> WeaponSpec {
        WeaponSpec::for_level(self.kind, self.level)
    }

    /// Deterministically re-derive parameters for a level
    pub fn set_level(&mut self, level: u32) {
        self.level = level.clamp(1, self.kind.max_level());
        self.sync_orbs();
    }

    fn sync_orbs(&mut self) {
        if self.kind != WeaponKind::Orbiters {
            return;
        }
        let count = self.spec().count as usize;
        while self.orbs.len() < count {
            self.orbs.push(Orb::new());
        }
        self.orbs.truncate(count);
    }

    /// Make the weapon fire as soon as its next update (weapon-charge
    /// pickup); orbs also drop their cooldowns
    pub fn charge(&mut self) {
        self.fire_timer = u32::MAX;
        self.beam_timer = u32::MAX;
        for orb in &mut self.orbs {
            orb.cooldown = 0;
        }
    }

    /// Beam geometry for the current player position
    pub fn beam_aabb(&self, player_center: Vec2) -> Aabb {
        let spec = self.spec();
        Aabb::from_pos_size(
            Vec2::new(player_center.x, player_center.y - spec.width * 0.5),
            Vec2::new(spec.range, spec.width),
        )
    }

    /// Melee arc volume for the current player position
    pub fn swing_aabb(&self, player_center: Vec2) -> Aabb {
        let spec = self.spec();
        Aabb::from_pos_size(
            Vec2::new(player_center.x + 10.0, player_center.y - spec.width * 0.5),
            Vec2::new(spec.range, spec.width),
        )
    }

    /// Position of orb `index`'s orbital slot
    fn orbit_slot(&self, index: usize, player_center: Vec2) -> Vec2 {
        let slot_angle =
            self.orbit_angle + index as f32 * std::f32::consts::TAU / self.orbs.len().max(1) as f32;
        player_center + crate::angle_to_vec(slot_angle) * ORBIT_RADIUS
    }

    /// Advance one frame: cadence counters, attack-instance state, and hit
    /// resolution against the (read-only) enemy slice. A tick with no
    /// eligible target is a silent no-op, never an error.
    pub fn advance(
        &mut self,
        player_center: Vec2,
        mods: &EffectModifiers,
        enemies: &[Enemy],
        out: &mut WeaponOutput,
    ) {
        match self.kind {
            WeaponKind::Blaster => self.advance_blaster(player_center, mods, out),
            WeaponKind::Beam => self.advance_beam(player_center, mods, enemies, out),
            WeaponKind::Cleaver => self.advance_cleaver(player_center, mods, enemies, out),
            WeaponKind::Mortar => self.advance_mortar(player_center, mods, out),
            WeaponKind::Orbiters => self.advance_orbiters(player_center, mods, enemies, out),
        }
    }

    fn advance_blaster(&mut self, player_center: Vec2, mods: &EffectModifiers, out: &mut WeaponOutput) {
        let spec = self.spec();
        let cadence = scaled_cadence(spec.cadence, mods.fire_rate);
        self.fire_timer = self.fire_timer.saturating_add(1);
        if self.fire_timer < cadence {
            return;
        }
        self.fire_timer = 0;

        let origin = player_center + Vec2::new(20.0, -4.0);
        let damage = spec.damage * mods.damage;
        for angle in fan_angles(spec.count, spec.spread) {
            let mut bullet =
                Projectile::from_angle(0, origin, angle, spec.speed, damage, spec.pierce, spec.range);
            bullet.effects.knockback = 4.0;
            out.projectiles.push(bullet);
        }
        out.fired.push(WeaponKind::Blaster);
    }

    fn advance_beam(
        &mut self,
        player_center: Vec2,
        mods: &EffectModifiers,
        enemies: &[Enemy],
        out: &mut WeaponOutput,
    ) {
        // The beam is always on; only damage is gated. Geometry is
        // recomputed from the player every frame, so the damage tick below
        // always tests the current beam, not a cached one.
        let spec = self.spec();
        let interval = scaled_cadence(spec.cadence, mods.fire_rate);
        self.beam_timer = self.beam_timer.saturating_add(1);
        if self.beam_timer < interval {
            return;
        }
        self.beam_timer = 0;
        self.beam_hit_ids.clear();

        let beam = self.beam_aabb(player_center);
        let damage = spec.damage * mods.damage;
        let mut any = false;
        for enemy in enemies {
            if !enemy.alive() || !enemy.vulnerable() {
                continue;
            }
            if self.beam_hit_ids.contains(&enemy.id) {
                continue;
            }
            if beam.overlaps(&enemy.aabb()) {
                self.beam_hit_ids.push(enemy.id);
                out.hits.push(HitEvent {
                    enemy_id: enemy.id,
                    damage,
                    knockback: 0.0,
                    burn: None,
                });
                any = true;
            }
        }
        if any {
            out.fired.push(WeaponKind::Beam);
        }
    }

    fn advance_cleaver(
        &mut self,
        player_center: Vec2,
        mods: &EffectModifiers,
        enemies: &[Enemy],
        out: &mut WeaponOutput,
    ) {
        let spec = self.spec();
        let cadence = scaled_cadence(spec.cadence, mods.fire_rate);
        self.fire_timer = self.fire_timer.saturating_add(1);
        if self.fire_timer >= cadence {
            self.fire_timer = 0;
            self.swings.push(MeleeSwing {
                age: 0,
                hit_ids: Vec::new(),
            });
            out.fired.push(WeaponKind::Cleaver);
        }

        let volume = self.swing_aabb(player_center);
        let damage = spec.damage * mods.damage;
        for swing in &mut self.swings {
            swing.age += 1;
            for enemy in enemies {
                if !enemy.alive() || !enemy.vulnerable() {
                    continue;
                }
                if swing.hit_ids.contains(&enemy.id) {
                    continue;
                }
                if volume.overlaps(&enemy.aabb()) {
                    swing.hit_ids.push(enemy.id);
                    out.hits.push(HitEvent {
                        enemy_id: enemy.id,
                        damage,
                        knockback: 10.0,
                        burn: None,
                    });
                }
            }
        }
        self.swings.retain(|s| s.age < CLEAVE_DURATION);
    }

    fn advance_mortar(&mut self, player_center: Vec2, mods: &EffectModifiers, out: &mut WeaponOutput) {
        let spec = self.spec();
        let cadence = scaled_cadence(spec.cadence, mods.fire_rate);
        self.fire_timer = self.fire_timer.saturating_add(1);
        if self.fire_timer < cadence {
            return;
        }
        self.fire_timer = 0;

        let damage = spec.damage * mods.damage;
        let mut shell = Projectile::from_angle(
            0,
            player_center + Vec2::new(10.0, -10.0),
            MORTAR_ANGLE,
            spec.speed,
            damage,
            0,
            spec.range,
        );
        shell.size = Vec2::new(14.0, 14.0);
        shell.gravity = MORTAR_GRAVITY;
        shell.fuse_ticks = MORTAR_FUSE;
        shell.effects = ProjectileEffects {
            knockback: 0.0,
            burn: Some(Burn::new(damage * 0.25, 180, 15)),
            explodes: true,
            hazard: Some(HazardSpec {
                damage_per_cycle: damage,
                duration_ticks: 180 + 30 * (self.level - 1),
                cycle_interval: 15,
                size: Vec2::new(spec.width, 30.0),
            }),
        };
        out.projectiles.push(shell);
        out.fired.push(WeaponKind::Mortar);
    }

    fn advance_orbiters(
        &mut self,
        player_center: Vec2,
        mods: &EffectModifiers,
        enemies: &[Enemy],
        out: &mut WeaponOutput,
    ) {
        let spec = self.spec();
        self.orbit_angle += ORBIT_RATE;
        let damage = spec.damage * mods.damage;

        // Targets already claimed by a hunting orb; two orbs never chase
        // the same enemy. Acquisitions made below join the list so orbs
        // waking in the same frame don't pile onto one target.
        let mut claimed: Vec<u32> = self
            .orbs
            .iter()
            .filter_map(|o| match o.phase {
                OrbPhase::Seek { target } => Some(target),
                _ => None,
            })
            .collect();

        for index in 0..self.orbs.len() {
            let slot = self.orbit_slot(index, player_center);
            let orb = &mut self.orbs[index];
            orb.cooldown = orb.cooldown.saturating_sub(1);

            match orb.phase.clone() {
                OrbPhase::Orbit => {
                    orb.pos = slot;
                    if orb.cooldown > 0 {
                        continue;
                    }
                    // Acquire the nearest un-hit, unclaimed enemy in range
                    let target = enemies
                        .iter()
                        .filter(|e| e.alive() && e.vulnerable())
                        .filter(|e| !claimed.contains(&e.id) && !orb.hit_ids.contains(&e.id))
                        .filter(|e| within_radius(player_center, e.center(), spec.range))
                        .min_by(|a, b| {
                            let da = a.center().distance_squared(orb.pos);
                            let db = b.center().distance_squared(orb.pos);
                            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .map(|e| e.id);
                    if let Some(target) = target {
                        claimed.push(target);
                        orb.hunt_ticks = 0;
                        orb.phase = OrbPhase::Seek { target };
                    }
                }
                OrbPhase::Seek { target } => {
                    orb.hunt_ticks = orb.hunt_ticks.saturating_add(1);
                    if orb.hunt_ticks > ORB_HUNT_TICKS {
                        // Target outran the orb; break off the hunt
                        orb.phase = OrbPhase::Return {
                            from: orb.pos,
                            t: 0.0,
                        };
                        continue;
                    }
                    let Some(enemy) = enemies.iter().find(|e| e.id == target && e.alive()) else {
                        // Target died or was culled mid-hunt
                        orb.phase = OrbPhase::Return {
                            from: orb.pos,
                            t: 0.0,
                        };
                        continue;
                    };
                    let to_target = enemy.center() - orb.pos;
                    let step = to_target.normalize_or_zero() * spec.speed;
                    orb.pos += step;
                    if within_radius(orb.pos, enemy.center(), ORB_HIT_RADIUS) {
                        orb.hit_ids.push(target);
                        orb.cooldown = ORB_COOLDOWN;
                        orb.phase = OrbPhase::Return {
                            from: orb.pos,
                            t: 0.0,
                        };
                        out.hits.push(HitEvent {
                            enemy_id: target,
                            damage,
                            knockback: 6.0,
                            burn: None,
                        });
                        out.fired.push(WeaponKind::Orbiters);
                    }
                }
                OrbPhase::Return { from, t } => {
                    let t = t + 1.0 / ORB_RETURN_TICKS;
                    if t >= 1.0 {
                        orb.pos = slot;
                        orb.phase = OrbPhase::Orbit;
                        // Hunt over: the per-hunt hit set resets
                        orb.hit_ids.clear();
                    } else {
                        orb.pos = from.lerp(slot, ease_out_cubic(t));
                        orb.phase = OrbPhase::Return { from, t };
                    }
                }
            }
        }
    }
}

/// Evenly fanned launch angles across `spread`, symmetric about forward
fn fan_angles(count: u32, spread: f32) -> Vec<f32> {
    if count <= 1 {
        return vec![0.0];
    }
    (0..count)
        .map(|i| -spread / 2.0 + spread * i as f32 / (count - 1) as f32)
        .collect()
}

/// The player's carried weapons, capped at [`WEAPON_SLOT_CAP`] slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battery {
    pub weapons: Vec<Weapon>,
}

impl Battery {
    /// Starting loadout: a level-1 Blaster
    pub fn starting_loadout() -> Self {
        Self {
            weapons: vec![Weapon::new(WeaponKind::Blaster)],
        }
    }

    pub fn has(&self, kind: WeaponKind) -> bool {
        self.weapons.iter().any(|w| w.kind == kind)
    }

    pub fn level_of(&self, kind: WeaponKind) -> Option<u32> {
        self.weapons.iter().find(|w| w.kind == kind).map(|w| w.level)
    }

    pub fn slots_used(&self) -> usize {
        self.weapons.len()
    }

    pub fn slots_free(&self) -> bool {
        self.weapons.len() < WEAPON_SLOT_CAP
    }

    /// Add a new weapon. Returns false (no state change) when the kind is
    /// already carried or all slots are taken.
    pub fn unlock(&mut self, kind: WeaponKind) -> bool {
        if self.has(kind) || !self.slots_free() {
            return false;
        }
        self.weapons.push(Weapon::new(kind));
        true
    }

    /// Raise a carried weapon one level. Returns false when the weapon is
    /// not carried or already maxed.
    pub fn level_up(&mut self, kind: WeaponKind) -> bool {
        let Some(weapon) = self.weapons.iter_mut().find(|w| w.kind == kind) else {
            return false;
        };
        if weapon.level >= kind.max_level() {
            return false;
        }
        weapon.set_level(weapon.level + 1);
        true
    }

    /// Weapon-charge pickup: every weapon is instantly ready
    pub fn charge_all(&mut self) {
        for weapon in &mut self.weapons {
            weapon.charge();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::EnemyKind;

    fn mods() -> EffectModifiers {
        EffectModifiers::default()
    }

    fn enemy_at(id: u32, x: f32) -> Enemy {
        Enemy::spawn(id, EnemyKind::Walker, x, 1.0, 1.0)
    }

    #[test]
    fn test_spec_monotonic_in_level() {
        for kind in ALL_WEAPON_KINDS {
            for level in 1..kind.max_level() {
                let lo = WeaponSpec::for_level(kind, level);
                let hi = WeaponSpec::for_level(kind, level + 1);
                assert!(hi.damage >= lo.damage, "{kind:?} damage regressed");
                assert!(hi.range >= lo.range, "{kind:?} range regressed");
                assert!(hi.cadence <= lo.cadence, "{kind:?} cadence regressed");
                assert!(hi.pierce >= lo.pierce, "{kind:?} pierce regressed");
            }
        }
    }

    #[test]
    fn test_blaster_range_cap_then_pierce() {
        let capped = WeaponSpec::for_level(WeaponKind::Blaster, 4);
        let past_cap = WeaponSpec::for_level(WeaponKind::Blaster, 5);
        assert_eq!(capped.range, past_cap.range);
        assert_eq!(capped.pierce, 0);
        assert_eq!(past_cap.pierce, 1);
    }

    #[test]
    fn test_fan_angles_symmetric() {
        let angles = fan_angles(3, 0.4);
        assert_eq!(angles.len(), 3);
        assert!((angles[0] + angles[2]).abs() < 1e-6);
        assert!(angles[1].abs() < 1e-6);

        assert_eq!(fan_angles(1, 0.4), vec![0.0]);
    }

    #[test]
    fn test_blaster_fires_on_cadence() {
        let mut weapon = Weapon::new(WeaponKind::Blaster);
        let cadence = weapon.spec().cadence;
        let mut out = WeaponOutput::default();
        for _ in 0..cadence - 1 {
            weapon.advance(Vec2::new(140.0, 400.0), &mods(), &[], &mut out);
        }
        assert!(out.projectiles.is_empty());
        weapon.advance(Vec2::new(140.0, 400.0), &mods(), &[], &mut out);
        assert_eq!(out.projectiles.len(), 1);
        assert_eq!(out.fired, vec![WeaponKind::Blaster]);
    }

    #[test]
    fn test_fire_rate_modifier_shortens_cadence() {
        let mut fast = mods();
        fast.fire_rate = 1.5;
        let base = scaled_cadence(45, 1.0);
        let quick = scaled_cadence(45, fast.fire_rate);
        assert!(quick < base);
        // Never collapses to zero
        assert!(scaled_cadence(6, 100.0) >= 6);
    }

    #[test]
    fn test_beam_damage_gated_by_interval() {
        let mut weapon = Weapon::new(WeaponKind::Beam);
        let interval = weapon.spec().cadence;
        let player = Vec2::new(140.0, 412.0);
        // Enemy square in front of the player at beam height
        let mut enemy = enemy_at(7, 200.0);
        enemy.pos.y = player.y - enemy.size.y * 0.5;

        let mut out = WeaponOutput::default();
        let enemies = vec![enemy];
        for _ in 0..interval * 3 {
            weapon.advance(player, &mods(), &enemies, &mut out);
        }
        // Damage lands once per interval, not every frame
        assert_eq!(out.hits.len(), 3);
    }

    #[test]
    fn test_cleaver_swing_hits_once() {
        let mut weapon = Weapon::new(WeaponKind::Cleaver);
        let player = Vec2::new(140.0, 412.0);
        let mut enemy = enemy_at(9, 160.0);
        enemy.pos.y = player.y - enemy.size.y * 0.5;
        let enemies = vec![enemy];

        let cadence = weapon.spec().cadence;
        let mut out = WeaponOutput::default();
        // Run long enough for exactly one swing to spawn and expire
        for _ in 0..cadence + CLEAVE_DURATION {
            weapon.advance(player, &mods(), &enemies, &mut out);
        }
        let hits_on_9 = out.hits.iter().filter(|h| h.enemy_id == 9).count();
        assert_eq!(hits_on_9, 1, "one swing must hit each enemy exactly once");
    }

    #[test]
    fn test_mortar_shell_carries_hazard() {
        let mut weapon = Weapon::new(WeaponKind::Mortar);
        let mut out = WeaponOutput::default();
        for _ in 0..weapon.spec().cadence {
            weapon.advance(Vec2::new(140.0, 400.0), &mods(), &[], &mut out);
        }
        assert_eq!(out.projectiles.len(), 1);
        let shell = &out.projectiles[0];
        assert!(shell.gravity > 0.0);
        assert!(shell.effects.explodes);
        assert!(shell.effects.hazard.is_some());
    }

    #[test]
    fn test_orb_acquires_and_strikes() {
        let mut weapon = Weapon::new(WeaponKind::Orbiters);
        let player = Vec2::new(140.0, 400.0);
        let enemies = vec![enemy_at(3, 180.0)];
        let mut out = WeaponOutput::default();

        let mut struck = false;
        for _ in 0..240 {
            weapon.advance(player, &mods(), &enemies, &mut out);
            if out.hits.iter().any(|h| h.enemy_id == 3) {
                struck = true;
                break;
            }
        }
        assert!(struck, "orb never reached a target well inside range");
        // After the strike the orb is returning and on cooldown
        assert!(matches!(weapon.orbs[0].phase, OrbPhase::Return { .. }));
        assert!(weapon.orbs[0].cooldown > 0);
    }

    #[test]
    fn test_one_orb_per_target_per_frame() {
        let mut weapon = Weapon::new(WeaponKind::Orbiters);
        weapon.set_level(5);
        assert_eq!(weapon.orbs.len(), 3);

        let player = Vec2::new(140.0, 400.0);
        let enemies = vec![enemy_at(3, 180.0)];
        let mut out = WeaponOutput::default();
        weapon.advance(player, &mods(), &enemies, &mut out);

        let seekers = weapon
            .orbs
            .iter()
            .filter(|o| matches!(o.phase, OrbPhase::Seek { .. }))
            .count();
        assert_eq!(seekers, 1, "a target may be claimed by one orb at a time");
    }

    #[test]
    fn test_orb_breaks_off_stale_hunt() {
        let mut weapon = Weapon::new(WeaponKind::Orbiters);
        let player = Vec2::new(140.0, 400.0);
        let mut enemies = vec![enemy_at(6, 180.0)];
        let mut out = WeaponOutput::default();
        weapon.advance(player, &mods(), &enemies, &mut out);
        assert!(matches!(weapon.orbs[0].phase, OrbPhase::Seek { .. }));

        // The target tears away faster than the orb can close
        enemies[0].pos.x = 5000.0;
        for _ in 0..=ORB_HUNT_TICKS {
            weapon.advance(player, &mods(), &enemies, &mut out);
        }
        assert!(out.hits.is_empty());
        assert!(
            !matches!(weapon.orbs[0].phase, OrbPhase::Seek { .. }),
            "orb must give up a hunt it cannot finish"
        );
    }

    #[test]
    fn test_orb_ignores_out_of_range_targets() {
        let mut weapon = Weapon::new(WeaponKind::Orbiters);
        let player = Vec2::new(140.0, 400.0);
        let range = weapon.spec().range;
        let enemies = vec![enemy_at(4, player.x + range + 300.0)];
        let mut out = WeaponOutput::default();
        for _ in 0..120 {
            weapon.advance(player, &mods(), &enemies, &mut out);
        }
        assert!(out.hits.is_empty());
        assert!(matches!(weapon.orbs[0].phase, OrbPhase::Orbit));
    }

    #[test]
    fn test_battery_slot_cap() {
        let mut battery = Battery::starting_loadout();
        assert!(battery.unlock(WeaponKind::Beam));
        assert!(battery.unlock(WeaponKind::Cleaver));
        // Cap reached
        assert!(!battery.unlock(WeaponKind::Mortar));
        // Re-unlocking a carried weapon changes nothing
        assert!(!battery.unlock(WeaponKind::Beam));
        assert_eq!(battery.slots_used(), WEAPON_SLOT_CAP);
    }

    #[test]
    fn test_battery_level_cap() {
        let mut battery = Battery::starting_loadout();
        for _ in 1..WeaponKind::Blaster.max_level() {
            assert!(battery.level_up(WeaponKind::Blaster));
        }
        assert!(!battery.level_up(WeaponKind::Blaster));
        assert!(!battery.level_up(WeaponKind::Orbiters));
        assert_eq!(
            battery.level_of(WeaponKind::Blaster),
            Some(WeaponKind::Blaster.max_level())
        );
    }

    #[test]
    fn test_orb_count_grows_with_level() {
        let mut weapon = Weapon::new(WeaponKind::Orbiters);
        assert_eq!(weapon.orbs.len(), 1);
        weapon.set_level(5);
        assert_eq!(weapon.orbs.len(), 3);
    }
}
