//! The per-frame driver
//!
//! One `tick` per rendered frame. Within a Running frame the order is
//! fixed: input, player physics, entity movement, weapons, spawning, then
//! the collision passes in a set sequence (weapons vs enemies, hazards vs
//! enemies, field vs player, pickups vs player), kill harvest, pickup
//! effects, level-up handling, score and speed, and finally the cull
//! sweep. Holding the order fixed is what makes a seed reproduce a run.

use glam::Vec2;
use log::debug;
use rand::Rng;

use super::difficulty;
use super::entity::{Enemy, EnemyKind, Obstacle, PickupKind};
use super::progression::upgrade_choices;
use super::state::{GameEvent, GamePhase, GameState, SoundCue};
use super::weapons::WeaponOutput;
use crate::consts::*;

/// Edge-triggered input for one frame
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Jump / confirm, pressed this frame
    pub primary: bool,
    /// Jump released this frame (shortens the arc)
    pub primary_release: bool,
    pub pause: bool,
    /// Index into the pending upgrade choices
    pub select_upgrade: Option<usize>,
}

/// Frames between obstacle spawn attempts
const OBSTACLE_INTERVAL: u32 = 160;
const OBSTACLE_PROBABILITY: f32 = 0.5;
/// Frames between ambient pickup spawn attempts
const PICKUP_INTERVAL: u32 = 240;
const HEART_SHARE: f32 = 0.30;
const CHARGE_SHARE: f32 = 0.15;
/// Score accrued per pixel of world scroll
const SCORE_PER_PIXEL: f32 = 0.025;
/// Score per point of XP on a kill
const KILL_SCORE_MULT: u64 = 10;
/// Chance that a kill drops a coin alongside its gem
const COIN_DROP_CHANCE: f32 = 0.35;
/// Upgrade choices offered per level-up
const CHOICES_PER_LEVEL: usize = 3;
/// Margin past the right field edge where spawns materialize
const SPAWN_MARGIN: f32 = 30.0;

impl GameState {
    /// Advance the state machine one frame
    pub fn tick(&mut self, input: &TickInput) {
        match self.phase {
            GamePhase::Title | GamePhase::GameOver => {
                if input.primary {
                    debug!("starting run, seed {}", self.seed);
                    self.begin_run();
                }
            }
            GamePhase::Paused => {
                if input.pause {
                    self.phase = GamePhase::Running;
                }
            }
            GamePhase::LevelUp => self.handle_level_up(input),
            GamePhase::Running => {
                if input.pause {
                    self.phase = GamePhase::Paused;
                    return;
                }
                self.run_frame(input);
            }
        }
    }

    fn handle_level_up(&mut self, input: &TickInput) {
        let Some(index) = input.select_upgrade else {
            return;
        };
        let Some(choice) = self.pending_choices.get(index) else {
            return;
        };
        let id = choice.id;
        self.apply_upgrade(id);
        self.progression.pending_level_ups = self.progression.pending_level_ups.saturating_sub(1);

        if self.progression.pending_level_ups > 0 {
            self.offer_choices();
            if !self.pending_choices.is_empty() {
                return;
            }
            // Fully built out mid-burst: the remaining level-ups have
            // nothing left to buy
            self.progression.pending_level_ups = 0;
        }
        self.pending_choices.clear();
        self.phase = GamePhase::Running;
    }

    fn offer_choices(&mut self) {
        let health_frac = self.health_frac();
        self.pending_choices = upgrade_choices(
            &mut self.progression,
            &self.battery,
            health_frac,
            CHOICES_PER_LEVEL,
            &mut self.rng,
        );
    }

    fn run_frame(&mut self, input: &TickInput) {
        self.time_ticks += 1;

        // Input
        if input.primary && self.player.jump(self.modifiers.jump_power) {
            self.push_sound(SoundCue::Jump);
        }
        if input.primary_release {
            self.player.cut_jump();
        }
        self.player.advance();

        // The move-speed stat scales how fast the world scrolls past
        let scroll = self.game_speed * self.modifiers.move_speed;

        self.advance_entities(scroll);
        self.advance_weapons();
        self.spawn_wave();

        // Collision passes, fixed order
        self.resolve_projectiles_vs_enemies();
        self.resolve_hazards_vs_enemies();
        self.resolve_field_vs_player();
        self.resolve_pickups_vs_player();

        self.harvest_kills();
        self.handle_pending_level_ups();

        self.accrue_score(scroll * SCORE_PER_PIXEL);
        self.game_speed = difficulty::game_speed_for(self.score);

        if !self.player.alive() {
            debug!(
                "run over at tick {}: score {}, level {}",
                self.time_ticks, self.score, self.progression.level
            );
            self.phase = GamePhase::GameOver;
            self.push_event(GameEvent::RunEnded { score: self.score });
            self.push_sound(SoundCue::GameOver);
        }

        self.store.cull_off_field();
    }

    fn advance_entities(&mut self, scroll: f32) {
        for obstacle in &mut self.store.obstacles {
            obstacle.advance(scroll);
        }
        for enemy in &mut self.store.enemies {
            enemy.advance(scroll);
            let burn_damage = enemy.advance_burn();
            if burn_damage > 0.0 {
                // Deaths land in the kill harvest with everything else
                enemy.apply_damage(burn_damage);
            }
        }
        for hazard in &mut self.store.hazards {
            hazard.advance(scroll);
        }

        // Landed shells convert to hazards once their fuse runs out
        let mut conversions = Vec::new();
        for projectile in &mut self.store.projectiles {
            projectile.advance();
            if projectile.active && projectile.fuse_elapsed() {
                if let Some(spec) = projectile.effects.hazard {
                    conversions.push((projectile.pos.x + projectile.size.x * 0.5, spec));
                }
                projectile.active = false;
            }
        }
        for (center_x, spec) in conversions {
            self.store.spawn_hazard(center_x, spec);
        }

        let target = self.player.center();
        let magnet_radius = self.modifiers.magnet_radius;
        for pickup in &mut self.store.pickups {
            pickup.advance(target, magnet_radius, scroll);
        }
    }

    fn advance_weapons(&mut self) {
        let player_center = self.player.center();
        let mods = self.modifiers;
        let mut output = WeaponOutput::default();
        for weapon in &mut self.battery.weapons {
            weapon.advance(player_center, &mods, &self.store.enemies, &mut output);
        }

        for projectile in output.projectiles {
            self.store.add_projectile(projectile);
        }
        for hit in output.hits {
            if let Some(enemy) = self.store.enemy_mut(hit.enemy_id) {
                enemy.apply_damage(hit.damage);
                if hit.knockback > 0.0 {
                    enemy.knock_back(hit.knockback);
                }
                if let Some(burn) = hit.burn {
                    enemy.apply_burn(burn);
                }
            }
        }
        if !output.fired.is_empty() {
            self.push_sound(SoundCue::Fire);
        }
    }

    /// Spawn pacing is frame-driven; scroll speed only moves what is
    /// already on the field
    fn spawn_wave(&mut self) {
        let level = self.progression.level;
        let spawn_x = FIELD_WIDTH + SPAWN_MARGIN;

        self.spawn_timer += 1;
        if self.spawn_timer >= difficulty::spawn_interval(level) {
            self.spawn_timer = 0;
            if self.rng.random_range(0.0..1.0) < difficulty::spawn_probability(level) {
                let kind = roll_enemy_kind(&mut self.rng);
                let id = self.store.next_entity_id();
                self.store.spawn_enemy(Enemy::spawn(
                    id,
                    kind,
                    spawn_x,
                    difficulty::enemy_health_mult(level),
                    difficulty::enemy_speed_mult(level),
                ));
            }
        }

        self.obstacle_timer += 1;
        if self.obstacle_timer >= OBSTACLE_INTERVAL {
            self.obstacle_timer = 0;
            if self.rng.random_range(0.0..1.0) < OBSTACLE_PROBABILITY {
                let size = Vec2::new(
                    self.rng.random_range(24.0..48.0),
                    self.rng.random_range(30.0..62.0),
                );
                let id = self.store.next_entity_id();
                self.store.spawn_obstacle(Obstacle::new(id, spawn_x, size));
            }
        }

        self.pickup_timer += 1;
        if self.pickup_timer >= PICKUP_INTERVAL {
            self.pickup_timer = 0;
            let roll: f32 = self.rng.random_range(0.0..1.0);
            let kind = if roll < HEART_SHARE {
                PickupKind::Heart
            } else if roll < HEART_SHARE + CHARGE_SHARE {
                PickupKind::WeaponCharge
            } else {
                PickupKind::Coin
            };
            let altitude = self.rng.random_range(0.0..140.0);
            let pos = Vec2::new(spawn_x, GROUND_Y - 40.0 - altitude);
            self.store.spawn_pickup(kind, pos);
        }
    }

    /// Weapons-vs-enemies pass for in-flight projectiles. Beam, cleaver,
    /// and orb contacts were resolved when the weapons advanced.
    fn resolve_projectiles_vs_enemies(&mut self) {
        let store = &mut self.store;
        let mut bursts = Vec::new();

        for projectile in &mut store.projectiles {
            if !projectile.active || projectile.landed {
                continue;
            }
            let volume = projectile.aabb();
            for enemy in &mut store.enemies {
                if !projectile.active {
                    break;
                }
                if !enemy.alive() || !enemy.vulnerable() || projectile.has_hit(enemy.id) {
                    continue;
                }
                if volume.overlaps(&enemy.aabb()) {
                    enemy.apply_damage(projectile.damage);
                    if projectile.effects.knockback > 0.0 {
                        enemy.knock_back(projectile.effects.knockback);
                    }
                    if let Some(burn) = projectile.effects.burn {
                        enemy.apply_burn(burn);
                    }
                    projectile.register_hit(enemy.id);
                    // Contact-burst shells leave their hazard at the impact
                    if projectile.effects.explodes {
                        if let Some(spec) = projectile.effects.hazard {
                            bursts.push((volume.center().x, spec));
                        }
                    }
                }
            }
        }

        for (center_x, spec) in bursts {
            store.spawn_hazard(center_x, spec);
        }
    }

    fn resolve_hazards_vs_enemies(&mut self) {
        let store = &mut self.store;
        for hazard in &mut store.hazards {
            if !hazard.active {
                continue;
            }
            let volume = hazard.aabb();
            for enemy in &mut store.enemies {
                if !enemy.alive() || !enemy.vulnerable() || hazard.has_hit(enemy.id) {
                    continue;
                }
                if volume.overlaps(&enemy.aabb()) {
                    hazard.record_hit(enemy.id);
                    enemy.apply_damage(hazard.damage_per_cycle);
                }
            }
        }
    }

    fn resolve_field_vs_player(&mut self) {
        let player_box = self.player.aabb();
        let mut contact_damage = None;

        for obstacle in &self.store.obstacles {
            if obstacle.active && player_box.overlaps(&obstacle.aabb()) {
                contact_damage = Some(obstacle.damage);
                break;
            }
        }
        if contact_damage.is_none() {
            for enemy in &self.store.enemies {
                // Phased enemies pass through the player harmlessly
                if enemy.alive() && enemy.vulnerable() && player_box.overlaps(&enemy.aabb()) {
                    contact_damage = Some(ENEMY_TOUCH_DAMAGE);
                    break;
                }
            }
        }

        if let Some(damage) = contact_damage {
            if self.player.take_damage(damage) {
                self.push_sound(SoundCue::Hurt);
            }
        }
    }

    fn resolve_pickups_vs_player(&mut self) {
        let player_box = self.player.aabb();
        let mut collected = Vec::new();
        for pickup in &mut self.store.pickups {
            if pickup.active && player_box.overlaps(&pickup.aabb()) && pickup.collect() {
                collected.push((pickup.kind, pickup.value));
            }
        }

        for (kind, value) in collected {
            match kind {
                PickupKind::Coin => {
                    let bonuses = self.progression.coins.add(value);
                    if bonuses > 0 {
                        self.refresh_modifiers();
                        self.push_event(GameEvent::CoinBonus(bonuses));
                    }
                    self.push_sound(SoundCue::Coin);
                }
                PickupKind::XpGem => {
                    self.progression.add_xp(value);
                    self.push_sound(SoundCue::Gem);
                }
                PickupKind::Heart => {
                    self.player.heal(value as f32, self.modifiers.max_health);
                    self.push_sound(SoundCue::Heart);
                }
                PickupKind::WeaponCharge => {
                    self.battery.charge_all();
                    self.push_sound(SoundCue::Charge);
                }
            }
        }
    }

    /// Collect this frame's deaths: drops, score, events. Burn deaths and
    /// weapon deaths converge here so each kill is counted exactly once.
    fn harvest_kills(&mut self) {
        let mut drops = Vec::new();
        let mut score_gain = 0u64;
        for enemy in &mut self.store.enemies {
            if enemy.active && enemy.health <= 0.0 {
                enemy.active = false;
                drops.push((enemy.id, enemy.center(), enemy.xp_reward));
                score_gain += enemy.xp_reward as u64 * KILL_SCORE_MULT;
            }
        }
        self.score += score_gain;

        for (id, at, xp) in drops {
            let gem_id = self.store.spawn_pickup(PickupKind::XpGem, at);
            if let Some(gem) = self.store.pickups.iter_mut().find(|p| p.id == gem_id) {
                // Bigger enemies drop richer gems
                gem.value = xp;
            }
            if self.rng.random_range(0.0..1.0) < COIN_DROP_CHANCE {
                self.store
                    .spawn_pickup(PickupKind::Coin, at + Vec2::new(10.0, -6.0));
            }
            self.push_event(GameEvent::EnemyKilled { id, xp });
            self.push_sound(SoundCue::EnemyDown);
        }
    }

    fn handle_pending_level_ups(&mut self) {
        if self.progression.pending_level_ups == 0 {
            return;
        }
        self.offer_choices();
        if self.pending_choices.is_empty() {
            // Fully built out: nothing to offer, the run keeps going
            self.progression.pending_level_ups = 0;
            return;
        }
        self.phase = GamePhase::LevelUp;
        self.push_event(GameEvent::LevelReached(self.progression.level));
        self.push_sound(SoundCue::LevelUp);
    }
}

/// Weighted roll over the enemy roster
fn roll_enemy_kind<R: Rng>(rng: &mut R) -> EnemyKind {
    const ROSTER: [EnemyKind; 5] = [
        EnemyKind::Walker,
        EnemyKind::Brute,
        EnemyKind::Drone,
        EnemyKind::Wisp,
        EnemyKind::Hopper,
    ];
    let total: f32 = ROSTER.iter().map(|k| k.spawn_weight()).sum();
    let roll = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for kind in ROSTER {
        cumulative += kind.spawn_weight();
        if roll < cumulative {
            return kind;
        }
    }
    EnemyKind::Walker
}
