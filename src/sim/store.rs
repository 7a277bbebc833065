//! Typed entity storage
//!
//! One `Vec` per entity kind, ids allocated from a per-run counter. Every
//! entity belongs to exactly one collection; removal happens in the bulk
//! cull sweep at the end of each frame (off-field, inactive, dead, or
//! collected).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::entity::{Enemy, Hazard, HazardSpec, Obstacle, Pickup, PickupKind, Projectile};
use crate::consts::*;

/// Owner of all field entities for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    pub obstacles: Vec<Obstacle>,
    pub enemies: Vec<Enemy>,
    pub pickups: Vec<Pickup>,
    pub projectiles: Vec<Projectile>,
    pub hazards: Vec<Hazard>,
    next_id: u32,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_enemy(&mut self, enemy: Enemy) {
        self.enemies.push(enemy);
    }

    pub fn spawn_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn spawn_pickup(&mut self, kind: PickupKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.pickups.push(Pickup::new(id, kind, pos));
        id
    }

    /// Take ownership of a weapon-emitted projectile, assigning its id
    pub fn add_projectile(&mut self, mut projectile: Projectile) -> u32 {
        let id = self.next_entity_id();
        projectile.id = id;
        self.projectiles.push(projectile);
        id
    }

    pub fn spawn_hazard(&mut self, center_x: f32, spec: HazardSpec) -> u32 {
        let id = self.next_entity_id();
        self.hazards.push(Hazard::new(id, center_x, spec));
        id
    }

    pub fn enemy_mut(&mut self, id: u32) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn entity_count(&self) -> usize {
        self.obstacles.len()
            + self.enemies.len()
            + self.pickups.len()
            + self.projectiles.len()
            + self.hazards.len()
    }

    /// Drop everything; used on restart
    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.enemies.clear();
        self.pickups.clear();
        self.projectiles.clear();
        self.hazards.clear();
        self.next_id = 1;
    }

    /// Remove entities that are inactive, dead, or whose bounding box has
    /// fully exited the field past their kind's buffer. Pickups use a wider
    /// buffer so magnet overshoot past the player doesn't destroy them.
    pub fn cull_off_field(&mut self) {
        let field = Aabb::from_pos_size(Vec2::ZERO, Vec2::new(FIELD_WIDTH, FIELD_HEIGHT));

        self.obstacles
            .retain(|o| o.active && !o.aabb().outside(&field, CULL_BUFFER));
        self.enemies
            .retain(|e| e.alive() && !e.aabb().outside(&field, CULL_BUFFER));
        self.pickups
            .retain(|p| p.active && !p.collected && !p.aabb().outside(&field, PICKUP_CULL_BUFFER));
        self.projectiles.retain(|p| {
            p.active && !p.range_exhausted() && !p.aabb().outside(&field, CULL_BUFFER)
        });
        self.hazards
            .retain(|h| h.active && !h.aabb().outside(&field, CULL_BUFFER));
    }
}
