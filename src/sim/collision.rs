//! Collision primitives for the rectangular field
//!
//! Two families of tests:
//! - Axis-aligned box overlap for attack volumes, bodies, and obstacles.
//!   Strict inequalities on all four comparisons: boxes touching exactly
//!   edge-to-edge do not collide.
//! - Radial proximity for orb contact and magnet activation. Non-strict:
//!   a point exactly on the radius counts as inside.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from a top-left position and a size
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Box from a center point and a size
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Rectangle overlap test. Each box's near edge must be strictly before
    /// the other's far edge on both axes.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// True when this box has fully exited `field` extended by `buffer` on
    /// every side
    pub fn outside(&self, field: &Aabb, buffer: f32) -> bool {
        self.max.x < field.min.x - buffer
            || self.min.x > field.max.x + buffer
            || self.max.y < field.min.y - buffer
            || self.min.y > field.max.y + buffer
    }
}

/// Euclidean proximity test, inclusive of the boundary
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance_squared(b) <= radius * radius
}
