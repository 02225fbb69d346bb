//! Local-space капсулы: пересобираются в world space из live Transform каждый тик.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::Capsule;

/// Капсула в локальных координатах entity
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct LocalCapsule {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl LocalCapsule {
    pub const fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
        Self { start, end, radius }
    }

    /// Капсула в world space для текущего transform
    pub fn to_world(&self, transform: &Transform) -> Capsule {
        Capsule::new(
            transform.transform_point(self.start),
            transform.transform_point(self.end),
            self.radius,
        )
    }
}

/// Капсула тела (столкновения, цель для чужого зрения)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct BodyCollider(pub LocalCapsule);

impl Default for BodyCollider {
    fn default() -> Self {
        Self(LocalCapsule::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 2.0, 0.0), 0.5))
    }
}

/// Капсула зрения (вытянута вперёд по local +Z)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct VisionCollider(pub LocalCapsule);
