//! Capsule collision resolver
//!
//! Segment-vs-segment closest points + радиусы. Используется для:
//! - vision capsule врага vs body capsule игрока (aggro)
//! - body capsule vs body capsule (push-apart делает resolver игрока)

pub mod capsule;

pub use capsule::{
    check_capsule_collision, closest_points_between_segments, Capsule, CapsuleCollision, Segment,
};
