//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: здоровье (Health)
//! - player: отслеживаемая цель (Player, Experience, Consumables)
//! - collider: local-space капсулы тела и зрения (BodyCollider, VisionCollider)
//! - world: предметы на карте (Pickup)

pub mod actor;
pub mod collider;
pub mod player;
pub mod world;

// Re-exports для удобного импорта
pub use actor::*;
pub use collider::*;
pub use player::*;
pub use world::*;
