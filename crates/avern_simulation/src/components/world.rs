//! Предметы на карте

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum PickupKind {
    HealingFlask,
}

/// Предмет, выпавший из врага (подбирается внешней системой инвентаря)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
#[require(Transform)]
pub struct Pickup {
    pub kind: PickupKind,
    /// Кто уронил
    pub dropped_by: Entity,
}
