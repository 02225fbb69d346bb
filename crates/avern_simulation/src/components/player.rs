//! Player: цель, которую отслеживают враги

use bevy::prelude::*;

use super::{BodyCollider, Health};

/// Marker: отслеживаемая цель (игрок)
///
/// Враги смотрят на единственную entity с этим компонентом.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Health, Experience, Consumables, BodyCollider, Transform)]
pub struct Player;

/// Опыт игрока (начисляется за убийства)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Experience {
    pub xp: u32,
}

impl Experience {
    pub fn grant(&mut self, amount: u32) {
        self.xp = self.xp.saturating_add(amount);
    }
}

/// Расходники игрока (лечебные фляги)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Consumables {
    pub flasks: u32,
}
