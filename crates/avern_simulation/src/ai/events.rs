//! AI Events: сигналы, которые ядро отправляет и принимает
//!
//! Отправляет: атаки, коллизии, смерть/опыт/лут, аудио/анимационные cue.
//! Принимает: урон, reset stage, смена цели (от combat / stage manager / UI).

use bevy::prelude::*;

use super::animation::AnimationClip;
use super::profile::EnemyKind;
use crate::collision::{Capsule, CapsuleCollision};

// ============================================================================
// Emitted
// ============================================================================

/// Удар ближнего боя на crucial frame (урон + доля отбрасывания)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct MonsterAttack {
    pub attacker: Entity,
    pub damage: u32,
    pub percentage: f32,
}

/// Выстрел в позицию цели на crucial frame
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct LaunchProjectile {
    pub attacker: Entity,
    pub destination: Vec3,
    pub radius: f32,
    pub speed: f32,
}

/// Тело цели пересекло тело врага (выталкивание делает resolver цели)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct CapsuleCollide {
    pub source: Entity,
    pub collision: CapsuleCollision,
    pub capsule: Capsule,
}

/// World-space коллайдер врага на этот тик
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct HasCollider {
    pub source: Entity,
    pub collider: Capsule,
    pub offset_y: f32,
}

/// Враг больше не цель (смерть или reset stage)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearTarget {
    pub visible: bool,
    pub dead: bool,
    pub id: Entity,
}

/// Враг заметил цель (звук тревоги зависит от типа)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertCue {
    pub enemy: Entity,
    pub kind: EnemyKind,
}

/// Сильная реакция на удар (не во время атаки)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitReaction {
    pub enemy: Entity,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PickupDropped {
    pub pickup: Entity,
    pub position: Vec3,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceGranted {
    pub enemy: Entity,
    pub amount: u32,
}

/// One-shot клип доигран (ровно один раз на проигрывание)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFinished {
    pub entity: Entity,
    pub clip: AnimationClip,
}

// ============================================================================
// Consumed
// ============================================================================

/// Прямой урон по врагу
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveDirectAttack {
    pub target: Entity,
    pub damage: u32,
}

/// Перезапуск уровня: все враги возвращаются в spawn state
#[derive(Event, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetStage;

/// Игрок выбрал цель (None = снял выделение)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetTarget {
    pub id: Option<Entity>,
}

// ============================================================================
// Rotation
// ============================================================================

fn rotate<E: Event>(world: &mut World) {
    if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
        events.update();
    }
}

/// Ротация двойных буферов всех событий ядра
///
/// Вызывается внешним frame clock после каждого тика: событие живёт
/// тик записи и следующий, потом выбрасывается.
pub fn rotate_enemy_events(world: &mut World) {
    rotate::<MonsterAttack>(world);
    rotate::<LaunchProjectile>(world);
    rotate::<CapsuleCollide>(world);
    rotate::<HasCollider>(world);
    rotate::<ClearTarget>(world);
    rotate::<AlertCue>(world);
    rotate::<HitReaction>(world);
    rotate::<PickupDropped>(world);
    rotate::<ExperienceGranted>(world);
    rotate::<AnimationFinished>(world);
    rotate::<ReceiveDirectAttack>(world);
    rotate::<ResetStage>(world);
    rotate::<SetTarget>(world);
}
