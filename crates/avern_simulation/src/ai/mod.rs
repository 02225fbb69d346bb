//! Enemy AI
//!
//! Машина поведения врагов (idle / patrol / pursue / attack / dead),
//! перцепция через капсулы, жизненный цикл смерти и reset stage.
//! Всё общение с внешним миром (анимация, звук, UI, combat) через events.

use bevy::prelude::*;

pub mod animation;
pub mod components;
pub mod events;
pub mod profile;
pub mod spawn;
pub mod systems;

pub use animation::{advance_animations, AnimationClip, AnimationPlayback, ANIMATION_SAMPLE_RATE};
pub use components::{
    world_unlocked, ActiveEnemies, Behavior, DetectionTriangle, Enemy, PatrolRoute, PendingRemoval,
    RemovedFromScene, SpawnState, Targetable, WorldUpdateLock,
};
pub use events::*;
pub use profile::{AttackEffect, EnemyKind, EnemyProfile, EnemyProfiles, ProfileOverride};
pub use spawn::{spawn_enemy, spawn_player, SpawnPoint};

/// Enemy AI Plugin
///
/// Системы в FixedUpdate, строго последовательно:
/// 1. входящие сигналы (работают и при `WorldUpdateLock`)
/// 2. behavior tick → animation clock → конец клипов → удаление → перцепция
///    (только когда мир не заблокирован)
pub struct EnemyAiPlugin;

impl Plugin for EnemyAiPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<MonsterAttack>()
            .add_event::<LaunchProjectile>()
            .add_event::<CapsuleCollide>()
            .add_event::<HasCollider>()
            .add_event::<ClearTarget>()
            .add_event::<AlertCue>()
            .add_event::<HitReaction>()
            .add_event::<PickupDropped>()
            .add_event::<ExperienceGranted>()
            .add_event::<AnimationFinished>()
            .add_event::<ReceiveDirectAttack>()
            .add_event::<ResetStage>()
            .add_event::<SetTarget>()
            .init_resource::<ActiveEnemies>()
            .init_resource::<WorldUpdateLock>()
            .init_resource::<EnemyProfiles>()
            .add_systems(
                FixedUpdate,
                (
                    (
                        systems::handle_set_target,
                        systems::handle_direct_attacks,
                        systems::handle_reset_stage,
                    )
                        .chain(),
                    (
                        systems::enemy_behavior_tick,
                        advance_animations,
                        systems::handle_animation_finished,
                        systems::tick_pending_removals,
                        systems::update_colliders_and_vision,
                    )
                        .chain()
                        .run_if(world_unlocked),
                )
                    .chain(),
            );
    }
}
