//! Жизненный цикл: конец клипа атаки, лут после смерти, удаление со сцены

use bevy::prelude::*;
use rand::Rng;

use crate::ai::animation::{AnimationClip, AnimationPlayback};
use crate::ai::components::{Behavior, Enemy, PendingRemoval, RemovedFromScene};
use crate::ai::events::{AnimationFinished, PickupDropped};
use crate::ai::profile::EnemyProfile;
use crate::components::{Consumables, Pickup, PickupKind, Player};
use crate::DeterministicRng;

/// Система: реакция на доигранные one-shot клипы
///
/// - Attack: назад в Pursue (если не умер во время удара)
/// - Death: бросок на дроп фляги, затем отсчёт до удаления
pub fn handle_animation_finished(
    mut commands: Commands,
    mut finished: EventReader<AnimationFinished>,
    mut enemies: Query<(&EnemyProfile, &Transform, &mut Behavior, &mut AnimationPlayback), With<Enemy>>,
    players: Query<&Consumables, With<Player>>,
    mut rng: ResMut<DeterministicRng>,
    mut drops: EventWriter<PickupDropped>,
) {
    for event in finished.read() {
        let Ok((profile, transform, mut behavior, mut playback)) = enemies.get_mut(event.entity) else {
            continue;
        };

        match event.clip {
            AnimationClip::Attack => {
                if !behavior.is_attacking() {
                    continue;
                }
                *behavior = Behavior::Pursue;
                *playback = AnimationPlayback::looped(AnimationClip::Walk);
            }
            AnimationClip::Death => {
                if !behavior.is_dead() {
                    continue;
                }

                let flasks = players.single().map(|consumables| consumables.flasks).ok();
                let roll = rng.rng.gen_range(1..=profile.loot_chance_denominator.max(1));
                if roll == 1 && flasks.is_some_and(|flasks| flasks < profile.flask_cap) {
                    let position = transform.translation;
                    let pickup = commands
                        .spawn((
                            Pickup {
                                kind: PickupKind::HealingFlask,
                                dropped_by: event.entity,
                            },
                            Transform::from_translation(position),
                        ))
                        .id();
                    drops.write(PickupDropped { pickup, position });
                    crate::log(&format!("🧪 {:?} dropped a healing flask at {:?}", event.entity, position));
                }

                commands.entity(event.entity).insert(PendingRemoval {
                    remaining: profile.removal_delay,
                });
            }
            AnimationClip::Idle | AnimationClip::Walk => {}
        }
    }
}

/// Система: отсчёт задержки и пометка "убран со сцены"
pub fn tick_pending_removals(
    time: Res<Time>,
    mut commands: Commands,
    mut pending: Query<(Entity, &Behavior, &mut PendingRemoval)>,
) {
    let delta = time.delta_secs();
    for (entity, behavior, mut removal) in pending.iter_mut() {
        if !behavior.is_dead() {
            continue;
        }
        removal.remaining -= delta;
        if removal.remaining <= 0.0 {
            commands
                .entity(entity)
                .remove::<PendingRemoval>()
                .insert(RemovedFromScene);
            crate::log(&format!("{:?} removed from scene", entity));
        }
    }
}
