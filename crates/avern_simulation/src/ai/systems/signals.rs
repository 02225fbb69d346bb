//! Входящие сигналы: выбор цели, прямой урон, reset stage

use bevy::prelude::*;

use crate::ai::animation::{AnimationClip, AnimationPlayback};
use crate::ai::components::{
    ActiveEnemies, Behavior, Enemy, PatrolRoute, PendingRemoval, RemovedFromScene, SpawnState, Targetable,
};
use crate::ai::events::{AlertCue, ClearTarget, ExperienceGranted, HitReaction, ReceiveDirectAttack, ResetStage, SetTarget};
use crate::ai::profile::EnemyProfile;
use crate::components::{Experience, Health, Player};
use crate::navigation::PathFollower;

/// Система: `SetTarget` выделяет одного врага и снимает выделение с остальных
pub fn handle_set_target(mut events: EventReader<SetTarget>, mut enemies: Query<(Entity, &mut Targetable), With<Enemy>>) {
    for event in events.read() {
        for (entity, mut targetable) in enemies.iter_mut() {
            if event.id == Some(entity) {
                targetable.targeted = true;
            } else if targetable.targeted {
                targetable.targeted = false;
            }
        }
    }
}

/// Система: прямой урон по врагу
///
/// Idle/Patrol враг сразу переходит в Pursue (старый путь выбрасывается).
/// Урон по мёртвому игнорируется. Health = 0 → смерть в этом же тике,
/// независимо от текущего поведения и кадра анимации.
pub fn handle_direct_attacks(
    mut attacks: EventReader<ReceiveDirectAttack>,
    mut enemies: Query<(
        &Enemy,
        &EnemyProfile,
        &mut Behavior,
        &mut Health,
        &mut Targetable,
        &mut PathFollower,
        &mut AnimationPlayback,
    )>,
    mut players: Query<&mut Experience, With<Player>>,
    mut roster: ResMut<ActiveEnemies>,
    mut alerts: EventWriter<AlertCue>,
    mut reactions: EventWriter<HitReaction>,
    mut cleared: EventWriter<ClearTarget>,
    mut granted: EventWriter<ExperienceGranted>,
) {
    for attack in attacks.read() {
        let Ok((enemy, profile, mut behavior, mut health, mut targetable, mut follower, mut playback)) =
            enemies.get_mut(attack.target)
        else {
            continue;
        };
        if behavior.is_dead() {
            continue;
        }

        if behavior.is_unaware() {
            if *behavior == Behavior::Idle {
                *playback = AnimationPlayback::looped(AnimationClip::Walk);
            }
            *behavior = Behavior::Pursue;
            follower.clear();
            alerts.write(AlertCue {
                enemy: attack.target,
                kind: enemy.kind,
            });
        }

        health.take_damage(attack.damage);

        if health.is_alive() {
            if !behavior.is_attacking() {
                reactions.write(HitReaction { enemy: attack.target });
            }
            continue;
        }

        // Смерть
        *behavior = Behavior::Dead;
        follower.clear();
        targetable.targeted = false;
        *playback = AnimationPlayback::once(AnimationClip::Death, profile.death_duration);
        roster.remove(attack.target);

        cleared.write(ClearTarget {
            visible: false,
            dead: true,
            id: attack.target,
        });

        if let Ok(mut experience) = players.single_mut() {
            experience.grant(profile.experience);
            granted.write(ExperienceGranted {
                enemy: attack.target,
                amount: profile.experience,
            });
        }

        crate::log(&format!(
            "💀 {} enemy {:?} died (+{} xp)",
            enemy.kind.as_str(),
            attack.target,
            profile.experience
        ));
    }
}

/// Система: `ResetStage` возвращает всех врагов в spawn state
///
/// Мёртвые возвращаются на сцену и в ростер.
pub fn handle_reset_stage(
    mut commands: Commands,
    mut resets: EventReader<ResetStage>,
    mut enemies: Query<
        (
            Entity,
            &SpawnState,
            &mut Behavior,
            &mut Health,
            &mut Transform,
            &mut Targetable,
            &mut PathFollower,
            &mut AnimationPlayback,
            Option<&mut PatrolRoute>,
        ),
        With<Enemy>,
    >,
    mut roster: ResMut<ActiveEnemies>,
    mut cleared: EventWriter<ClearTarget>,
) {
    if resets.is_empty() {
        return;
    }
    resets.clear();

    let mut revived = 0;
    for (entity, spawn, mut behavior, mut health, mut transform, mut targetable, mut follower, mut playback, route) in
        enemies.iter_mut()
    {
        if behavior.is_dead() {
            revived += 1;
            commands.entity(entity).remove::<(PendingRemoval, RemovedFromScene)>();
        }
        roster.add(entity);

        targetable.targeted = false;
        health.restore();
        *behavior = spawn.starting_behavior;
        transform.translation = spawn.position;
        transform.rotation = spawn.rotation;
        follower.clear();
        if let Some(mut route) = route {
            route.reset();
        }

        let clip = match spawn.starting_behavior {
            Behavior::Patrol | Behavior::Pursue => AnimationClip::Walk,
            _ => AnimationClip::Idle,
        };
        *playback = AnimationPlayback::looped(clip);

        cleared.write(ClearTarget {
            visible: false,
            dead: false,
            id: entity,
        });
    }

    crate::log_info(&format!(
        "🔄 Stage reset: {} enemies active ({} revived)",
        roster.len(),
        revived
    ));
}
