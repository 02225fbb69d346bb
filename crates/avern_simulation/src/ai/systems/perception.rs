//! Перцепция: коллайдеры тела и зрения, пересобранные из live Transform

use bevy::prelude::*;

use crate::ai::animation::{AnimationClip, AnimationPlayback};
use crate::ai::components::{Behavior, Enemy};
use crate::ai::events::{AlertCue, CapsuleCollide, HasCollider};
use crate::collision::check_capsule_collision;
use crate::components::{BodyCollider, Player, VisionCollider};
use crate::navigation::PathFollower;

/// Смещение по Y, с которым внешние системы рисуют/используют коллайдер врага
pub const COLLIDER_OFFSET_Y: f32 = 2.0;

/// Система: коллизии тела с игроком, публикация коллайдера, aggro по зрению
///
/// Мёртвые враги коллайдеров не имеют.
pub fn update_colliders_and_vision(
    players: Query<(&Transform, &BodyCollider), (With<Player>, Without<Enemy>)>,
    mut enemies: Query<
        (
            Entity,
            &Enemy,
            &Transform,
            &BodyCollider,
            Option<&VisionCollider>,
            &mut Behavior,
            &mut PathFollower,
            &mut AnimationPlayback,
        ),
        Without<Player>,
    >,
    mut collisions: EventWriter<CapsuleCollide>,
    mut colliders: EventWriter<HasCollider>,
    mut alerts: EventWriter<AlertCue>,
) {
    let player_body = players
        .single()
        .ok()
        .map(|(transform, body)| body.0.to_world(transform));

    for (entity, enemy, transform, body, vision, mut behavior, mut follower, mut playback) in enemies.iter_mut() {
        if behavior.is_dead() {
            continue;
        }

        let capsule = body.0.to_world(transform);
        if let Some(player_body) = player_body.as_ref() {
            let collision = check_capsule_collision(player_body, &capsule);
            if collision.is_colliding {
                collisions.write(CapsuleCollide {
                    source: entity,
                    collision,
                    capsule,
                });
            }
        }
        colliders.write(HasCollider {
            source: entity,
            collider: capsule,
            offset_y: COLLIDER_OFFSET_Y,
        });

        let (Some(vision), Some(player_body)) = (vision, player_body.as_ref()) else {
            continue;
        };
        if !behavior.is_unaware() {
            continue;
        }
        let sight = vision.0.to_world(transform);
        if !check_capsule_collision(player_body, &sight).is_colliding {
            continue;
        }

        if *behavior == Behavior::Idle {
            *playback = AnimationPlayback::looped(AnimationClip::Walk);
        }
        crate::log(&format!("👁️ {:?} spotted the player: {} → pursue", entity, behavior.as_str()));
        *behavior = Behavior::Pursue;
        follower.clear();
        alerts.write(AlertCue {
            enemy: entity,
            kind: enemy.kind,
        });
    }
}
