//! Behavior tick: patrol / pursue / attack
//!
//! Idle стоит на месте (выход только через перцепцию или урон), Dead ничего не делает.

use bevy::prelude::*;

use super::{face_towards, step_towards};
use crate::ai::animation::{AnimationClip, AnimationPlayback};
use crate::ai::components::{Behavior, DetectionTriangle, Enemy, PatrolRoute};
use crate::ai::events::{LaunchProjectile, MonsterAttack};
use crate::ai::profile::{AttackEffect, EnemyProfile};
use crate::components::{Health, Player};
use crate::navigation::{
    compute_smooth_path, NavMesh, NavMeshQuery, NavigationConfig, PathFollower, PatrolPathing, SurfaceProjector,
    WalkableSurface,
};

/// Цель, за которой следят враги (позиция + жива ли)
#[derive(Debug, Clone, Copy)]
struct TrackedTarget {
    position: Vec3,
    alive: bool,
}

/// Система: один тик поведения всех врагов
pub fn enemy_behavior_tick(
    time: Res<Time>,
    config: Res<NavigationConfig>,
    nav_mesh: Option<Res<NavMesh>>,
    surface: Option<Res<WalkableSurface>>,
    players: Query<(&Transform, &Health), (With<Player>, Without<Enemy>)>,
    mut enemies: Query<
        (
            Entity,
            &EnemyProfile,
            &DetectionTriangle,
            &mut Behavior,
            &mut Transform,
            &mut PathFollower,
            &mut AnimationPlayback,
            Option<&mut PatrolRoute>,
        ),
        (With<Enemy>, Without<Player>),
    >,
    mut melee: EventWriter<MonsterAttack>,
    mut projectiles: EventWriter<LaunchProjectile>,
) {
    let delta = time.delta_secs();
    let target = players.single().ok().map(|(transform, health)| TrackedTarget {
        position: transform.translation,
        alive: health.is_alive(),
    });
    let query = nav_mesh.as_deref().map(NavMesh::query);
    let projector = surface.as_deref().map(WalkableSurface::projector);

    for (entity, profile, triangle, mut behavior, mut transform, mut follower, mut playback, route) in
        enemies.iter_mut()
    {
        let current = *behavior;
        match current {
            Behavior::Idle | Behavior::Dead => {}
            Behavior::Patrol => {
                let Some(mut route) = route else {
                    continue;
                };
                patrol_step(
                    entity,
                    profile,
                    &config,
                    query,
                    projector,
                    delta,
                    &mut transform,
                    &mut follower,
                    &mut route,
                );
            }
            Behavior::Pursue => {
                let Some(target) = target else {
                    continue;
                };
                let in_reach = triangle.contains(&transform, target.position)
                    && transform.translation.distance(target.position) < profile.action_range;
                if in_reach {
                    *behavior = Behavior::attack();
                    follower.clear();
                    *playback = AnimationPlayback::once(AnimationClip::Attack, profile.attack_duration);
                    crate::log(&format!("⚔️ {:?} Pursue → Attack", entity));
                    continue;
                }
                pursue_step(
                    entity,
                    profile,
                    &config,
                    query,
                    projector,
                    delta,
                    target.position,
                    &mut transform,
                    &mut follower,
                );
            }
            Behavior::Attack { crucial_frame_sent } => {
                let Some(target) = target else {
                    continue;
                };
                if crucial_frame_sent {
                    continue;
                }
                face_towards(&mut transform, target.position, profile.facing_lerp);

                if playback.clip != AnimationClip::Attack || playback.frame() < profile.crucial_frame {
                    continue;
                }
                *behavior = Behavior::Attack {
                    crucial_frame_sent: true,
                };
                if !target.alive || !triangle.contains(&transform, target.position) {
                    continue;
                }

                match profile.attack {
                    AttackEffect::Melee { damage, percentage } => {
                        melee.write(MonsterAttack {
                            attacker: entity,
                            damage,
                            percentage,
                        });
                    }
                    AttackEffect::Projectile { radius, speed } => {
                        projectiles.write(LaunchProjectile {
                            attacker: entity,
                            destination: target.position,
                            radius,
                            speed,
                        });
                    }
                }
            }
        }
    }
}

/// Pursue: путь к цели (с перепланированием по политике) и шаг по нему
fn pursue_step(
    entity: Entity,
    profile: &EnemyProfile,
    config: &NavigationConfig,
    query: Option<&dyn NavMeshQuery>,
    projector: Option<&dyn SurfaceProjector>,
    delta: f32,
    target: Vec3,
    transform: &mut Transform,
    follower: &mut PathFollower,
) {
    let Some(query) = query else {
        return;
    };
    // Цель может стоять чуть вне меша: привязываем с увеличенным box'ом
    let goal = match query.find_nearest_poly(target, profile.target_snap_extents) {
        Ok(nearest) => nearest.point,
        Err(_) => {
            follower.clear();
            return;
        }
    };

    follower.tick();
    if follower.needs_replan(&config.replan, goal) {
        plan_path(entity, query, config, transform.translation, goal, follower);
    }
    follow_path(profile, profile.pursue_speed, projector, delta, transform, follower);
}

/// Patrol: к текущей точке маршрута, смена точки по радиусу прибытия
fn patrol_step(
    entity: Entity,
    profile: &EnemyProfile,
    config: &NavigationConfig,
    query: Option<&dyn NavMeshQuery>,
    projector: Option<&dyn SurfaceProjector>,
    delta: f32,
    transform: &mut Transform,
    follower: &mut PathFollower,
    route: &mut PatrolRoute,
) {
    let Some(destination) = route.current() else {
        return;
    };
    if transform.translation.distance(destination) < profile.patrol_arrival_radius {
        route.advance();
        follower.clear();
        return;
    }

    match config.patrol_pathing {
        PatrolPathing::Direct => {
            face_towards(transform, destination, profile.facing_lerp);
            step_towards(
                transform,
                destination,
                profile.patrol_speed,
                delta,
                profile.min_progress_sq,
                projector,
            );
        }
        PatrolPathing::NavMesh => {
            let Some(query) = query else {
                return;
            };
            follower.tick();
            if follower.needs_replan(&config.replan, destination) {
                plan_path(entity, query, config, transform.translation, destination, follower);
            }
            follow_path(profile, profile.patrol_speed, projector, delta, transform, follower);
        }
    }
}

/// Новый путь в follower; неудача = пути нет, повтор на следующем тике
fn plan_path(
    entity: Entity,
    query: &dyn NavMeshQuery,
    config: &NavigationConfig,
    from: Vec3,
    goal: Vec3,
    follower: &mut PathFollower,
) {
    match compute_smooth_path(query, from, goal, &config.path) {
        Ok(path) => {
            if path.completion().is_soft_failure() {
                crate::log(&format!(
                    "{:?} partial path ({} points, {:?})",
                    entity,
                    path.len(),
                    path.completion()
                ));
            }
            follower.set_path(path, goal);
            // Первая точка = текущая позиция
            follower.advance();
        }
        Err(error) => {
            crate::log(&format!("{:?} no path this tick: {}", entity, error));
            follower.clear();
        }
    }
}

/// Шаг к текущему waypoint'у (или переход к следующему, если он достигнут)
fn follow_path(
    profile: &EnemyProfile,
    speed: f32,
    projector: Option<&dyn SurfaceProjector>,
    delta: f32,
    transform: &mut Transform,
    follower: &mut PathFollower,
) {
    let Some(waypoint) = follower.current_waypoint() else {
        return;
    };
    face_towards(transform, waypoint, profile.facing_lerp);
    if !step_towards(transform, waypoint, speed, delta, profile.min_progress_sq, projector) {
        follower.advance();
    }
}
