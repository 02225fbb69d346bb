//! Спавн врагов и игрока в headless World

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::animation::{AnimationClip, AnimationPlayback};
use super::components::{ActiveEnemies, Behavior, DetectionTriangle, Enemy, PatrolRoute, SpawnState};
use super::profile::{EnemyKind, EnemyProfiles};
use crate::components::{BodyCollider, Health, Player, VisionCollider};

/// Точка спавна врага (из сцены уровня)
///
/// Непустой `patrol_points`: враг стартует в первой точке и патрулирует,
/// иначе стоит в `position` в Idle. Reset stage всегда возвращает в `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub position: Vec3,
    /// Поворот вокруг Y (радианы)
    #[serde(default)]
    pub yaw: f32,
    pub kind: EnemyKind,
    #[serde(default)]
    pub patrol_points: Vec<Vec3>,
}

impl SpawnPoint {
    pub fn idle(kind: EnemyKind, position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            yaw,
            kind,
            patrol_points: Vec::new(),
        }
    }

    pub fn patrol(kind: EnemyKind, points: Vec<Vec3>) -> Self {
        Self {
            position: points.first().copied().unwrap_or(Vec3::ZERO),
            yaw: 0.0,
            kind,
            patrol_points: points,
        }
    }
}

/// Спавнит врага по профилю из `EnemyProfiles` и регистрирует в `ActiveEnemies`
pub fn spawn_enemy(world: &mut World, spawn: &SpawnPoint) -> Entity {
    let profile = world
        .get_resource_or_insert_with(EnemyProfiles::default)
        .get(spawn.kind)
        .clone();

    let (position, starting_behavior) = match spawn.patrol_points.first() {
        Some(first) => (*first, Behavior::Patrol),
        None => (spawn.position, Behavior::Idle),
    };
    let rotation = Quat::from_rotation_y(spawn.yaw);
    let playback = match starting_behavior {
        Behavior::Patrol => AnimationPlayback::looped(AnimationClip::Walk),
        _ => AnimationPlayback::looped(AnimationClip::Idle),
    };

    let mut entity = world.spawn((
        Enemy { kind: spawn.kind },
        Transform::from_translation(position).with_rotation(rotation),
        starting_behavior,
        Health::new(profile.health),
        playback,
        DetectionTriangle::new(profile.detection_width, profile.action_range),
        BodyCollider(profile.body),
        VisionCollider(profile.vision),
        SpawnState {
            position: spawn.position,
            rotation,
            starting_behavior,
        },
    ));
    if !spawn.patrol_points.is_empty() {
        entity.insert(PatrolRoute::new(spawn.patrol_points.clone()));
    }
    let entity = entity.insert(profile).id();

    world
        .get_resource_or_insert_with(ActiveEnemies::default)
        .add(entity);

    crate::log(&format!(
        "Spawned {} enemy {:?} at {:?} ({})",
        spawn.kind.as_str(),
        entity,
        position,
        starting_behavior.as_str()
    ));
    entity
}

/// Спавнит игрока (цель для врагов)
pub fn spawn_player(world: &mut World, position: Vec3) -> Entity {
    world.spawn((Player, Transform::from_translation(position))).id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::profile::EnemyProfile;

    #[test]
    fn test_patrol_spawn_starts_at_first_point() {
        let mut world = World::new();
        let points = vec![Vec3::new(2.0, 0.0, 2.0), Vec3::new(8.0, 0.0, 2.0)];
        let entity = spawn_enemy(&mut world, &SpawnPoint::patrol(EnemyKind::Sword, points.clone()));

        let transform = world.get::<Transform>(entity).copied();
        assert_eq!(transform.map(|t| t.translation), Some(points[0]));
        assert_eq!(world.get::<Behavior>(entity), Some(&Behavior::Patrol));
        assert_eq!(world.get::<PatrolRoute>(entity).map(|r| r.points.len()), Some(2));
        assert_eq!(world.get::<AnimationPlayback>(entity).map(|p| p.clip), Some(AnimationClip::Walk));
        assert!(world.resource::<ActiveEnemies>().contains(entity));
    }

    #[test]
    fn test_patrol_spawn_remembers_marker_position() {
        let mut world = World::new();
        let marker = Vec3::new(-3.0, 0.0, 5.0);
        let spawn = SpawnPoint {
            position: marker,
            yaw: 0.0,
            kind: EnemyKind::Sword,
            patrol_points: vec![Vec3::new(2.0, 0.0, 2.0), Vec3::new(8.0, 0.0, 2.0)],
        };
        let entity = spawn_enemy(&mut world, &spawn);

        assert_eq!(
            world.get::<Transform>(entity).map(|t| t.translation),
            Some(Vec3::new(2.0, 0.0, 2.0))
        );
        assert_eq!(world.get::<SpawnState>(entity).map(|s| s.position), Some(marker));
    }

    #[test]
    fn test_idle_spawn_uses_profile() {
        let mut world = World::new();
        let entity = spawn_enemy(
            &mut world,
            &SpawnPoint::idle(EnemyKind::Bow, Vec3::new(1.0, 0.0, 1.0), 0.5),
        );

        assert_eq!(world.get::<Behavior>(entity), Some(&Behavior::Idle));
        assert_eq!(world.get::<Health>(entity), Some(&Health::new(90)));
        assert_eq!(world.get::<EnemyProfile>(entity).map(|p| p.kind), Some(EnemyKind::Bow));
        assert!(world.get::<PatrolRoute>(entity).is_none());

        let spawn = world.get::<SpawnState>(entity).copied();
        assert_eq!(spawn.map(|s| s.position), Some(Vec3::new(1.0, 0.0, 1.0)));
        assert_eq!(spawn.map(|s| s.rotation), Some(Quat::from_rotation_y(0.5)));
    }
}
