//! AI Systems
//!
//! Порядок в FixedUpdate (см. `EnemyAiPlugin`):
//! 1. signals: set_target → direct attacks → reset stage
//! 2. behavior: patrol / pursue / attack
//! 3. animation clock + реакция на доигранные клипы
//! 4. lifecycle: отложенное удаление мёртвых
//! 5. perception: коллайдеры тела и зрения

use bevy::prelude::*;

use crate::navigation::SurfaceProjector;

pub mod behavior;
pub mod lifecycle;
pub mod perception;
pub mod signals;

pub use behavior::enemy_behavior_tick;
pub use lifecycle::{handle_animation_finished, tick_pending_removals};
pub use perception::update_colliders_and_vision;
pub use signals::{handle_direct_attacks, handle_reset_stage, handle_set_target};

/// Поворот к точке вокруг Y (local +Z смотрит на точку), доля `lerp` за тик
pub fn face_towards(transform: &mut Transform, point: Vec3, lerp: f32) {
    let dx = point.x - transform.translation.x;
    let dz = point.z - transform.translation.z;
    if dx * dx + dz * dz <= f32::EPSILON {
        return;
    }
    let target = Quat::from_rotation_y(dx.atan2(dz));
    transform.rotation = transform.rotation.slerp(target, lerp.clamp(0.0, 1.0));
}

/// Шаг к waypoint'у
///
/// Возвращает false, если waypoint ближе `min_progress_sq` (пора брать следующий).
/// После шага позиция проецируется на walkable поверхность.
pub fn step_towards(
    transform: &mut Transform,
    waypoint: Vec3,
    speed: f32,
    delta: f32,
    min_progress_sq: f32,
    surface: Option<&dyn SurfaceProjector>,
) -> bool {
    let offset = waypoint - transform.translation;
    if offset.length_squared() <= min_progress_sq {
        return false;
    }

    transform.translation += offset.normalize() * speed * delta;
    if let Some(projected) = surface.and_then(|surface| surface.closest_point(transform.translation)) {
        transform.translation = projected;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    struct FlatFloor;

    impl SurfaceProjector for FlatFloor {
        fn closest_point(&self, position: Vec3) -> Option<Vec3> {
            Some(Vec3::new(position.x, 0.0, position.z))
        }
    }

    #[test]
    fn test_face_towards_full_lerp() {
        let mut transform = Transform::default();
        face_towards(&mut transform, Vec3::new(5.0, 0.0, 0.0), 1.0);

        let forward = transform.rotation * Vec3::Z;
        assert_relative_eq!(forward.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(forward.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(
            transform.rotation.angle_between(Quat::from_rotation_y(FRAC_PI_2)),
            0.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_face_towards_partial_lerp() {
        let mut transform = Transform::default();
        face_towards(&mut transform, Vec3::new(5.0, 0.0, 0.0), 0.2);

        let forward = transform.rotation * Vec3::Z;
        assert!(forward.x > 0.0 && forward.x < 1.0);
    }

    #[test]
    fn test_step_towards_moves_and_projects() {
        let mut transform = Transform::from_xyz(0.0, 0.3, 0.0);
        let moved = step_towards(&mut transform, Vec3::new(10.0, 0.0, 0.0), 8.0, 0.5, 0.1, Some(&FlatFloor));

        assert!(moved);
        assert_relative_eq!(transform.translation.x, 4.0, epsilon = 1e-2);
        assert_eq!(transform.translation.y, 0.0);
    }

    #[test]
    fn test_step_towards_reports_reached_waypoint() {
        let mut transform = Transform::from_xyz(1.0, 0.0, 1.0);
        let moved = step_towards(&mut transform, Vec3::new(1.2, 0.0, 1.1), 8.0, 0.5, 0.1, None);

        assert!(!moved);
        assert_eq!(transform.translation, Vec3::new(1.0, 0.0, 1.0));
    }
}
