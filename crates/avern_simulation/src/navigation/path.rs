//! Результат сглаживания пути: точки, причина завершения, ошибки.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::query::NavQueryError;

/// Параметры `compute_smooth_path`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    /// Half-extents box'а для привязки start/end к полигонам
    pub half_extents: Vec3,
    /// Максимум точек в сглаженном пути
    pub max_smooth_points: usize,
    /// Максимум полигонов в коридоре
    pub max_polygons: usize,
    /// Шаг продвижения за итерацию
    pub step_size: f32,
    /// Допуск близости (горизонтальный радиус)
    pub slop: f32,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            half_extents: Vec3::ONE,
            max_smooth_points: 48,
            max_polygons: 256,
            step_size: 0.5,
            slop: 0.01,
        }
    }
}

/// Hard failures до начала сглаживания
///
/// Любая из них = "пути на этот тик нет": агент стоит, повтор на следующем тике.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputePathError {
    #[error("start point is not near the navmesh: {0}")]
    StartSnapFailed(#[source] NavQueryError),

    #[error("end point is not near the navmesh: {0}")]
    EndSnapFailed(#[source] NavQueryError),

    #[error("polygon path query failed: {0}")]
    PathQueryFailed(#[source] NavQueryError),

    #[error("polygon path is empty")]
    EmptyPolygonPath,

    #[error("no closest point on the last corridor polygon: {0}")]
    NoClosestPointOnLastPolygon(#[source] NavQueryError),
}

/// Почему сглаживание остановилось (путь при этом успешный)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum PathCompletion {
    /// Дошли до конца, последняя точка: цель
    ReachedEnd,
    /// Упёрлись в `max_smooth_points`
    MaxPointsReached,
    /// Коридор опустел
    CorridorExhausted,
    /// Steer target не найден (soft failure)
    SteerTargetLost,
    /// `move_along_surface` вернул ошибку (soft failure)
    SurfaceMoveFailed,
}

impl PathCompletion {
    /// Оборван ли путь из-за ошибки запроса посреди сглаживания
    pub fn is_soft_failure(&self) -> bool {
        matches!(self, PathCompletion::SteerTargetLost | PathCompletion::SurfaceMoveFailed)
    }
}

/// Тип точки пути
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum PathPointKind {
    Start,
    Mesh,
    /// Точка прохождения off-mesh connection (вход, дубль входа, выход)
    OffMeshConnection,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PathPoint {
    pub position: Vec3,
    pub kind: PathPointKind,
}

/// Сглаженный путь
///
/// Всегда содержит хотя бы стартовую точку. Заменяется целиком при перепланировании.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothPath {
    points: Vec<PathPoint>,
    completion: PathCompletion,
}

impl SmoothPath {
    pub(crate) fn new(points: Vec<PathPoint>, completion: PathCompletion) -> Self {
        Self { points, completion }
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn completion(&self) -> PathCompletion {
        self.completion
    }

    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    /// Позиции точек по порядку (каждый вызов начинает сначала)
    pub fn waypoints(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().map(|point| point.position)
    }

    /// Позиции начиная с `cursor` (непосещённые точки)
    pub fn remaining(&self, cursor: usize) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().skip(cursor).map(|point| point.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = PathOptions::default();
        assert_eq!(options.max_smooth_points, 48);
        assert_eq!(options.max_polygons, 256);
        assert_eq!(options.step_size, 0.5);
        assert_eq!(options.slop, 0.01);
        assert_eq!(options.half_extents, Vec3::ONE);
    }

    #[test]
    fn test_waypoints_are_restartable() {
        let path = SmoothPath::new(
            vec![
                PathPoint { position: Vec3::ZERO, kind: PathPointKind::Start },
                PathPoint { position: Vec3::X, kind: PathPointKind::End },
            ],
            PathCompletion::ReachedEnd,
        );

        let first_pass: Vec<_> = path.waypoints().collect();
        let second_pass: Vec<_> = path.waypoints().collect();
        assert_eq!(first_pass, second_pass);
        assert_eq!(path.remaining(1).collect::<Vec<_>>(), vec![Vec3::X]);
        assert!(!path.completion().is_soft_failure());
    }

    #[test]
    fn test_error_chain_keeps_query_error() {
        let error = ComputePathError::StartSnapFailed(NavQueryError::NotFound);
        assert_eq!(
            error.to_string(),
            "start point is not near the navmesh: no polygon found within search extents"
        );
        assert!(std::error::Error::source(&error).is_some());
    }
}
