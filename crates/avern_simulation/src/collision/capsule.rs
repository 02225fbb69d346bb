//! Capsule vs capsule: ближайшие точки двух отрезков + радиусы.

use bevy::prelude::*;

/// Порог вырожденного отрезка (длина² ≈ 0 → точка)
const DEGENERATE_EPSILON: f32 = 1e-6;

/// Отрезок в world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Ближайшая точка отрезка к `point` (клампится на концы)
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let direction = self.end - self.start;
        let length_sq = direction.length_squared();
        if length_sq <= DEGENERATE_EPSILON {
            return self.start;
        }
        let t = ((point - self.start).dot(direction) / length_sq).clamp(0.0, 1.0);
        self.start + direction * t
    }
}

/// Capsule collider в world space (swept sphere: отрезок + радиус)
///
/// Пересобирается каждый тик из live transform: не кэшировать между кадрами.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct Capsule {
    pub segment: Segment,
    pub radius: f32,
}

impl Capsule {
    pub fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
        Self {
            segment: Segment::new(start, end),
            radius,
        }
    }
}

/// Результат `check_capsule_collision`
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct CapsuleCollision {
    pub is_colliding: bool,
    /// Ближайшая точка на оси первой капсулы
    pub closest_point_1: Vec3,
    /// Ближайшая точка на оси второй капсулы
    pub closest_point_2: Vec3,
}

impl CapsuleCollision {
    /// Расстояние между осями капсул
    pub fn axis_distance(&self) -> f32 {
        self.closest_point_1.distance(self.closest_point_2)
    }

    /// Направление выталкивания первой капсулы от второй (zero если оси пересекаются)
    pub fn separation_direction(&self) -> Vec3 {
        (self.closest_point_1 - self.closest_point_2).normalize_or_zero()
    }
}

/// Проверка пересечения двух капсул
///
/// Сталкиваются когда расстояние между ближайшими точками осей меньше суммы радиусов.
/// Чистая функция: используется и для vision (vision capsule vs body), и для body vs body.
pub fn check_capsule_collision(a: &Capsule, b: &Capsule) -> CapsuleCollision {
    let (closest_point_1, closest_point_2) = closest_points_between_segments(&a.segment, &b.segment);
    let radius_sum = a.radius + b.radius;
    let distance_sq = closest_point_1.distance_squared(closest_point_2);

    CapsuleCollision {
        is_colliding: distance_sq < radius_sum * radius_sum,
        closest_point_1,
        closest_point_2,
    }
}

/// Ближайшие точки между двумя отрезками (Ericson, RTCD 5.1.9)
///
/// Обе точки лежат на своих отрезках (параметры клампятся в [0, 1]).
/// Вырожденные отрезки (длина ≈ 0) обрабатываются как точки.
pub fn closest_points_between_segments(first: &Segment, second: &Segment) -> (Vec3, Vec3) {
    let d1 = first.end - first.start;
    let d2 = second.end - second.start;
    let r = first.start - second.start;

    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let (s, t) = if a <= DEGENERATE_EPSILON && e <= DEGENERATE_EPSILON {
        (0.0, 0.0)
    } else if a <= DEGENERATE_EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= DEGENERATE_EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;

            // Параллельные отрезки: берём произвольную s (0), t досчитываем
            let mut s = if denom > DEGENERATE_EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;

            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (first.start + d1 * s, second.start + d2 * t)
}
