//! 2.5D геометрия навмеша: всё в плоскости XZ, высота (Y) интерполируется.

use bevy::prelude::*;

/// Порог совпадения точек (Detour: 1/16384)
pub const POINT_EQUAL_THRESHOLD_SQ: f32 = (1.0 / 16384.0) * (1.0 / 16384.0);

const EDGE_EPSILON: f32 = 1e-4;

/// Удвоенная знаковая площадь треугольника в XZ
///
/// Знак показывает, с какой стороны луча a→b лежит c.
#[inline]
pub fn tri_area_2d(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let abx = b.x - a.x;
    let abz = b.z - a.z;
    let acx = c.x - a.x;
    let acz = c.z - a.z;
    acx * abz - abx * acz
}

#[inline]
pub fn points_equal(a: Vec3, b: Vec3) -> bool {
    a.distance_squared(b) < POINT_EQUAL_THRESHOLD_SQ
}

/// Знаковая площадь полигона в XZ (> 0 → обход против часовой в координатах (x, z))
pub fn signed_area_2d(vertices: &[Vec3]) -> f32 {
    let mut area = 0.0;
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        area += a.x * b.z - b.x * a.z;
    }
    area * 0.5
}

/// Точка внутри выпуклого CCW полигона (границы включительно)
pub fn point_in_polygon_2d(point: Vec3, vertices: &[Vec3]) -> bool {
    (0..vertices.len()).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let cross = (b.x - a.x) * (point.z - a.z) - (b.z - a.z) * (point.x - a.x);
        cross >= -EDGE_EPSILON
    })
}

/// Квадрат XZ-расстояния от точки до отрезка + параметр ближайшей точки
pub fn distance_point_segment_sq_2d(point: Vec3, a: Vec3, b: Vec3) -> (f32, f32) {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    let length_sq = dx * dx + dz * dz;
    let mut t = if length_sq > 0.0 {
        (dx * (point.x - a.x) + dz * (point.z - a.z)) / length_sq
    } else {
        0.0
    };
    t = t.clamp(0.0, 1.0);
    let ex = a.x + t * dx - point.x;
    let ez = a.z + t * dz - point.z;
    (ex * ex + ez * ez, t)
}

/// Высота точки над треугольником (барицентрические координаты в XZ)
pub fn triangle_height(a: Vec3, b: Vec3, c: Vec3, point: Vec3) -> Option<f32> {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = point - a;

    let dot00 = v0.x * v0.x + v0.z * v0.z;
    let dot01 = v0.x * v1.x + v0.z * v1.z;
    let dot02 = v0.x * v2.x + v0.z * v2.z;
    let dot11 = v1.x * v1.x + v1.z * v1.z;
    let dot12 = v1.x * v2.x + v1.z * v2.z;

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < 1e-12 {
        return None;
    }

    let u = (dot11 * dot02 - dot01 * dot12) / denom;
    let v = (dot00 * dot12 - dot01 * dot02) / denom;

    if u >= -EDGE_EPSILON && v >= -EDGE_EPSILON && u + v <= 1.0 + EDGE_EPSILON {
        Some(a.y + v0.y * u + v1.y * v)
    } else {
        None
    }
}

/// Высота выпуклого полигона в точке (веерная триангуляция)
pub fn polygon_height(vertices: &[Vec3], point: Vec3) -> Option<f32> {
    (1..vertices.len().saturating_sub(1))
        .find_map(|i| triangle_height(vertices[0], vertices[i], vertices[i + 1], point))
}

/// Ближайшая точка на границе полигона; точка внутри (XZ) возвращается как есть
pub fn closest_point_on_polygon_boundary(vertices: &[Vec3], point: Vec3) -> Vec3 {
    if point_in_polygon_2d(point, vertices) {
        return point;
    }
    closest_point_on_edges(vertices, point)
}

/// Ближайшая точка на полигоне с высотой поверхности
pub fn closest_point_on_polygon(vertices: &[Vec3], point: Vec3) -> Vec3 {
    if point_in_polygon_2d(point, vertices) {
        if let Some(height) = polygon_height(vertices, point) {
            return Vec3::new(point.x, height, point.z);
        }
    }
    closest_point_on_edges(vertices, point)
}

fn closest_point_on_edges(vertices: &[Vec3], point: Vec3) -> Vec3 {
    let mut best = vertices[0];
    let mut best_distance = f32::MAX;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[(i + 1) % vertices.len()];
        let (distance, t) = distance_point_segment_sq_2d(point, a, b);
        if distance < best_distance {
            best_distance = distance;
            best = a.lerp(b, t);
        }
    }
    best
}
