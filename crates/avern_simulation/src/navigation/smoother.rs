//! Path smoother: коридор полигонов → плотная последовательность шагов по поверхности
//!
//! Итерация:
//! 1. steer target: первый угол straight path (до 3 углов) дальше `slop`,
//!    либо вход в off-mesh connection;
//! 2. шаг `step_size` к нему (без перелёта, если это конец/off-mesh);
//! 3. `move_along_surface` → fixup коридора по visited → shortcut;
//! 4. высота по текущему полигону;
//! 5. конец пути / прыжок через off-mesh / обычная точка.
//!
//! Ошибки до цикла: hard (`ComputePathError`), ошибки в цикле soft:
//! возвращается всё, что успели построить.

use bevy::prelude::*;

use super::corridor::Corridor;
use super::path::{ComputePathError, PathCompletion, PathOptions, PathPoint, PathPointKind, SmoothPath};
use super::query::{NavMeshQuery, PolyRef, StraightPathFlags};

/// Сколько углов straight path запрашивается для выбора steer target
pub const MAX_STEER_POINTS: usize = 3;

/// Вертикальный допуск "дошли до точки" (конец пути / off-mesh)
const ARRIVAL_HEIGHT_TOLERANCE: f32 = 1.0;

/// Вертикальный допуск при выборе steer target (высота не важна)
const STEER_HEIGHT_TOLERANCE: f32 = 1000.0;

/// Куда рулить на текущей итерации
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteerTarget {
    pub position: Vec3,
    pub flags: StraightPathFlags,
    pub poly: PolyRef,
}

impl SteerTarget {
    pub fn is_end(&self) -> bool {
        self.flags.contains(StraightPathFlags::END)
    }

    pub fn is_off_mesh_connection(&self) -> bool {
        self.flags.contains(StraightPathFlags::OFF_MESH_CONNECTION)
    }
}

/// `a` и `b` ближе `radius` по горизонтали и ближе `height` по вертикали
///
/// Квадрат расстояния сравнивается с `radius * radius`, как `inRange` в Detour.
/// Сравнение с голым `radius` даёт радиус прибытия sqrt(slop) вместо slop.
#[inline]
pub fn in_range(a: Vec3, b: Vec3, radius: f32, height: f32) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dz = b.z - a.z;
    dx * dx + dz * dz < radius * radius && dy.abs() < height
}

/// Steer target для позиции `start`
///
/// None: straight path не построился или все углы в пределах `min_target_distance`.
pub fn get_steer_target(
    query: &dyn NavMeshQuery,
    start: Vec3,
    end: Vec3,
    min_target_distance: f32,
    corridor: &[PolyRef],
) -> Option<SteerTarget> {
    let points = query
        .find_straight_path(start, end, corridor, MAX_STEER_POINTS)
        .ok()?;

    points
        .iter()
        .find(|point| {
            point.flags.contains(StraightPathFlags::OFF_MESH_CONNECTION)
                || !in_range(point.position, start, min_target_distance, STEER_HEIGHT_TOLERANCE)
        })
        .map(|point| SteerTarget {
            position: point.position,
            flags: point.flags,
            poly: point.poly,
        })
}

/// Накопитель точек с лимитом `max_smooth_points`
struct PathBuffer {
    points: Vec<PathPoint>,
    max_points: usize,
}

impl PathBuffer {
    fn has_room(&self) -> bool {
        self.points.len() < self.max_points
    }

    fn push(&mut self, position: Vec3, kind: PathPointKind) {
        if self.has_room() {
            self.points.push(PathPoint { position, kind });
        }
    }
}

/// Строит сглаженный путь от `start` к `end`
pub fn compute_smooth_path(
    query: &dyn NavMeshQuery,
    start: Vec3,
    end: Vec3,
    options: &PathOptions,
) -> Result<SmoothPath, ComputePathError> {
    let start_poly = query
        .find_nearest_poly(start, options.half_extents)
        .map_err(ComputePathError::StartSnapFailed)?
        .poly;
    let end_poly = query
        .find_nearest_poly(end, options.half_extents)
        .map_err(ComputePathError::EndSnapFailed)?
        .poly;

    let polys = query
        .find_path(start_poly, end_poly, start, end, options.max_polygons)
        .map_err(ComputePathError::PathQueryFailed)?;
    let Some(&last_poly) = polys.last() else {
        return Err(ComputePathError::EmptyPolygonPath);
    };

    // Частичный коридор: целимся в ближайшую к end точку последнего полигона
    let target = if last_poly != end_poly {
        query
            .closest_point_on_poly(last_poly, end)
            .map_err(ComputePathError::NoClosestPointOnLastPolygon)?
    } else {
        end
    };

    let mut corridor = Corridor::new(polys, options.max_polygons);
    let mut path = PathBuffer {
        points: Vec::with_capacity(options.max_smooth_points.max(1)),
        max_points: options.max_smooth_points.max(1),
    };
    let mut iter_pos = start;
    path.push(iter_pos, PathPointKind::Start);

    let completion = loop {
        let Some(current_poly) = corridor.first() else {
            break PathCompletion::CorridorExhausted;
        };
        if !path.has_room() {
            break PathCompletion::MaxPointsReached;
        }

        let Some(steer) = get_steer_target(query, iter_pos, target, options.slop, corridor.polys()) else {
            break PathCompletion::SteerTargetLost;
        };

        let delta = steer.position - iter_pos;
        let distance = delta.length();
        // Конец пути и вход в off-mesh не перешагиваем
        let scale = if distance <= f32::EPSILON
            || ((steer.is_end() || steer.is_off_mesh_connection()) && distance < options.step_size)
        {
            1.0
        } else {
            options.step_size / distance
        };
        let move_target = iter_pos + delta * scale;

        let Ok(moved) = query.move_along_surface(current_poly, iter_pos, move_target) else {
            break PathCompletion::SurfaceMoveFailed;
        };

        corridor.fixup(&moved.visited);
        corridor.fixup_shortcuts(query);

        let mut result = moved.position;
        if let Some(poly) = corridor.first() {
            if let Ok(height) = query.get_poly_height(poly, result) {
                result.y = height;
            }
        }
        iter_pos = result;

        if steer.is_end() && in_range(iter_pos, steer.position, options.slop, ARRIVAL_HEIGHT_TOLERANCE) {
            iter_pos = target;
            path.push(iter_pos, PathPointKind::End);
            break PathCompletion::ReachedEnd;
        }

        let mut kind = PathPointKind::Mesh;
        if steer.is_off_mesh_connection()
            && in_range(iter_pos, steer.position, options.slop, ARRIVAL_HEIGHT_TOLERANCE)
        {
            let landing = corridor
                .advance_past_off_mesh(steer.poly)
                .and_then(|prev| query.get_off_mesh_connection_end_points(prev, steer.poly).ok());

            if let Some((_, exit)) = landing {
                if path.has_room() {
                    path.push(iter_pos, PathPointKind::OffMeshConnection);
                    // Дубль точки входа: прыжок не рисуется пунктиром
                    if path.points.len() % 2 == 1 {
                        path.push(iter_pos, PathPointKind::OffMeshConnection);
                    }

                    iter_pos = exit;
                    if let Some(poly) = corridor.first() {
                        if let Ok(height) = query.get_poly_height(poly, iter_pos) {
                            iter_pos.y = height;
                        }
                    }
                    kind = PathPointKind::OffMeshConnection;
                }
            }
        }

        path.push(iter_pos, kind);
    };

    Ok(SmoothPath::new(path.points, completion))
}
