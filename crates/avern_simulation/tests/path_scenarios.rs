//! End-to-end сценарии сглаживания пути на `PolyMesh`
//!
//! Проверяем:
//! - прямой коридор: число точек, монотонность, точный конец
//! - off-mesh connection: дубль точки входа + точка выхода с высотой посадки
//! - длинный извилистый коридор: путь режется на max_smooth_points

use approx::assert_relative_eq;
use bevy::prelude::*;
use avern_simulation::navigation::{
    compute_smooth_path, ComputePathError, NavMeshQuery, NavQueryError, PathCompletion, PathOptions, PathPointKind,
    PolyMesh,
};

/// Serpentine из квадратов 4×4: три ряда по 5 клеток, соединённых на концах
fn serpentine_mesh() -> PolyMesh {
    let mut builder = PolyMesh::builder();
    for row in 0..3 {
        let z = row as f32 * 8.0;
        for col in 0..5 {
            let x = col as f32 * 4.0;
            builder = builder.rect(x, z, x + 4.0, z + 4.0, 0.0);
        }
    }
    // Перемычки: справа между рядами 0-1, слева между 1-2
    builder
        .rect(16.0, 4.0, 20.0, 8.0, 0.0)
        .rect(0.0, 12.0, 4.0, 16.0, 0.0)
        .build()
        .expect("serpentine mesh builds")
}

#[test]
fn test_straight_corridor() {
    let mesh = PolyMesh::builder()
        .rect(0.0, 0.0, 20.0, 10.0, 0.0)
        .build()
        .expect("mesh builds");
    let start = Vec3::new(0.0, 0.0, 5.0);
    let end = Vec3::new(20.0, 0.0, 5.0);
    let options = PathOptions::default();

    let path = compute_smooth_path(&mesh, start, end, &options).expect("path found");

    // ⌈20 / 0.5⌉ шагов ± 1 (плюс стартовая точка)
    assert!((40..=42).contains(&path.len()), "unexpected length {}", path.len());
    assert_eq!(path.completion(), PathCompletion::ReachedEnd);
    assert_eq!(path.first().map(|p| p.position), Some(start));

    let last = path.last().expect("non-empty path");
    assert_eq!(last.kind, PathPointKind::End);
    assert!(last.position.distance(end) <= options.slop);

    // Расстояние от старта строго растёт
    let distances: Vec<f32> = path.waypoints().map(|p| p.distance(start)).collect();
    assert!(distances.windows(2).all(|pair| pair[1] > pair[0]));

    // Шаг не длиннее step_size
    let points: Vec<Vec3> = path.waypoints().collect();
    assert!(points
        .windows(2)
        .all(|pair| pair[0].distance(pair[1]) <= options.step_size + 1e-4));
}

#[test]
fn test_off_mesh_connection_jump() {
    let mesh = PolyMesh::builder()
        .rect(0.0, 0.0, 10.0, 10.0, 0.0)
        .rect(20.0, 0.0, 30.0, 10.0, 2.0)
        .off_mesh_connection(Vec3::new(9.0, 0.0, 5.0), Vec3::new(21.0, 2.3, 5.0), 0.5, false)
        .build()
        .expect("mesh builds");
    let start = Vec3::new(1.0, 0.0, 5.0);
    let end = Vec3::new(29.0, 2.0, 5.0);

    let path = compute_smooth_path(&mesh, start, end, &PathOptions::default()).expect("path found");
    let points = path.points();

    let entry = points
        .iter()
        .position(|p| p.kind == PathPointKind::OffMeshConnection)
        .expect("path crosses the connection");

    // Дубль точки входа, затем точка выхода на высоте полигона посадки
    assert_relative_eq!(points[entry].position.x, 9.0, epsilon = 1e-4);
    assert_eq!(points[entry + 1].position, points[entry].position);
    assert_eq!(points[entry + 1].kind, PathPointKind::OffMeshConnection);
    assert_eq!(points[entry + 2].kind, PathPointKind::OffMeshConnection);
    assert_relative_eq!(points[entry + 2].position.x, 21.0, epsilon = 1e-4);
    assert_relative_eq!(points[entry + 2].position.y, 2.0, epsilon = 1e-4);
    // Чётность после вставки дубля
    assert_eq!((entry + 2) % 2, 0);

    assert_eq!(path.completion(), PathCompletion::ReachedEnd);
    let last = path.last().expect("non-empty path");
    assert_relative_eq!(last.position.x, 29.0, epsilon = 1e-4);
    assert_relative_eq!(last.position.y, 2.0, epsilon = 1e-4);
    assert!(path.len() <= 48);
}

#[test]
fn test_winding_corridor_truncates_to_max_points() {
    let mesh = serpentine_mesh();
    let start = Vec3::new(1.0, 0.0, 2.0);
    let end = Vec3::new(1.0, 0.0, 18.0);

    for max_smooth_points in [48, 10] {
        let options = PathOptions {
            max_smooth_points,
            ..Default::default()
        };
        let path = compute_smooth_path(&mesh, start, end, &options).expect("path found");

        assert_eq!(path.len(), max_smooth_points);
        assert_eq!(path.completion(), PathCompletion::MaxPointsReached);
        assert_eq!(path.first().map(|p| p.position), Some(start));

        // Все точки на меше
        for point in path.waypoints() {
            let nearest = mesh
                .find_nearest_poly(point, Vec3::splat(0.1))
                .expect("waypoint lies on the mesh");
            assert!(nearest.point.distance(point) < 1e-3);
        }
    }
}

#[test]
fn test_snap_failures_are_typed() {
    let mesh = PolyMesh::builder()
        .rect(0.0, 0.0, 10.0, 10.0, 0.0)
        .build()
        .expect("mesh builds");
    let options = PathOptions::default();

    let far_start = compute_smooth_path(&mesh, Vec3::new(50.0, 0.0, 50.0), Vec3::new(5.0, 0.0, 5.0), &options);
    assert_eq!(far_start, Err(ComputePathError::StartSnapFailed(NavQueryError::NotFound)));

    let far_end = compute_smooth_path(&mesh, Vec3::new(5.0, 0.0, 5.0), Vec3::new(5.0, 30.0, 5.0), &options);
    assert_eq!(far_end, Err(ComputePathError::EndSnapFailed(NavQueryError::NotFound)));
}

#[test]
fn test_unreachable_end_targets_closest_point() {
    // Два несвязанных острова: коридор обрывается, цель = ближайшая точка последнего полигона
    let mesh = PolyMesh::builder()
        .rect(0.0, 0.0, 10.0, 10.0, 0.0)
        .rect(12.0, 0.0, 20.0, 10.0, 0.0)
        .build()
        .expect("mesh builds");

    let path = compute_smooth_path(
        &mesh,
        Vec3::new(2.0, 0.0, 5.0),
        Vec3::new(15.0, 0.0, 5.0),
        &PathOptions::default(),
    )
    .expect("partial corridor still yields a path");

    let last = path.last().expect("non-empty path");
    assert_eq!(path.completion(), PathCompletion::ReachedEnd);
    assert_relative_eq!(last.position.x, 10.0, epsilon = 1e-3);
    assert_relative_eq!(last.position.z, 5.0, epsilon = 1e-3);
}
