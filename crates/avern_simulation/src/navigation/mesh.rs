//! PolyMesh: in-memory навмеш из выпуклых полигонов
//!
//! Reference adapter для `NavMeshQuery`: headless бинарь и тесты работают на нём,
//! production сборка подставляет Detour-backed реализацию.
//!
//! Конвенции:
//! - ground полигоны выпуклые, обход CCW в плоскости (x, z) (builder нормализует);
//! - соседство определяется общими рёбрами (совпадающие вершины);
//! - off-mesh connection: отдельный "полигон" с двумя концами.

use bevy::prelude::*;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use super::geometry::{
    closest_point_on_polygon, closest_point_on_polygon_boundary, distance_point_segment_sq_2d, point_in_polygon_2d,
    points_equal, polygon_height, signed_area_2d, tri_area_2d,
};
use super::query::{
    NavMeshQuery, NavQueryError, NearestPoly, PolyRef, StraightPathFlags, StraightPathPoint, SurfaceMove,
    SurfaceProjector,
};
use crate::collision::Segment;

/// Вершины считаются общими, если ближе этого (квадрат)
const VERTEX_WELD_DISTANCE_SQ: f32 = 1e-8;

/// A* heuristic чуть занижена (admissible)
const HEURISTIC_SCALE: f32 = 0.999;

/// Лимит полигонов в BFS `move_along_surface`
const MAX_SURFACE_VISITED: usize = 16;

/// Box поиска для `SurfaceProjector`
const SURFACE_SEARCH_EXTENTS: Vec3 = Vec3::new(4.0, 8.0, 4.0);

#[derive(Debug, Clone)]
struct Link {
    to: PolyRef,
    /// Индекс ребра (v[edge], v[edge + 1]) для ground→ground links
    edge: Option<usize>,
}

#[derive(Debug, Clone)]
struct OffMeshConnection {
    start: Vec3,
    end: Vec3,
    bidirectional: bool,
    start_poly: PolyRef,
    end_poly: PolyRef,
}

#[derive(Debug, Clone)]
enum PolyKind {
    Ground { vertices: Vec<Vec3> },
    OffMesh(OffMeshConnection),
}

#[derive(Debug, Clone)]
struct Poly {
    kind: PolyKind,
    links: Vec<Link>,
    center: Vec3,
    bounds_min: Vec3,
    bounds_max: Vec3,
}

impl Poly {
    fn ground(vertices: Vec<Vec3>) -> Self {
        let center = vertices.iter().copied().sum::<Vec3>() / vertices.len() as f32;
        let bounds_min = vertices.iter().copied().fold(Vec3::splat(f32::MAX), Vec3::min);
        let bounds_max = vertices.iter().copied().fold(Vec3::splat(f32::MIN), Vec3::max);
        Self {
            kind: PolyKind::Ground { vertices },
            links: Vec::new(),
            center,
            bounds_min,
            bounds_max,
        }
    }

    fn off_mesh(connection: OffMeshConnection) -> Self {
        Self {
            center: connection.start.lerp(connection.end, 0.5),
            bounds_min: connection.start.min(connection.end),
            bounds_max: connection.start.max(connection.end),
            kind: PolyKind::OffMesh(connection),
            links: Vec::new(),
        }
    }

    fn overlaps(&self, min: Vec3, max: Vec3) -> bool {
        self.bounds_min.cmple(max).all() && self.bounds_max.cmpge(min).all()
    }
}

/// Описание off-mesh connection до сборки (полигоны концов ещё не известны)
#[derive(Debug, Clone, Copy)]
struct OffMeshConnectionDesc {
    start: Vec3,
    end: Vec3,
    radius: f32,
    bidirectional: bool,
}

/// Builder навмеша
///
/// Ground полигоны получают `PolyRef` в порядке добавления (0, 1, ...),
/// off-mesh connections: следом за ними.
#[derive(Debug, Clone, Default)]
pub struct PolyMeshBuilder {
    polygons: Vec<Vec<Vec3>>,
    connections: Vec<OffMeshConnectionDesc>,
}

impl PolyMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygon(mut self, vertices: impl IntoIterator<Item = Vec3>) -> Self {
        self.polygons.push(vertices.into_iter().collect());
        self
    }

    /// Горизонтальный прямоугольник [min_x, max_x] × [min_z, max_z] на высоте `height`
    pub fn rect(self, min_x: f32, min_z: f32, max_x: f32, max_z: f32, height: f32) -> Self {
        self.polygon([
            Vec3::new(min_x, height, min_z),
            Vec3::new(max_x, height, min_z),
            Vec3::new(max_x, height, max_z),
            Vec3::new(min_x, height, max_z),
        ])
    }

    /// Off-mesh connection (прыжок / телепорт). Концы привязываются к ближайшим
    /// ground полигонам в пределах `radius`.
    pub fn off_mesh_connection(mut self, start: Vec3, end: Vec3, radius: f32, bidirectional: bool) -> Self {
        self.connections.push(OffMeshConnectionDesc {
            start,
            end,
            radius,
            bidirectional,
        });
        self
    }

    pub fn build(self) -> Result<PolyMesh, NavQueryError> {
        let mut polys = Vec::with_capacity(self.polygons.len() + self.connections.len());
        for mut vertices in self.polygons {
            if vertices.len() < 3 {
                return Err(NavQueryError::InvalidParam("polygon needs at least 3 vertices"));
            }
            if signed_area_2d(&vertices) < 0.0 {
                vertices.reverse();
            }
            polys.push(Poly::ground(vertices));
        }

        // Общие рёбра: у CCW соседей одно и то же ребро обходится в разные стороны
        let mut links = Vec::new();
        for (i, poly) in polys.iter().enumerate() {
            let PolyKind::Ground { vertices } = &poly.kind else {
                continue;
            };
            for (j, other) in polys.iter().enumerate() {
                let PolyKind::Ground { vertices: other_vertices } = &other.kind else {
                    continue;
                };
                if i == j {
                    continue;
                }
                for edge in 0..vertices.len() {
                    let a = vertices[edge];
                    let b = vertices[(edge + 1) % vertices.len()];
                    let shared = (0..other_vertices.len()).any(|k| {
                        let c = other_vertices[k];
                        let d = other_vertices[(k + 1) % other_vertices.len()];
                        a.distance_squared(d) < VERTEX_WELD_DISTANCE_SQ && b.distance_squared(c) < VERTEX_WELD_DISTANCE_SQ
                    });
                    if shared {
                        links.push((i, Link { to: PolyRef(j as u32), edge: Some(edge) }));
                    }
                }
            }
        }
        for (from, link) in links {
            polys[from].links.push(link);
        }

        let mut mesh = PolyMesh { polys };
        for desc in self.connections {
            let extents = Vec3::splat(desc.radius.max(f32::EPSILON));
            let start_poly = mesh.find_nearest_poly(desc.start, extents)?.poly;
            let end_poly = mesh.find_nearest_poly(desc.end, extents)?.poly;
            let connection_ref = PolyRef(mesh.polys.len() as u32);

            let mut connection = Poly::off_mesh(OffMeshConnection {
                start: desc.start,
                end: desc.end,
                bidirectional: desc.bidirectional,
                start_poly,
                end_poly,
            });
            connection.links.push(Link { to: end_poly, edge: None });
            mesh.polys[start_poly.0 as usize]
                .links
                .push(Link { to: connection_ref, edge: None });
            if desc.bidirectional {
                connection.links.push(Link { to: start_poly, edge: None });
                mesh.polys[end_poly.0 as usize]
                    .links
                    .push(Link { to: connection_ref, edge: None });
            }
            mesh.polys.push(connection);
        }

        Ok(mesh)
    }
}

/// Навмеш из выпуклых полигонов + off-mesh connections
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    polys: Vec<Poly>,
}

/// A* node в open list (min-heap по f)
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    poly: usize,
    total_cost: f32,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Обратный порядок: BinaryHeap это max-heap
        other
            .total_cost
            .partial_cmp(&self.total_cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.poly.cmp(&self.poly))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Накопитель straight path с лимитом точек
struct StraightPathBuffer {
    points: Vec<StraightPathPoint>,
    max_points: usize,
}

impl StraightPathBuffer {
    /// Совпадающая с предыдущей точка не добавляется, а обновляет её flags/poly.
    /// Возвращает false, когда буфер заполнен.
    fn append(&mut self, position: Vec3, flags: StraightPathFlags, poly: PolyRef) -> bool {
        match self.points.last_mut() {
            Some(last) if points_equal(last.position, position) => {
                last.flags = flags;
                last.poly = poly;
            }
            _ => self.points.push(StraightPathPoint { position, flags, poly }),
        }
        self.points.len() < self.max_points
    }
}

impl PolyMesh {
    pub fn builder() -> PolyMeshBuilder {
        PolyMeshBuilder::new()
    }

    pub fn polygon_count(&self) -> usize {
        self.polys.len()
    }

    pub fn is_off_mesh_connection(&self, poly: PolyRef) -> bool {
        matches!(
            self.polys.get(poly.0 as usize).map(|p| &p.kind),
            Some(PolyKind::OffMesh(_))
        )
    }

    /// Вершины ground полигона (None для off-mesh / невалидного ref)
    pub fn polygon_vertices(&self, poly: PolyRef) -> Option<&[Vec3]> {
        match &self.polys.get(poly.0 as usize)?.kind {
            PolyKind::Ground { vertices } => Some(vertices),
            PolyKind::OffMesh(_) => None,
        }
    }

    fn poly(&self, poly: PolyRef) -> Result<&Poly, NavQueryError> {
        self.polys
            .get(poly.0 as usize)
            .ok_or(NavQueryError::InvalidPolyRef(poly))
    }

    fn ground_vertices(&self, poly: PolyRef) -> Result<&[Vec3], NavQueryError> {
        match &self.poly(poly)?.kind {
            PolyKind::Ground { vertices } => Ok(vertices),
            PolyKind::OffMesh(_) => Err(NavQueryError::InvalidParam("expected a ground polygon")),
        }
    }

    fn closest_point_on_poly_boundary(&self, poly: PolyRef, position: Vec3) -> Result<Vec3, NavQueryError> {
        match &self.poly(poly)?.kind {
            PolyKind::Ground { vertices } => Ok(closest_point_on_polygon_boundary(vertices, position)),
            PolyKind::OffMesh(connection) => Ok(Segment::new(connection.start, connection.end).closest_point(position)),
        }
    }

    /// Portal между соседними ground полигонами: (left, right) по ходу движения
    fn portal_points(&self, from: PolyRef, to: PolyRef) -> Result<(Vec3, Vec3), NavQueryError> {
        let vertices = self.ground_vertices(from)?;
        let edge = self
            .poly(from)?
            .links
            .iter()
            .find(|link| link.to == to)
            .and_then(|link| link.edge)
            .ok_or(NavQueryError::InvalidParam("corridor polygons are not adjacent"))?;

        let right = vertices[edge];
        let left = vertices[(edge + 1) % vertices.len()];
        Ok((left, right))
    }

    /// Simple stupid funnel (Mononen) по цепочке ground полигонов
    ///
    /// Возвращает только промежуточные углы (без start/end) с полигоном,
    /// в который путь входит в этом углу.
    fn funnel_corners(
        &self,
        start: Vec3,
        end: Vec3,
        corridor: &[PolyRef],
    ) -> Result<Vec<(Vec3, PolyRef)>, NavQueryError> {
        let mut corners = Vec::new();
        let Some(&last_poly) = corridor.last() else {
            return Ok(corners);
        };

        let mut portals = Vec::with_capacity(corridor.len() + 1);
        portals.push((start, start));
        for pair in corridor.windows(2) {
            portals.push(self.portal_points(pair[0], pair[1])?);
        }
        portals.push((end, end));

        let poly_at = |portal: usize| corridor.get(portal).copied().unwrap_or(last_poly);

        let mut apex = start;
        let mut left = start;
        let mut right = start;
        let mut left_index = 0;
        let mut right_index = 0;

        let mut i = 1;
        while i < portals.len() {
            let (portal_left, portal_right) = portals[i];

            // Правая граница воронки
            if tri_area_2d(apex, right, portal_right) <= 0.0 {
                if points_equal(apex, right) || tri_area_2d(apex, left, portal_right) > 0.0 {
                    right = portal_right;
                    right_index = i;
                } else {
                    // Правая перехлестнула левую → левая становится углом
                    corners.push((left, poly_at(left_index)));
                    apex = left;
                    right = apex;
                    right_index = left_index;
                    i = left_index + 1;
                    continue;
                }
            }

            // Левая граница воронки
            if tri_area_2d(apex, left, portal_left) >= 0.0 {
                if points_equal(apex, left) || tri_area_2d(apex, right, portal_left) < 0.0 {
                    left = portal_left;
                    left_index = i;
                } else {
                    corners.push((right, poly_at(right_index)));
                    apex = right;
                    left = apex;
                    left_index = right_index;
                    i = right_index + 1;
                    continue;
                }
            }

            i += 1;
        }

        Ok(corners)
    }
}

impl NavMeshQuery for PolyMesh {
    fn find_nearest_poly(&self, center: Vec3, half_extents: Vec3) -> Result<NearestPoly, NavQueryError> {
        let query_min = center - half_extents;
        let query_max = center + half_extents;

        let mut nearest: Option<(f32, NearestPoly)> = None;
        for (index, poly) in self.polys.iter().enumerate() {
            let PolyKind::Ground { vertices } = &poly.kind else {
                continue;
            };
            if !poly.overlaps(query_min, query_max) {
                continue;
            }
            let point = closest_point_on_polygon(vertices, center);
            let distance = point.distance_squared(center);
            if nearest.is_none_or(|(best, _)| distance < best) {
                nearest = Some((
                    distance,
                    NearestPoly {
                        poly: PolyRef(index as u32),
                        point,
                    },
                ));
            }
        }

        nearest.map(|(_, found)| found).ok_or(NavQueryError::NotFound)
    }

    fn closest_point_on_poly(&self, poly: PolyRef, position: Vec3) -> Result<Vec3, NavQueryError> {
        match &self.poly(poly)?.kind {
            PolyKind::Ground { vertices } => Ok(closest_point_on_polygon(vertices, position)),
            PolyKind::OffMesh(connection) => Ok(Segment::new(connection.start, connection.end).closest_point(position)),
        }
    }

    fn find_path(
        &self,
        start_ref: PolyRef,
        end_ref: PolyRef,
        start: Vec3,
        end: Vec3,
        max_path: usize,
    ) -> Result<Vec<PolyRef>, NavQueryError> {
        self.poly(start_ref)?;
        self.poly(end_ref)?;
        if max_path == 0 {
            return Err(NavQueryError::InvalidParam("max_path must be positive"));
        }
        if start_ref == end_ref {
            return Ok(vec![start_ref]);
        }

        let count = self.polys.len();
        let start_index = start_ref.0 as usize;
        let end_index = end_ref.0 as usize;

        let mut cost_so_far = vec![f32::INFINITY; count];
        let mut parent: Vec<Option<usize>> = vec![None; count];
        let mut node_position = vec![Vec3::ZERO; count];
        let mut closed = vec![false; count];

        cost_so_far[start_index] = 0.0;
        node_position[start_index] = start;

        let mut best_index = start_index;
        let mut best_heuristic = start.distance(end) * HEURISTIC_SCALE;

        let mut open = BinaryHeap::new();
        open.push(SearchNode {
            poly: start_index,
            total_cost: best_heuristic,
        });

        while let Some(SearchNode { poly: current, .. }) = open.pop() {
            if closed[current] {
                continue;
            }
            closed[current] = true;
            if current == end_index {
                best_index = end_index;
                break;
            }

            for link in &self.polys[current].links {
                let next = link.to.0 as usize;
                if closed[next] {
                    continue;
                }

                let next_position = self.polys[next].center;
                let mut cost = cost_so_far[current] + node_position[current].distance(next_position);
                let heuristic = if next == end_index {
                    cost += next_position.distance(end);
                    0.0
                } else {
                    next_position.distance(end) * HEURISTIC_SCALE
                };

                if cost < cost_so_far[next] {
                    cost_so_far[next] = cost;
                    parent[next] = Some(current);
                    node_position[next] = next_position;
                    open.push(SearchNode {
                        poly: next,
                        total_cost: cost + heuristic,
                    });
                    if heuristic < best_heuristic {
                        best_heuristic = heuristic;
                        best_index = next;
                    }
                }
            }
        }

        // Цель недостижима → частичный коридор до ближайшего к ней полигона
        let mut corridor = Vec::new();
        let mut node = Some(best_index);
        while let Some(index) = node {
            corridor.push(PolyRef(index as u32));
            node = parent[index];
        }
        corridor.reverse();
        corridor.truncate(max_path);

        Ok(corridor)
    }

    fn find_straight_path(
        &self,
        start: Vec3,
        end: Vec3,
        corridor: &[PolyRef],
        max_points: usize,
    ) -> Result<Vec<StraightPathPoint>, NavQueryError> {
        let (Some(&first), Some(&last)) = (corridor.first(), corridor.last()) else {
            return Err(NavQueryError::InvalidParam("empty corridor"));
        };
        if max_points == 0 {
            return Err(NavQueryError::InvalidParam("max_points must be positive"));
        }
        for &poly in corridor {
            self.poly(poly)?;
        }

        let start = self.closest_point_on_poly_boundary(first, start)?;
        let end = self.closest_point_on_poly_boundary(last, end)?;

        let mut path = StraightPathBuffer {
            points: Vec::with_capacity(max_points),
            max_points,
        };
        if !path.append(start, StraightPathFlags::START, first) {
            return Ok(path.points);
        }

        // Off-mesh connections режут коридор на участки, воронка строится по каждому отдельно
        let mut segment_start = start;
        let mut segment_begin = 0;
        for (index, &poly) in corridor.iter().enumerate() {
            if !self.is_off_mesh_connection(poly) {
                continue;
            }
            let prev = if index > 0 { corridor[index - 1] } else { poly };
            let (entry, exit) = self.get_off_mesh_connection_end_points(prev, poly)?;

            for (corner, corner_poly) in self.funnel_corners(segment_start, entry, &corridor[segment_begin..index])? {
                if !path.append(corner, StraightPathFlags::NONE, corner_poly) {
                    return Ok(path.points);
                }
            }
            if !path.append(entry, StraightPathFlags::OFF_MESH_CONNECTION, poly) {
                return Ok(path.points);
            }
            let landing = corridor.get(index + 1).copied().unwrap_or(poly);
            if !path.append(exit, StraightPathFlags::NONE, landing) {
                return Ok(path.points);
            }

            segment_start = exit;
            segment_begin = index + 1;
        }

        let tail = corridor.get(segment_begin..).unwrap_or(&[]);
        for (corner, corner_poly) in self.funnel_corners(segment_start, end, tail)? {
            if !path.append(corner, StraightPathFlags::NONE, corner_poly) {
                return Ok(path.points);
            }
        }
        path.append(end, StraightPathFlags::END, last);

        Ok(path.points)
    }

    fn move_along_surface(&self, start_ref: PolyRef, start: Vec3, end: Vec3) -> Result<SurfaceMove, NavQueryError> {
        self.ground_vertices(start_ref)?;

        let search_position = start.lerp(end, 0.5);
        let search_radius = start.distance(end) * 0.5 + 0.001;
        let search_radius_sq = search_radius * search_radius;

        // nodes[i] = (полигон, родитель)
        let mut nodes: Vec<(PolyRef, Option<usize>)> = vec![(start_ref, None)];
        let mut seen: HashSet<PolyRef> = HashSet::from([start_ref]);
        let mut queue = VecDeque::from([0usize]);

        let mut best_node = 0;
        let mut best_position = start;
        let mut best_distance = f32::MAX;

        while let Some(current) = queue.pop_front() {
            let (poly_ref, _) = nodes[current];
            let vertices = self.ground_vertices(poly_ref)?;

            if point_in_polygon_2d(end, vertices) {
                best_node = current;
                best_position = end;
                break;
            }

            let links = &self.poly(poly_ref)?.links;
            for edge in 0..vertices.len() {
                let a = vertices[edge];
                let b = vertices[(edge + 1) % vertices.len()];
                let neighbours: Vec<PolyRef> = links
                    .iter()
                    .filter(|link| link.edge == Some(edge))
                    .map(|link| link.to)
                    .collect();

                if neighbours.is_empty() {
                    // Стена: запоминаем ближайшую к цели точку на ней
                    let (distance, t) = distance_point_segment_sq_2d(end, a, b);
                    if distance < best_distance {
                        best_distance = distance;
                        best_position = a.lerp(b, t);
                        best_node = current;
                    }
                    continue;
                }

                for neighbour in neighbours {
                    if seen.contains(&neighbour) {
                        continue;
                    }
                    let (distance, _) = distance_point_segment_sq_2d(search_position, a, b);
                    if distance > search_radius_sq {
                        continue;
                    }
                    if nodes.len() >= MAX_SURFACE_VISITED {
                        continue;
                    }
                    seen.insert(neighbour);
                    nodes.push((neighbour, Some(current)));
                    queue.push_back(nodes.len() - 1);
                }
            }
        }

        let mut visited = Vec::new();
        let mut node = Some(best_node);
        while let Some(index) = node {
            let (poly_ref, parent) = nodes[index];
            visited.push(poly_ref);
            node = parent;
        }
        visited.reverse();

        Ok(SurfaceMove {
            position: best_position,
            visited,
        })
    }

    fn get_poly_height(&self, poly: PolyRef, position: Vec3) -> Result<f32, NavQueryError> {
        match &self.poly(poly)?.kind {
            PolyKind::Ground { vertices } => polygon_height(vertices, position).ok_or(NavQueryError::NotOnPolygon(poly)),
            PolyKind::OffMesh(connection) => {
                let (_, t) = distance_point_segment_sq_2d(position, connection.start, connection.end);
                Ok(connection.start.y + (connection.end.y - connection.start.y) * t)
            }
        }
    }

    fn get_off_mesh_connection_end_points(
        &self,
        prev_ref: PolyRef,
        connection_ref: PolyRef,
    ) -> Result<(Vec3, Vec3), NavQueryError> {
        let PolyKind::OffMesh(connection) = &self.poly(connection_ref)?.kind else {
            return Err(NavQueryError::NotOffMeshConnection(connection_ref));
        };

        if connection.bidirectional && prev_ref == connection.end_poly && prev_ref != connection.start_poly {
            Ok((connection.end, connection.start))
        } else {
            Ok((connection.start, connection.end))
        }
    }

    fn neighbours(&self, poly: PolyRef) -> Result<Vec<PolyRef>, NavQueryError> {
        Ok(self.poly(poly)?.links.iter().map(|link| link.to).collect())
    }
}

impl SurfaceProjector for PolyMesh {
    fn closest_point(&self, position: Vec3) -> Option<Vec3> {
        self.find_nearest_poly(position, SURFACE_SEARCH_EXTENTS)
            .ok()
            .map(|nearest| nearest.point)
    }
}
