//! Navigation adapter seam
//!
//! Ядро не строит и не хранит навмеш: оно только спрашивает. Все запросы
//! возвращают `Result`, "полигон не найден": это `Err(NotFound)`, а не null ref.

use bevy::prelude::*;
use std::fmt;
use thiserror::Error;

/// Ссылка на полигон навмеша (ground polygon или off-mesh connection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolyRef(pub u32);

impl fmt::Display for PolyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "poly#{}", self.0)
    }
}

/// Ошибки запросов к навмешу
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavQueryError {
    #[error("invalid polygon reference {0}")]
    InvalidPolyRef(PolyRef),

    #[error("no polygon found within search extents")]
    NotFound,

    #[error("invalid query parameter: {0}")]
    InvalidParam(&'static str),

    #[error("point is not over polygon {0}")]
    NotOnPolygon(PolyRef),

    #[error("{0} is not an off-mesh connection")]
    NotOffMeshConnection(PolyRef),
}

/// Флаги точки straight path (битовая маска, как в Detour)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct StraightPathFlags(u8);

impl StraightPathFlags {
    pub const NONE: Self = Self(0);
    /// Первая точка пути
    pub const START: Self = Self(0x01);
    /// Последняя точка пути
    pub const END: Self = Self(0x02);
    /// Точка входа в off-mesh connection
    pub const OFF_MESH_CONNECTION: Self = Self(0x04);

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for StraightPathFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Угол (вершина) прямого пути через коридор
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightPathPoint {
    pub position: Vec3,
    pub flags: StraightPathFlags,
    /// Полигон, в который входит путь в этой точке
    pub poly: PolyRef,
}

/// Результат `find_nearest_poly`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoly {
    pub poly: PolyRef,
    /// Ближайшая точка на найденном полигоне
    pub point: Vec3,
}

/// Результат `move_along_surface`
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMove {
    /// Куда реально удалось дойти (клампится о стены)
    pub position: Vec3,
    /// Пройденные полигоны, от стартового к конечному
    pub visited: Vec<PolyRef>,
}

/// Запросы к навмешу (black box: Detour, Godot NavigationServer, PolyMesh)
///
/// Реализация read-only и разделяется всеми агентами, отсюда `Send + Sync`.
#[cfg_attr(test, mockall::automock)]
pub trait NavMeshQuery: Send + Sync {
    /// Ближайший полигон, чьи границы пересекают box `center ± half_extents`
    fn find_nearest_poly(&self, center: Vec3, half_extents: Vec3) -> Result<NearestPoly, NavQueryError>;

    /// Ближайшая к `position` точка на полигоне (с высотой поверхности)
    fn closest_point_on_poly(&self, poly: PolyRef, position: Vec3) -> Result<Vec3, NavQueryError>;

    /// Коридор полигонов от `start_ref` к `end_ref`
    ///
    /// Если конец недостижим, возвращает частичный коридор до полигона,
    /// ближайшего к цели. Длина ограничена `max_path`.
    fn find_path(
        &self,
        start_ref: PolyRef,
        end_ref: PolyRef,
        start: Vec3,
        end: Vec3,
        max_path: usize,
    ) -> Result<Vec<PolyRef>, NavQueryError>;

    /// Углы натянутого пути внутри коридора (не больше `max_points`)
    fn find_straight_path(
        &self,
        start: Vec3,
        end: Vec3,
        corridor: &[PolyRef],
        max_points: usize,
    ) -> Result<Vec<StraightPathPoint>, NavQueryError>;

    /// Сдвиг по поверхности из `start` к `end` с упором в стены
    fn move_along_surface(&self, start_ref: PolyRef, start: Vec3, end: Vec3) -> Result<SurfaceMove, NavQueryError>;

    /// Высота поверхности полигона в точке (XZ)
    fn get_poly_height(&self, poly: PolyRef, position: Vec3) -> Result<f32, NavQueryError>;

    /// Концы off-mesh connection в порядке прохождения (вход, выход)
    fn get_off_mesh_connection_end_points(
        &self,
        prev_ref: PolyRef,
        connection_ref: PolyRef,
    ) -> Result<(Vec3, Vec3), NavQueryError>;

    /// Соседи полигона по links
    fn neighbours(&self, poly: PolyRef) -> Result<Vec<PolyRef>, NavQueryError>;
}

/// Проекция на walkable поверхность окружения (closest point on mesh)
pub trait SurfaceProjector: Send + Sync {
    fn closest_point(&self, position: Vec3) -> Option<Vec3>;
}
