//! AI Components: поведение врага, spawn state, перцепция, ростер

use bevy::prelude::*;

use super::animation::AnimationPlayback;
use super::profile::EnemyKind;
use crate::components::{BodyCollider, Health};
use crate::navigation::PathFollower;

/// Состояние поведения врага
///
/// Dead терминальное: выход только через `ResetStage`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum Behavior {
    #[default]
    Idle,
    Patrol,
    Pursue,
    Attack {
        /// Эффект атаки уже сработал в этом проигрывании клипа
        crucial_frame_sent: bool,
    },
    Dead,
}

impl Behavior {
    pub fn attack() -> Self {
        Behavior::Attack {
            crucial_frame_sent: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, Behavior::Dead)
    }

    pub fn is_attacking(&self) -> bool {
        matches!(self, Behavior::Attack { .. })
    }

    /// Idle / Patrol: ещё не заметил цель
    pub fn is_unaware(&self) -> bool {
        matches!(self, Behavior::Idle | Behavior::Patrol)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Idle => "idle",
            Behavior::Patrol => "patrol",
            Behavior::Pursue => "pursue",
            Behavior::Attack { .. } => "attack",
            Behavior::Dead => "dead",
        }
    }
}

/// Враг
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
#[require(Behavior, Health, AnimationPlayback, PathFollower, Targetable, BodyCollider, Transform)]
pub struct Enemy {
    pub kind: EnemyKind,
}

/// Куда враг возвращается на reset stage
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct SpawnState {
    pub position: Vec3,
    pub rotation: Quat,
    pub starting_behavior: Behavior,
}

/// Выделен ли враг игроком (для UI: полоска здоровья)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Targetable {
    pub targeted: bool,
}

/// Зацикленный маршрут патруля
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PatrolRoute {
    pub points: Vec<Vec3>,
    pub index: usize,
}

impl PatrolRoute {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points, index: 0 }
    }

    pub fn current(&self) -> Option<Vec3> {
        self.points.get(self.index).copied()
    }

    /// Следующая точка (с переходом на начало)
    pub fn advance(&mut self) {
        if !self.points.is_empty() {
            self.index = (self.index + 1) % self.points.len();
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

/// Треугольник атаки в local space: вершина у врага, основание впереди (+Z)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct DetectionTriangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl DetectionTriangle {
    /// `width`: смещение углов основания влево/вправо, `range`: вперёд
    pub fn new(width: f32, range: f32) -> Self {
        Self {
            a: Vec3::ZERO,
            b: Vec3::new(-width, 0.0, range),
            c: Vec3::new(width, 0.0, range),
        }
    }

    /// Вершины в world space для текущего transform
    pub fn to_world(&self, transform: &Transform) -> [Vec3; 3] {
        [
            transform.transform_point(self.a),
            transform.transform_point(self.b),
            transform.transform_point(self.c),
        ]
    }

    /// Лежит ли точка внутри треугольника (проекция на XZ, высота игнорируется)
    pub fn contains(&self, transform: &Transform, point: Vec3) -> bool {
        let [a, b, c] = self.to_world(transform);
        let v0 = Vec2::new(c.x - a.x, c.z - a.z);
        let v1 = Vec2::new(b.x - a.x, b.z - a.z);
        let v2 = Vec2::new(point.x - a.x, point.z - a.z);

        let denom = v0.x * v1.y - v1.x * v0.y;
        if denom.abs() <= f32::EPSILON {
            return false;
        }
        let u = (v2.x * v1.y - v1.x * v2.y) / denom;
        let v = (v0.x * v2.y - v2.x * v0.y) / denom;
        u >= 0.0 && v >= 0.0 && u + v <= 1.0
    }
}

/// Отсчёт до удаления мёртвого врага со сцены
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PendingRemoval {
    pub remaining: f32,
}

/// Marker: враг убран со сцены (entity живёт до reset stage)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct RemovedFromScene;

/// Живые враги (ростер)
///
/// Порядок = порядок спавна, перечисление стабильно между тиками.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveEnemies {
    entities: Vec<Entity>,
}

impl ActiveEnemies {
    pub fn add(&mut self, entity: Entity) {
        if !self.contains(entity) {
            self.entities.push(entity);
        }
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        let before = self.entities.len();
        self.entities.retain(|e| *e != entity);
        self.entities.len() != before
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Блокировка мира (катсцены, меню): AI системы не работают
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldUpdateLock {
    pub locked: bool,
}

/// Run condition для AI систем
pub fn world_unlocked(lock: Res<WorldUpdateLock>) -> bool {
    !lock.locked
}
