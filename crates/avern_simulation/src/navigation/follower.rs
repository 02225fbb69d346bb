//! PathFollower: текущий путь агента + курсор + решение "пора перепланировать".

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::path::SmoothPath;

/// Когда pursue пересчитывает путь
///
/// Полный пересчёт каждый тик дорогой, поэтому путь переиспользуется,
/// пока он не кончился, не устарел по тикам и цель не ушла дальше порога.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplanPolicy {
    /// Через сколько fixed тиков путь считается устаревшим
    pub interval_ticks: u32,
    /// Насколько цель может сместиться от точки, под которую строили путь
    pub target_moved_threshold: f32,
}

impl Default for ReplanPolicy {
    fn default() -> Self {
        Self {
            interval_ticks: 12,
            target_moved_threshold: 1.0,
        }
    }
}

/// Как патруль идёт к точке маршрута
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum PatrolPathing {
    /// Напрямую к точке, навмеш не спрашивается (стены не обходятся)
    #[default]
    Direct,
    /// Сглаженный путь по навмешу, как у pursue
    NavMesh,
}

/// Путь, по которому идёт агент
///
/// `None` = пути нет, нужен (пере)план. Смена поведения на attack/dead
/// просто сбрасывает путь.
#[derive(Component, Debug, Clone, Default)]
pub struct PathFollower {
    path: Option<SmoothPath>,
    cursor: usize,
    ticks_since_plan: u32,
    planned_target: Option<Vec3>,
}

impl PathFollower {
    pub fn path(&self) -> Option<&SmoothPath> {
        self.path.as_ref()
    }

    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_path(&mut self, path: SmoothPath, target: Vec3) {
        self.path = Some(path);
        self.cursor = 0;
        self.ticks_since_plan = 0;
        self.planned_target = Some(target);
    }

    pub fn clear(&mut self) {
        self.path = None;
        self.cursor = 0;
        self.ticks_since_plan = 0;
        self.planned_target = None;
    }

    /// Первая непосещённая точка
    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.path
            .as_ref()
            .and_then(|path| path.points().get(self.cursor))
            .map(|point| point.position)
    }

    pub fn advance(&mut self) {
        if self.current_waypoint().is_some() {
            self.cursor += 1;
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.path.is_some() && self.current_waypoint().is_none()
    }

    /// Отмечает прошедший тик
    pub fn tick(&mut self) {
        self.ticks_since_plan = self.ticks_since_plan.saturating_add(1);
    }

    pub fn needs_replan(&self, policy: &ReplanPolicy, target: Vec3) -> bool {
        let Some(planned) = self.planned_target else {
            return true;
        };
        if self.path.is_none() || self.is_exhausted() {
            return true;
        }
        if self.ticks_since_plan >= policy.interval_ticks {
            return true;
        }
        planned.distance(target) > policy.target_moved_threshold
    }
}
