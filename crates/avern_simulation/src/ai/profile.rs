//! Архетипы врагов: параметры по типу (sword / bow)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::LocalCapsule;

/// Тип врага (метка spawn point)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Sword,
    Bow,
}

impl EnemyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Sword => "sword",
            EnemyKind::Bow => "bow",
        }
    }
}

/// Эффект атаки на crucial frame
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub enum AttackEffect {
    /// Удар в ближнем бою: урон + доля отбрасывания
    Melee { damage: u32, percentage: f32 },
    /// Снаряд в позицию цели
    Projectile { radius: f32, speed: f32 },
}

/// Параметры врага (копия на каждой entity)
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct EnemyProfile {
    pub kind: EnemyKind,
    pub health: u32,

    pub patrol_speed: f32,
    pub pursue_speed: f32,
    /// Доля поворота к цели за тик (slerp)
    pub facing_lerp: f32,

    /// Полуширина основания треугольника обнаружения
    pub detection_width: f32,
    /// Дальность атаки (и глубина треугольника)
    pub action_range: f32,

    /// Кадр клипа атаки (30 fps), на котором срабатывает эффект
    pub crucial_frame: u32,
    pub attack_duration: f32,
    pub attack: AttackEffect,

    pub body: LocalCapsule,
    pub vision: LocalCapsule,

    /// Half-extents привязки цели к навмешу (цель может стоять чуть вне меша)
    pub target_snap_extents: Vec3,
    pub patrol_arrival_radius: f32,
    /// Квадрат расстояния, ближе которого waypoint считается достигнутым
    pub min_progress_sq: f32,

    pub experience: u32,
    pub death_duration: f32,
    pub removal_delay: f32,
    /// Шанс дропа фляги: 1 из N
    pub loot_chance_denominator: u32,
    /// Не дропаем, если у игрока уже столько фляг
    pub flask_cap: u32,
}

impl EnemyProfile {
    pub fn sword() -> Self {
        Self {
            kind: EnemyKind::Sword,
            health: 100,
            detection_width: 4.0,
            action_range: 3.0,
            crucial_frame: 24,
            attack_duration: 2.5,
            attack: AttackEffect::Melee {
                damage: 10,
                percentage: 0.5,
            },
            vision: LocalCapsule::new(Vec3::new(0.0, 1.5, 0.5), Vec3::new(0.0, 1.5, 12.0), 3.0),
            ..Self::shared(EnemyKind::Sword)
        }
    }

    pub fn bow() -> Self {
        Self {
            kind: EnemyKind::Bow,
            health: 90,
            detection_width: 24.0,
            action_range: 45.0,
            crucial_frame: 80,
            attack_duration: 3.0,
            attack: AttackEffect::Projectile { radius: 1.0, speed: 33.0 },
            vision: LocalCapsule::new(Vec3::new(0.0, 1.5, 0.5), Vec3::new(0.0, 1.5, 30.0), 6.0),
            ..Self::shared(EnemyKind::Bow)
        }
    }

    pub fn for_kind(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Sword => Self::sword(),
            EnemyKind::Bow => Self::bow(),
        }
    }

    /// Общие для всех типов значения
    fn shared(kind: EnemyKind) -> Self {
        Self {
            kind,
            health: 100,
            patrol_speed: 2.0,
            pursue_speed: 8.0,
            facing_lerp: 0.2,
            detection_width: 4.0,
            action_range: 3.0,
            crucial_frame: 24,
            attack_duration: 2.5,
            attack: AttackEffect::Melee {
                damage: 10,
                percentage: 0.5,
            },
            body: LocalCapsule::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 2.0, 0.0), 0.5),
            vision: LocalCapsule::new(Vec3::new(0.0, 1.5, 0.5), Vec3::new(0.0, 1.5, 12.0), 3.0),
            target_snap_extents: Vec3::splat(3.0),
            patrol_arrival_radius: 0.5,
            min_progress_sq: 0.1,
            experience: 80,
            death_duration: 1.5,
            removal_delay: 1.0,
            loot_chance_denominator: 3,
            flask_cap: 5,
        }
    }
}

/// Частичное переопределение профиля из конфига (отсутствующие ключи = дефолт типа)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileOverride {
    pub health: Option<u32>,
    pub patrol_speed: Option<f32>,
    pub pursue_speed: Option<f32>,
    pub facing_lerp: Option<f32>,
    pub detection_width: Option<f32>,
    pub action_range: Option<f32>,
    pub crucial_frame: Option<u32>,
    pub attack_duration: Option<f32>,
    pub attack: Option<AttackEffect>,
    pub body: Option<LocalCapsule>,
    pub vision: Option<LocalCapsule>,
    pub experience: Option<u32>,
    pub removal_delay: Option<f32>,
}

impl ProfileOverride {
    pub fn apply(&self, mut profile: EnemyProfile) -> EnemyProfile {
        if let Some(health) = self.health {
            profile.health = health;
        }
        if let Some(speed) = self.patrol_speed {
            profile.patrol_speed = speed;
        }
        if let Some(speed) = self.pursue_speed {
            profile.pursue_speed = speed;
        }
        if let Some(lerp) = self.facing_lerp {
            profile.facing_lerp = lerp;
        }
        if let Some(width) = self.detection_width {
            profile.detection_width = width;
        }
        if let Some(range) = self.action_range {
            profile.action_range = range;
        }
        if let Some(frame) = self.crucial_frame {
            profile.crucial_frame = frame;
        }
        if let Some(duration) = self.attack_duration {
            profile.attack_duration = duration;
        }
        if let Some(attack) = self.attack {
            profile.attack = attack;
        }
        if let Some(body) = self.body {
            profile.body = body;
        }
        if let Some(vision) = self.vision {
            profile.vision = vision;
        }
        if let Some(experience) = self.experience {
            profile.experience = experience;
        }
        if let Some(delay) = self.removal_delay {
            profile.removal_delay = delay;
        }
        profile
    }
}

/// Профили по типам (ресурс, из него берёт `spawn_enemy`)
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EnemyProfiles {
    pub sword: EnemyProfile,
    pub bow: EnemyProfile,
}

impl Default for EnemyProfiles {
    fn default() -> Self {
        Self {
            sword: EnemyProfile::sword(),
            bow: EnemyProfile::bow(),
        }
    }
}

impl EnemyProfiles {
    pub fn get(&self, kind: EnemyKind) -> &EnemyProfile {
        match kind {
            EnemyKind::Sword => &self.sword,
            EnemyKind::Bow => &self.bow,
        }
    }
}
