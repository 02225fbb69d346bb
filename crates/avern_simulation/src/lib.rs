//! Avern Simulation Core
//!
//! Headless ECS-ядро врагов на Bevy 0.16:
//! - navigation: сглаживание пути по навмешу (funnel steering поверх NavQuery адаптера)
//! - ai: машина поведения врагов, перцепция, жизненный цикл
//! - collision: капсулы (зрение / тела)
//!
//! Рендер, анимация, звук и UI живут снаружи и общаются с ядром через events.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod ai;
pub mod collision;
pub mod components;
pub mod config;
pub mod logger;
pub mod navigation;

// Re-exports для удобства
pub use ai::{
    spawn_enemy, spawn_player, ActiveEnemies, Behavior, EnemyAiPlugin, EnemyKind, EnemyProfile, EnemyProfiles,
    SpawnPoint, WorldUpdateLock,
};
pub use collision::{check_capsule_collision, Capsule, CapsuleCollision, Segment};
pub use components::*;
pub use config::{ConfigError, SimulationConfig};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter,
};
pub use navigation::{
    compute_smooth_path, install_poly_mesh, ComputePathError, NavMesh, NavMeshQuery, NavigationConfig,
    NavigationPlugin, PathOptions, PolyMesh, SmoothPath, WalkableSurface,
};

/// Частота simulation tick (FixedUpdate)
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ));
        // Детерминистичный RNG: seed из create_headless_app / конфига не перетираем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
        app.add_plugins((NavigationPlugin, EnemyAiPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Headless App под явный frame clock (`step_simulation`)
///
/// Только MinimalPlugins + seed. `SimulationPlugin` добавляет вызывающий,
/// чтобы успеть подменить профили / навигацию до сборки.
pub fn create_headless_app(seed: u64) -> App {
    init_logger();
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(DeterministicRng::new(seed));
    app.insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ));
    app
}

/// Один тик симуляции с явным шагом времени
///
/// Внешний frame clock: `Time` сдвигается ровно на `delta`, затем один проход FixedUpdate
/// и ротация буферов событий. После вызова `Events<E>` содержат только события этого тика.
pub fn step_simulation(app: &mut App, delta: f32) {
    let world = app.world_mut();
    world.resource_mut::<Time>().advance_by(Duration::from_secs_f32(delta.max(0.0)));
    world.run_schedule(FixedUpdate);
    ai::events::rotate_enemy_events(world);
}

/// Байтовый snapshot компонента `T` по всем сущностям, упорядоченный по `Entity`
///
/// Для сравнения двух прогонов с одним seed: Debug-представление, не формат хранения.
pub fn world_snapshot<T: Component + std::fmt::Debug>(world: &mut World) -> Vec<u8> {
    let mut rows: Vec<(Entity, String)> = world
        .query::<(Entity, &T)>()
        .iter(world)
        .map(|(entity, component)| (entity, format!("{:?}", component)))
        .collect();
    rows.sort_unstable_by_key(|(entity, _)| *entity);

    rows.into_iter()
        .flat_map(|(entity, text)| {
            entity
                .to_bits()
                .to_le_bytes()
                .into_iter()
                .chain(text.into_bytes())
        })
        .collect()
}
