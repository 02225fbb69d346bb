//! Headless симуляция Avern
//!
//! Коридор из навмеша, игрок у дальнего конца, мечник в патруле и лучник в idle.
//! Игрок подходит к врагам, враги замечают его и атакуют; лог показывает переходы.
//!
//! Запуск: `avern_simulation [config.toml]`

use bevy::prelude::*;
use avern_simulation::ai::{LaunchProjectile, MonsterAttack};
use avern_simulation::{
    create_headless_app, install_poly_mesh, log_error, log_info, spawn_enemy, spawn_player, step_simulation,
    Behavior, EnemyKind, PolyMesh, SimulationConfig, SimulationPlugin, SpawnPoint,
};

const TICK: f32 = 1.0 / 60.0;
const TICK_COUNT: usize = 600;

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match SimulationConfig::load(&path) {
            Ok(config) => config,
            Err(error) => {
                log_error(&format!("{}", error));
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };

    println!("Starting Avern headless simulation (seed: {})", config.seed);

    let mut app = create_headless_app(config.seed);
    app.add_plugins(SimulationPlugin);
    config.apply(app.world_mut());

    let mesh = match PolyMesh::builder()
        .rect(0.0, 0.0, 20.0, 10.0, 0.0)
        .rect(20.0, 0.0, 40.0, 10.0, 0.0)
        .rect(40.0, 0.0, 60.0, 10.0, 0.0)
        .build()
    {
        Ok(mesh) => mesh,
        Err(error) => {
            log_error(&format!("failed to build navmesh: {}", error));
            std::process::exit(1);
        }
    };
    install_poly_mesh(app.world_mut(), mesh);

    let world = app.world_mut();
    let player = spawn_player(world, Vec3::new(58.0, 0.0, 5.0));
    let sword = spawn_enemy(
        world,
        &SpawnPoint::patrol(
            EnemyKind::Sword,
            vec![Vec3::new(30.0, 0.0, 3.0), Vec3::new(30.0, 0.0, 7.0)],
        ),
    );
    let bow = spawn_enemy(
        world,
        &SpawnPoint::idle(EnemyKind::Bow, Vec3::new(10.0, 0.0, 5.0), std::f32::consts::FRAC_PI_2),
    );

    let mut melee = 0;
    let mut shots = 0;
    for tick in 0..TICK_COUNT {
        // Игрок идёт к врагам вдоль коридора
        if let Some(mut transform) = app.world_mut().get_mut::<Transform>(player) {
            if transform.translation.x > 15.0 {
                transform.translation.x -= 4.0 * TICK;
            }
        }

        step_simulation(&mut app, TICK);
        // После тика в очередях только события этого тика
        melee += app.world().resource::<Events<MonsterAttack>>().len();
        shots += app.world().resource::<Events<LaunchProjectile>>().len();

        if tick % 60 == 0 {
            let world = app.world();
            let state = |entity: Entity| {
                world
                    .get::<Behavior>(entity)
                    .map(|behavior| behavior.as_str())
                    .unwrap_or("missing")
            };
            log_info(&format!(
                "Tick {}: sword = {}, bow = {}",
                tick,
                state(sword),
                state(bow)
            ));
        }
    }

    println!("Simulation complete! melee hits: {}, projectiles: {}", melee, shots);
}
