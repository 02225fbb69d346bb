//! Общие хелперы интеграционных тестов
//!
//! `step_simulation` ротирует события каждый тик, поэтому тесты копят
//! их в `Recorded<E>` системой, которая идёт последней в FixedUpdate.

use avern_simulation::ai::systems::update_colliders_and_vision;
use avern_simulation::ai::*;
use avern_simulation::*;
use bevy::prelude::*;

pub const DT: f32 = 1.0 / 60.0;

/// Все события `E` с начала теста
#[derive(Resource)]
pub struct Recorded<E: Event>(pub Vec<E>);

fn record<E: Event + Clone>(mut reader: EventReader<E>, mut recorded: ResMut<Recorded<E>>) {
    recorded.0.extend(reader.read().cloned());
}

fn record_events<E: Event + Clone>(app: &mut App) {
    app.insert_resource(Recorded::<E>(Vec::new()))
        .add_systems(FixedUpdate, record::<E>.after(update_colliders_and_vision));
}

/// Headless App + SimulationPlugin + плоский навмеш 100x100, все исходящие события пишутся
pub fn create_stage_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    let mesh = PolyMesh::builder()
        .rect(-50.0, -50.0, 50.0, 50.0, 0.0)
        .build()
        .expect("mesh builds");
    install_poly_mesh(app.world_mut(), mesh);

    record_events::<MonsterAttack>(&mut app);
    record_events::<LaunchProjectile>(&mut app);
    record_events::<CapsuleCollide>(&mut app);
    record_events::<HasCollider>(&mut app);
    record_events::<ClearTarget>(&mut app);
    record_events::<AlertCue>(&mut app);
    record_events::<HitReaction>(&mut app);
    record_events::<PickupDropped>(&mut app);
    record_events::<ExperienceGranted>(&mut app);
    app
}

pub fn run_ticks(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        step_simulation(app, DT);
    }
}

/// Записанные события `E` (накопительно)
pub fn events<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world().resource::<Recorded<E>>().0.clone()
}

pub fn behavior(app: &App, entity: Entity) -> Behavior {
    *app.world().get::<Behavior>(entity).expect("enemy has behavior")
}

pub fn position(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<Transform>(entity).expect("entity has transform").translation
}
