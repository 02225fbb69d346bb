//! Death / loot / reset stage integration test
//!
//! Проверяем:
//! - смерть при любом поведении (в том числе посреди атаки)
//! - опыт, ClearTarget, ростер, отложенное удаление
//! - лут: кап фляг и детерминизм броска
//! - reset stage возвращает всех в spawn state

mod common;

use bevy::prelude::*;
use avern_simulation::ai::*;
use avern_simulation::*;
use common::{behavior, create_stage_app, events, position, run_ticks, DT};

fn kill(app: &mut App, enemy: Entity) {
    app.world_mut().send_event(ReceiveDirectAttack { target: enemy, damage: 1000 });
    step_simulation(app, DT);
}

fn pickups(app: &mut App) -> usize {
    let world = app.world_mut();
    world.query::<&Pickup>().iter(world).count()
}

#[test]
fn test_attacking_enemy_dies_mid_swing() {
    let mut app = create_stage_app(42);
    let world = app.world_mut();
    let enemy = spawn_enemy(world, &SpawnPoint::idle(EnemyKind::Sword, Vec3::ZERO, 0.0));
    let player = spawn_player(world, Vec3::new(0.0, 0.0, 2.0));

    run_ticks(&mut app, 10);
    assert!(behavior(&app, enemy).is_attacking());

    kill(&mut app, enemy);

    assert_eq!(behavior(&app, enemy), Behavior::Dead);
    assert!(!app.world().resource::<ActiveEnemies>().contains(enemy));
    assert_eq!(app.world().get::<Experience>(player).map(|xp| xp.xp), Some(80));
    assert_eq!(
        events::<ClearTarget>(&app),
        vec![ClearTarget {
            visible: false,
            dead: true,
            id: enemy
        }]
    );
    assert_eq!(
        app.world().get::<AnimationPlayback>(enemy).map(|p| p.clip),
        Some(AnimationClip::Death)
    );

    // Мёртвый не атакует, не публикует коллайдер, урон игнорирует
    let colliders_before = events::<HasCollider>(&app).len();
    app.world_mut().send_event(ReceiveDirectAttack { target: enemy, damage: 5 });
    run_ticks(&mut app, 60);
    assert!(events::<MonsterAttack>(&app).is_empty());
    assert_eq!(events::<HasCollider>(&app).len(), colliders_before);
    assert_eq!(events::<ExperienceGranted>(&app).len(), 1);
}

#[test]
fn test_dead_enemy_is_removed_after_delay() {
    let mut app = create_stage_app(42);
    let world = app.world_mut();
    let enemy = spawn_enemy(world, &SpawnPoint::idle(EnemyKind::Bow, Vec3::ZERO, 0.0));
    spawn_player(world, Vec3::new(30.0, 0.0, -30.0));

    kill(&mut app, enemy);

    // Death clip 1.5s
    run_ticks(&mut app, 95);
    assert!(app.world().get::<PendingRemoval>(enemy).is_some());
    assert!(app.world().get::<RemovedFromScene>(enemy).is_none());

    // + removal delay 1.0s
    run_ticks(&mut app, 70);
    assert!(app.world().get::<PendingRemoval>(enemy).is_none());
    assert!(app.world().get::<RemovedFromScene>(enemy).is_some());
}

#[test]
fn test_no_loot_when_flasks_capped() {
    for seed in 0..10 {
        let mut app = create_stage_app(seed);
        let world = app.world_mut();
        let enemy = spawn_enemy(world, &SpawnPoint::idle(EnemyKind::Sword, Vec3::ZERO, 0.0));
        let player = spawn_player(world, Vec3::new(30.0, 0.0, -30.0));
        world
            .get_mut::<Consumables>(player)
            .expect("player consumables")
            .flasks = 5;

        kill(&mut app, enemy);
        run_ticks(&mut app, 100);

        assert_eq!(pickups(&mut app), 0);
        assert!(events::<PickupDropped>(&app).is_empty());
    }
}

#[test]
fn test_loot_roll_is_seeded() {
    let drops_for = |seed: u64| {
        let mut app = create_stage_app(seed);
        let world = app.world_mut();
        let enemy = spawn_enemy(world, &SpawnPoint::idle(EnemyKind::Sword, Vec3::new(3.0, 0.0, 4.0), 0.0));
        spawn_player(world, Vec3::new(30.0, 0.0, -30.0));

        kill(&mut app, enemy);
        run_ticks(&mut app, 100);
        events::<PickupDropped>(&app)
    };

    let outcomes: Vec<usize> = (0..30).map(|seed| drops_for(seed).len()).collect();
    // 1 из 3: за 30 сидов выпадает хотя бы раз, но не каждый раз
    assert!(outcomes.iter().any(|count| *count == 1));
    assert!(outcomes.iter().any(|count| *count == 0));
    assert!(outcomes.iter().all(|count| *count <= 1));

    // Тот же seed → тот же исход
    for seed in 0..5 {
        assert_eq!(drops_for(seed), drops_for(seed));
    }

    let dropped_seed = (0..30).find(|seed| outcomes[*seed as usize] == 1).expect("some seed drops");
    let drop = drops_for(dropped_seed);
    assert_eq!(drop[0].position, Vec3::new(3.0, 0.0, 4.0));
}

#[test]
fn test_reset_stage_restores_spawn_state() {
    let mut app = create_stage_app(42);
    let world = app.world_mut();
    let patrol_points = vec![Vec3::new(-10.0, 0.0, 0.0), Vec3::new(-10.0, 0.0, 6.0)];
    let patroller = spawn_enemy(world, &SpawnPoint::patrol(EnemyKind::Sword, patrol_points.clone()));
    let archer = spawn_enemy(world, &SpawnPoint::idle(EnemyKind::Bow, Vec3::new(10.0, 0.0, 0.0), 0.0));
    let player = spawn_player(world, Vec3::new(10.0, 0.0, 8.0));

    app.world_mut().send_event(SetTarget { id: Some(patroller) });
    run_ticks(&mut app, 30);
    assert_eq!(behavior(&app, archer), Behavior::attack());

    kill(&mut app, patroller);
    run_ticks(&mut app, 200);
    assert!(app.world().get::<RemovedFromScene>(patroller).is_some());
    assert_eq!(app.world().resource::<ActiveEnemies>().len(), 1);

    app.world_mut()
        .get_mut::<Transform>(player)
        .expect("player transform")
        .translation = Vec3::new(40.0, 0.0, -40.0);
    app.world_mut().send_event(ResetStage);
    step_simulation(&mut app, DT);

    let roster = app.world().resource::<ActiveEnemies>();
    assert!(roster.contains(patroller) && roster.contains(archer));

    assert_eq!(behavior(&app, patroller), Behavior::Patrol);
    assert_eq!(behavior(&app, archer), Behavior::Idle);
    assert!(app.world().get::<RemovedFromScene>(patroller).is_none());
    assert!(app.world().get::<PendingRemoval>(patroller).is_none());
    assert_eq!(app.world().get::<Health>(patroller).map(|h| h.current), Some(100));
    assert_eq!(app.world().get::<Health>(archer).map(|h| h.current), Some(90));
    assert_eq!(app.world().get::<Targetable>(patroller).map(|t| t.targeted), Some(false));

    let archer_transform = app.world().get::<Transform>(archer).copied().expect("archer transform");
    assert_eq!(archer_transform.translation, Vec3::new(10.0, 0.0, 0.0));
    assert_eq!(archer_transform.rotation, Quat::IDENTITY);

    let reset_clears: Vec<_> = events::<ClearTarget>(&app)
        .into_iter()
        .filter(|event| !event.dead)
        .collect();
    assert_eq!(reset_clears.len(), 2);
    assert!(reset_clears.iter().all(|event| !event.visible));
}

#[test]
fn test_reset_stage_returns_patroller_to_spawn_marker() {
    let mut app = create_stage_app(42);
    let marker = Vec3::new(-20.0, 0.0, 10.0);
    let world = app.world_mut();
    let patroller = spawn_enemy(
        world,
        &SpawnPoint {
            position: marker,
            yaw: 0.0,
            kind: EnemyKind::Sword,
            patrol_points: vec![Vec3::new(-10.0, 0.0, 0.0), Vec3::new(-10.0, 0.0, 6.0)],
        },
    );
    spawn_player(world, Vec3::new(40.0, 0.0, -40.0));

    // Патруль стартует в первой точке маршрута
    assert_eq!(position(&app, patroller), Vec3::new(-10.0, 0.0, 0.0));
    run_ticks(&mut app, 60);
    assert_ne!(position(&app, patroller), Vec3::new(-10.0, 0.0, 0.0));

    app.world_mut().send_event(ResetStage);
    step_simulation(&mut app, DT);

    assert_eq!(behavior(&app, patroller), Behavior::Patrol);
    assert_eq!(app.world().get::<PatrolRoute>(patroller).map(|r| r.index), Some(0));

    // После reset патруль идёт от маркера к первой точке
    let after_reset = position(&app, patroller);
    assert!(after_reset.distance(marker) < 0.1, "reset to {:?}", after_reset);
}
