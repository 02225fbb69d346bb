//! Navigation: адаптер навмеша, сглаживание пути, следование по пути
//!
//! Модули:
//! - query: seam к внешнему навмешу (`NavMeshQuery`, `SurfaceProjector`)
//! - mesh: `PolyMesh`, in-memory reference adapter
//! - corridor / smoother / path: коридор полигонов → сглаженный путь
//! - follower: `PathFollower` + политика перепланирования

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod corridor;
pub mod follower;
pub mod geometry;
pub mod mesh;
pub mod path;
pub mod query;
pub mod smoother;

pub use corridor::Corridor;
pub use follower::{PathFollower, PatrolPathing, ReplanPolicy};
pub use mesh::{PolyMesh, PolyMeshBuilder};
pub use path::{ComputePathError, PathCompletion, PathOptions, PathPoint, PathPointKind, SmoothPath};
pub use query::{
    NavMeshQuery, NavQueryError, NearestPoly, PolyRef, StraightPathFlags, StraightPathPoint, SurfaceMove,
    SurfaceProjector,
};
pub use smoother::{compute_smooth_path, get_steer_target, in_range, SteerTarget};

/// Навмеш для запросов пути (read-only, общий для всех агентов)
#[derive(Resource, Clone)]
pub struct NavMesh(pub Arc<dyn NavMeshQuery>);

impl NavMesh {
    pub fn query(&self) -> &dyn NavMeshQuery {
        self.0.as_ref()
    }
}

/// Поверхность окружения для re-projection после шага
#[derive(Resource, Clone)]
pub struct WalkableSurface(pub Arc<dyn SurfaceProjector>);

impl WalkableSurface {
    pub fn projector(&self) -> &dyn SurfaceProjector {
        self.0.as_ref()
    }
}

/// Настройки навигации (TOML секция `[navigation]`)
#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub path: PathOptions,
    pub replan: ReplanPolicy,
    pub patrol_pathing: PatrolPathing,
}

/// Ставит `PolyMesh` и как навмеш, и как walkable поверхность
pub fn install_poly_mesh(world: &mut World, mesh: PolyMesh) {
    let mesh = Arc::new(mesh);
    world.insert_resource(NavMesh(mesh.clone()));
    world.insert_resource(WalkableSurface(mesh));
}

/// Navigation Plugin
///
/// Только ресурсы: запросы идут синхронно из систем поведения.
/// `NavMesh` / `WalkableSurface` ставит хост (`install_poly_mesh` или свой адаптер).
pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavigationConfig>();
    }
}
