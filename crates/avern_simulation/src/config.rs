//! Конфиг симуляции (TOML)
//!
//! Все секции опциональны: отсутствующие ключи берутся из дефолтов.
//!
//! ```toml
//! seed = 7
//!
//! [navigation.path]
//! step_size = 0.5
//!
//! [navigation.replan]
//! interval_ticks = 12
//!
//! [enemies.bow]
//! health = 120
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::ai::{EnemyProfile, EnemyProfiles, ProfileOverride};
use crate::navigation::NavigationConfig;
use crate::DeterministicRng;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Переопределения профилей по типам врагов
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyOverrides {
    pub sword: ProfileOverride,
    pub bow: ProfileOverride,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub navigation: NavigationConfig,
    pub enemies: EnemyOverrides,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            navigation: NavigationConfig::default(),
            enemies: EnemyOverrides::default(),
        }
    }
}

impl SimulationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Профили врагов: дефолты типа + переопределения
    pub fn profiles(&self) -> EnemyProfiles {
        EnemyProfiles {
            sword: self.enemies.sword.apply(EnemyProfile::sword()),
            bow: self.enemies.bow.apply(EnemyProfile::bow()),
        }
    }

    /// Ставит ресурсы конфига в World (до спавна врагов)
    pub fn apply(&self, world: &mut World) {
        world.insert_resource(self.navigation.clone());
        world.insert_resource(self.profiles());
        world.insert_resource(DeterministicRng::new(self.seed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::EnemyKind;

    #[test]
    fn test_empty_config_is_default() {
        let config = SimulationConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.navigation.replan.interval_ticks, 12);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7

            [navigation.path]
            step_size = 0.25
            max_smooth_points = 64

            [navigation.replan]
            target_moved_threshold = 2.5

            [enemies.bow]
            health = 120
            pursue_speed = 6.0
            "#,
        )
        .expect("config parses");

        assert_eq!(config.seed, 7);
        assert_eq!(config.navigation.path.step_size, 0.25);
        assert_eq!(config.navigation.path.max_smooth_points, 64);
        assert_eq!(config.navigation.path.max_polygons, 256);
        assert_eq!(config.navigation.replan.target_moved_threshold, 2.5);
        assert_eq!(config.navigation.replan.interval_ticks, 12);

        let profiles = config.profiles();
        assert_eq!(profiles.get(EnemyKind::Bow).health, 120);
        assert_eq!(profiles.get(EnemyKind::Bow).pursue_speed, 6.0);
        assert_eq!(profiles.get(EnemyKind::Bow).action_range, 45.0);
        assert_eq!(profiles.get(EnemyKind::Sword), &EnemyProfile::sword());
    }

    #[test]
    fn test_unknown_profile_key_is_rejected() {
        let result = SimulationConfig::from_toml_str("[enemies.sword]\nhitpoints = 5\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let error = SimulationConfig::load("/definitely/not/here.toml").expect_err("missing file");
        assert!(error.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn test_bundled_example_config_loads() {
        let config = SimulationConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/simulation.toml"))
            .expect("example config parses");
        assert_eq!(config.navigation, NavigationConfig::default());
        assert_eq!(config.profiles(), EnemyProfiles::default());
    }

    #[test]
    fn test_apply_installs_resources() {
        let mut world = World::new();
        let config = SimulationConfig::from_toml_str("seed = 9\n[enemies.sword]\nhealth = 1\n").expect("config parses");
        config.apply(&mut world);

        assert_eq!(world.resource::<DeterministicRng>().seed, 9);
        assert_eq!(world.resource::<EnemyProfiles>().sword.health, 1);
        assert_eq!(world.resource::<NavigationConfig>(), &config.navigation);
    }
}
