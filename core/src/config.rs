//! Gameplay configuration consumed by the world, systems and adapters.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_RNG_SEED: u64 = 0x6ce3_2a0f_95d1_7b48;

/// Tunable parameters of a Centipede session.
///
/// Keys use the upper snake case names the game preferences have always used,
/// so a TOML file reads `PLAYER_LIVES = 3`. Missing keys fall back to
/// [`GameConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GameConfig {
    /// Number of grid rows.
    pub grid_rows: u32,
    /// Number of grid columns.
    pub grid_columns: u32,
    /// Lives the player starts with.
    pub player_lives: u32,
    /// Player speed in cells per second.
    pub player_speed: f32,
    /// Bullet speed in cells per second.
    pub bullet_speed: f32,
    /// Scorpion speed in cells per second.
    pub scorpion_speed: f32,
    /// Flea speed in cells per second.
    pub flea_speed: f32,
    /// Centipede segment speed in cells per second.
    pub centipede_speed: f32,
    /// Rows reserved at the bottom of the grid for the player.
    pub player_area_height: u32,
    /// Mushrooms planted when the field is created.
    pub num_mushrooms: u32,
    /// Segments in the initial centipede.
    pub centipede_length: u32,
    /// Seconds between scorpion spawns.
    pub scorpion_spawn_interval: f32,
    /// Seconds between flea spawns.
    pub flea_spawn_interval: f32,
    /// Whether the player takes part.
    pub enable_player: bool,
    /// Whether the mushroom field is planted and fleas drop mushrooms.
    pub enable_mushrooms: bool,
    /// Whether the centipede is created.
    pub enable_centipedes: bool,
    /// Whether scorpions spawn.
    pub enable_scorpions: bool,
    /// Whether fleas spawn.
    pub enable_fleas: bool,
    /// Seed for every random decision made during the session.
    pub rng_seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_rows: 30,
            grid_columns: 30,
            player_lives: 3,
            player_speed: 8.0,
            bullet_speed: 40.0,
            scorpion_speed: 6.0,
            flea_speed: 10.0,
            centipede_speed: 8.0,
            player_area_height: 6,
            num_mushrooms: 40,
            centipede_length: 10,
            scorpion_spawn_interval: 10.0,
            flea_spawn_interval: 8.0,
            enable_player: true,
            enable_mushrooms: true,
            enable_centipedes: true,
            enable_scorpions: true,
            enable_fleas: true,
            rng_seed: DEFAULT_RNG_SEED,
        }
    }
}

impl GameConfig {
    /// Index of the bottom row, where the player starts.
    #[must_use]
    pub const fn last_row(&self) -> u32 {
        self.grid_rows.saturating_sub(1)
    }

    /// Row holding the invisible wall that fences in the player's zone.
    #[must_use]
    pub const fn wall_row(&self) -> u32 {
        self.last_row().saturating_sub(self.player_area_height)
    }

    /// Column where the centipede head and the player start.
    #[must_use]
    pub const fn center_column(&self) -> u32 {
        self.grid_columns.saturating_sub(1) / 2
    }

    /// Interval between scorpion spawns.
    #[must_use]
    pub fn scorpion_interval(&self) -> Duration {
        Duration::from_secs_f32(self.scorpion_spawn_interval.max(0.0))
    }

    /// Interval between flea spawns.
    #[must_use]
    pub fn flea_interval(&self) -> Duration {
        Duration::from_secs_f32(self.flea_spawn_interval.max(0.0))
    }

    /// Checks that the configuration describes a playable field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_rows < 2 || self.grid_columns == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.grid_rows,
                columns: self.grid_columns,
            });
        }

        if self.player_area_height == 0 || self.player_area_height >= self.last_row() {
            return Err(ConfigError::PlayerAreaTooTall {
                height: self.player_area_height,
                rows: self.grid_rows,
            });
        }

        let speeds = [
            ("PLAYER_SPEED", self.player_speed),
            ("BULLET_SPEED", self.bullet_speed),
            ("SCORPION_SPEED", self.scorpion_speed),
            ("FLEA_SPEED", self.flea_speed),
            ("CENTIPEDE_SPEED", self.centipede_speed),
        ];
        for (key, value) in speeds {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { key, value });
            }
        }

        let intervals = [
            ("SCORPION_SPAWN_INTERVAL", self.scorpion_spawn_interval),
            ("FLEA_SPAWN_INTERVAL", self.flea_spawn_interval),
        ];
        for (key, value) in intervals {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { key, value });
            }
        }

        if self.enable_centipedes && self.centipede_length > self.center_column() + 1 {
            return Err(ConfigError::CentipedeTooLong {
                length: self.centipede_length,
                capacity: self.center_column() + 1,
            });
        }

        if self.enable_mushrooms {
            let capacity = self.mushroom_capacity();
            if u64::from(self.num_mushrooms) > capacity {
                return Err(ConfigError::TooManyMushrooms {
                    requested: self.num_mushrooms,
                    capacity,
                });
            }
        }

        Ok(())
    }

    /// Cells left for mushrooms once the player row, the wall row and the
    /// centipede's starting cells are taken.
    #[must_use]
    pub fn mushroom_capacity(&self) -> u64 {
        let columns = u64::from(self.grid_columns);
        let open_rows = u64::from(self.grid_rows.saturating_sub(2));
        let centipede = if self.enable_centipedes {
            u64::from(self.centipede_length)
        } else {
            0
        };
        (open_rows * columns).saturating_sub(centipede)
    }
}

/// Reasons a [`GameConfig`] cannot be used.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid cannot hold a player row and a field above it.
    #[error("grid of {rows}x{columns} cells is too small to play on")]
    EmptyGrid {
        /// Configured rows.
        rows: u32,
        /// Configured columns.
        columns: u32,
    },
    /// The player's zone leaves no room for the rest of the field.
    #[error("player area of {height} rows does not fit a grid with {rows} rows")]
    PlayerAreaTooTall {
        /// Configured player area height.
        height: u32,
        /// Configured rows.
        rows: u32,
    },
    /// A speed or interval was zero, negative or not a number.
    #[error("{key} must be a positive number, got {value}")]
    NonPositive {
        /// Offending configuration key.
        key: &'static str,
        /// Offending value.
        value: f32,
    },
    /// The centipede does not fit to the left of the head column.
    #[error("centipede of {length} segments exceeds the {capacity} starting cells")]
    CentipedeTooLong {
        /// Configured length.
        length: u32,
        /// Cells available in the first row.
        capacity: u32,
    },
    /// More mushrooms were requested than there are free cells.
    #[error("{requested} mushrooms exceed the {capacity} available cells")]
    TooManyMushrooms {
        /// Configured mushroom count.
        requested: u32,
        /// Cells available for mushrooms.
        capacity: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, GameConfig};

    #[test]
    fn default_configuration_is_playable() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: GameConfig =
            toml::from_str("PLAYER_LIVES = 5\nENABLE_FLEAS = false\n").expect("parse");
        assert_eq!(config.player_lives, 5);
        assert!(!config.enable_fleas);
        assert_eq!(config.grid_rows, GameConfig::default().grid_rows);
    }

    #[test]
    fn rejects_mushrooms_beyond_capacity() {
        let config = GameConfig {
            grid_rows: 4,
            grid_columns: 4,
            player_area_height: 1,
            centipede_length: 2,
            num_mushrooms: 7,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManyMushrooms {
                requested: 7,
                capacity: 6,
            })
        );
    }

    #[test]
    fn rejects_player_area_covering_the_field() {
        let config = GameConfig {
            grid_rows: 5,
            player_area_height: 4,
            ..GameConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PlayerAreaTooTall { .. })
        ));
    }

    #[test]
    fn rejects_zero_speed() {
        let config = GameConfig {
            flea_speed: 0.0,
            ..GameConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive {
                key: "FLEA_SPEED",
                value: 0.0,
            })
        );
    }
}
