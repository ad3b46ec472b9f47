//! Configuration system
//!
//! Serializable settings for the simulation, loadable from TOML or RON
//! files. Applications construct a [`crate::physics::PhysicsWorld`] from a
//! [`SimulationConfig`] to get reproducible physics behavior across runs.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::physics::TriangleResolution;

/// Configuration trait
pub trait Config: Serialize + DeserializeOwned + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Settings for a physics simulation
///
/// Tunables that change the behavior of a [`crate::physics::PhysicsWorld`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Gravity acceleration applied to falling bodies (units/s², negative is down)
    pub gravity: f32,
    /// Which box-triangle resolution strategy to use
    pub triangle_resolution: TriangleResolution,
}

impl SimulationConfig {
    /// Create a configuration with engine defaults
    pub fn new() -> Self {
        Self {
            gravity: -60.0,
            triangle_resolution: TriangleResolution::Literal,
        }
    }

    /// Set gravity
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the box-triangle resolution strategy
    pub fn with_triangle_resolution(mut self, mode: TriangleResolution) -> Self {
        self.triangle_resolution = mode;
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for SimulationConfig {}
