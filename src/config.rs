//! Run configuration.
//!
//! [`EvolutionConfig`] is plain serde data so runs can be described in JSON.
//! Every field has a default; a config file only needs the fields it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::genome::{InputMode, Layout};

/// Probabilities and limits for offspring mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Probability that an offspring has its weights perturbed at all.
    pub weight_mutation_prob: f32,
    /// Per-connection probability of perturbation once the gate above passed.
    pub weight_perturb_prob: f32,
    /// Standard deviation of the Gaussian weight noise.
    pub weight_mutation_power: f32,
    /// Probability of one add-node mutation.
    pub add_node_prob: f32,
    /// Probability of one add-connection mutation, tried only when no node
    /// was added.
    pub add_connection_prob: f32,
    /// Endpoint pairs drawn before a structural mutation gives up.
    pub max_structural_attempts: usize,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            weight_mutation_prob: 0.8,
            weight_perturb_prob: 0.9,
            weight_mutation_power: 0.25,
            add_node_prob: 0.075,
            add_connection_prob: 0.1,
            max_structural_attempts: 100,
        }
    }
}

impl MutationConfig {
    /// Check that every probability lies in `[0, 1]` and the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("weight_mutation_prob", self.weight_mutation_prob),
            ("weight_perturb_prob", self.weight_perturb_prob),
            ("add_node_prob", self.add_node_prob),
            ("add_connection_prob", self.add_connection_prob),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        if !self.weight_mutation_power.is_finite() || self.weight_mutation_power < 0.0 {
            return Err(ConfigError::MutationPower(self.weight_mutation_power));
        }
        if self.max_structural_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        Ok(())
    }
}

/// Configuration for one evolutionary run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Individuals per generation. Must be even: half are kept, half bred.
    pub population_size: usize,
    /// Class label whose classifier score is the fitness.
    pub goal: String,
    /// Stop once the best fitness of a generation reaches this value.
    pub target_fitness: f32,
    /// Optional hard stop on the number of generations.
    pub max_generations: Option<u32>,
    /// Rendered image width in pixels.
    pub image_width: u32,
    /// Rendered image height in pixels.
    pub image_height: u32,
    /// Factor applied to network outputs when rendering.
    pub output_scale: f32,
    /// Coordinates fed to the network.
    pub input_mode: InputMode,
    /// Output channels per network.
    pub num_outputs: usize,
    /// Offspring mutation settings, flattened into the top-level object.
    #[serde(flatten)]
    pub mutation: MutationConfig,
    /// Seed for a reproducible run; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            goal: String::new(),
            target_fitness: 0.99,
            max_generations: None,
            image_width: 128,
            image_height: 128,
            output_scale: 255.0,
            input_mode: InputMode::Radial,
            num_outputs: 3,
            mutation: MutationConfig::default(),
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Default settings evolving toward `goal`.
    #[must_use]
    pub fn with_goal(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            ..Self::default()
        }
    }

    /// The network shape implied by this config.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        Layout::new(self.input_mode, self.num_outputs)
    }

    /// Check the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 || !self.population_size.is_multiple_of(2) {
            return Err(ConfigError::PopulationSize(self.population_size));
        }
        if self.goal.is_empty() {
            return Err(ConfigError::EmptyGoal);
        }
        if !(self.target_fitness > 0.0 && self.target_fitness <= 1.0) {
            return Err(ConfigError::TargetFitness(self.target_fitness));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(ConfigError::ImageSize);
        }
        if self.num_outputs == 0 {
            return Err(ConfigError::NoOutputs);
        }
        self.mutation.validate()
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error from [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid_with_goal() {
        let config = EvolutionConfig::with_goal("jellyfish");
        config.validate().unwrap();
        assert_eq!(config.layout(), Layout::new(InputMode::Radial, 3));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EvolutionConfig::from_json_str(
            r#"{"goal": "volcano", "population_size": 8, "input_mode": "planar",
                "add_node_prob": 0.5}"#,
        )
        .unwrap();

        assert_eq!(config.population_size, 8);
        assert_eq!(config.input_mode, InputMode::Planar);
        assert!((config.mutation.add_node_prob - 0.5).abs() < 1e-6);
        assert!((config.mutation.weight_mutation_power - 0.25).abs() < 1e-6);
        assert!((config.target_fitness - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_validation_errors() {
        let config = EvolutionConfig {
            population_size: 5,
            ..EvolutionConfig::with_goal("x")
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PopulationSize(5))
        ));

        assert!(matches!(
            EvolutionConfig::default().validate(),
            Err(ConfigError::EmptyGoal)
        ));

        let config = EvolutionConfig {
            mutation: MutationConfig {
                add_node_prob: 1.5,
                ..MutationConfig::default()
            },
            ..EvolutionConfig::with_goal("x")
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Probability {
                name: "add_node_prob",
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EvolutionConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let config = EvolutionConfig {
            seed: Some(9),
            ..EvolutionConfig::with_goal("starfish")
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        fs::write(&path, json).unwrap();

        assert_eq!(EvolutionConfig::load(&path).unwrap(), config);
        assert!(matches!(
            EvolutionConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
