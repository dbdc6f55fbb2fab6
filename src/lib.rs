//! # Symbios CPPN
//!
//! Evolves Compositional Pattern Producing Networks (CPPNs) into images that
//! an external classifier recognises as a chosen class, using NEAT-style
//! topology growth.
//!
//! ## Features
//!
//! - **Arena-Graph Model**: Nodes and connections live in `SlotMap` buffers;
//!   outgoing adjacency and layers are derived, never stored by hand
//! - **Innovation Context**: Node ids and connection innovations come from an
//!   explicit [`InnovationCounter`] owned by the run, so independent
//!   populations never interfere
//! - **Layered Evaluation**: One ascending sweep per query over an acyclic,
//!   layered graph
//! - **Text Genomes**: A compact `nodes|connections` encoding used for
//!   persistence and innovation-aligned crossover
//! - **Pluggable Collaborators**: Rendering, classification and artifact
//!   storage sit behind traits
//!
//! ## Quick Start
//!
//! ```rust
//! use symbios_cppn::{codec, InnovationCounter, InputMode, Layout, Network};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let layout = Layout::new(InputMode::Radial, 3);
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut innovations = InnovationCounter::after_seed(&layout);
//!
//! // x, y, d -> r, g, b, with one hidden node spliced in
//! let mut network = Network::fully_connected(layout, &mut rng);
//! network.add_node(1, 4, &mut innovations, &mut rng).unwrap();
//!
//! let rgb = network.query(0.5, -0.5, 255.0);
//! assert_eq!(rgb.len(), 3);
//!
//! // Genomes survive a text round trip
//! let mut restored = codec::decode(&codec::encode(&network), layout).unwrap();
//! assert_eq!(restored.query(0.5, -0.5, 255.0), rgb);
//! ```
//!
//! ## Running Evolution
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::path::Path;
//! use symbios_cppn::{
//!     BoxError, ClassScores, EvolutionConfig, FsArtifactStore, PngRenderer, Population,
//! };
//!
//! fn my_classifier(_image: &Path) -> Result<ClassScores, BoxError> {
//!     // call out to an image classifier here
//!     Ok(HashMap::from([("jellyfish".to_string(), 0.5)]))
//! }
//!
//! let config = EvolutionConfig::with_goal("jellyfish");
//! let mut renderer = PngRenderer::new("population", config.image_width, config.image_height);
//! let mut store = FsArtifactStore::new("population", "archive");
//! let mut population = Population::new(config).unwrap();
//!
//! let champion = population
//!     .evolve(&mut renderer, &mut my_classifier, &mut store)
//!     .unwrap();
//! println!("{}: {}", champion.label, champion.fitness);
//! ```
//!
//! ## Architecture
//!
//! ### Innovation Numbers
//!
//! Seed networks are identical in structure, so their genes share ids:
//! inputs `1..=I`, outputs `I+1..=I+O`, connections `1..=I·O` in input-major
//! order. Every structural mutation afterwards draws fresh numbers from the
//! run's counter. Crossover aligns connection genes by innovation.
//!
//! ### Layering
//!
//! Inputs sit on layer 1, every connection (disabled ones included) leaving
//! a node reachable from the inputs points to a strictly higher layer, and
//! all outputs share the top layer. Mutations that would close a cycle are
//! rejected.
//!
//! Crossover keeps every node gene of both parents, so an offspring can hold
//! hidden nodes no input reaches. Those stay on layer 0 and never fire.

pub mod activation;
pub mod codec;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fitness;
pub mod gene;
pub mod genome;
pub mod innovation;
pub mod operators;
pub mod population;
pub mod render;
pub mod storage;
pub mod topology;

// Re-exports for convenience
pub use activation::Activation;
pub use codec::{decode, encode, GenomeRecord};
pub use config::{EvolutionConfig, MutationConfig};
pub use error::{BoxError, CodecError, ConfigError, EvolutionError, MutationError};
pub use fitness::{ClassScores, FitnessEvaluator};
pub use gene::{ConnectionGene, ConnectionId, NodeGene, NodeId, NodeType};
pub use genome::{InputMode, Layout, Network};
pub use innovation::InnovationCounter;
pub use operators::{crossover, mutate, MutationSummary};
pub use population::{select_winners, Champion, GenerationReport, Individual, Population};
pub use render::{render_raster, ImageRenderer, PngRenderer};
pub use storage::{ArtifactStore, FsArtifactStore};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_offspring_pipeline() {
        let layout = Layout::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut innovations = InnovationCounter::after_seed(&layout);

        let mut a = Network::fully_connected(layout, &mut rng);
        let b = Network::fully_connected(layout, &mut rng);
        a.add_node(2, 5, &mut innovations, &mut rng).unwrap();

        let child = crossover(&encode(&a), Some(0.8), &encode(&b), Some(0.3), &mut rng);
        let mut child = decode(&child.unwrap(), layout).unwrap();
        let config = MutationConfig {
            add_node_prob: 1.0,
            ..MutationConfig::default()
        };
        let summary = mutate(&mut child, &mut innovations, &config, &mut rng);

        assert!(summary.added_node.is_some());
        assert_eq!(child.hidden_node_ids().count(), 2);
        assert!(!child.has_cycle());
        assert_eq!(child.query(0.1, 0.2, 255.0).len(), 3);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let counter = InnovationCounter::new(12, 30);
        let json = serde_json::to_string(&counter).unwrap();
        let restored: InnovationCounter = serde_json::from_str(&json).unwrap();
        assert_eq!(counter, restored);

        let layout = Layout::new(InputMode::Planar, 1);
        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(serde_json::from_str::<Layout>(&json).unwrap(), layout);
    }
}
