//! Evolve CPPN images toward a synthetic "bright" class.
//!
//! A stand-in classifier scores each rendered PNG by its mean brightness, so
//! the run converges without an external model. Images land in
//! `<out>/population`, each generation's winner in `<out>/archive`.
//!
//! Run with: `RUST_LOG=info cargo run --example evolve_brightness [config.json] [out_dir]`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use symbios_cppn::{
    BoxError, ClassScores, EvolutionConfig, FsArtifactStore, PngRenderer, Population,
};

/// Mean channel intensity in `[0, 1]` as the score for "bright", its
/// complement as the score for "dark".
fn brightness_classifier(image: &Path) -> Result<ClassScores, BoxError> {
    let image = image::open(image)?.to_rgb8();
    let total: u64 = image.pixels().flat_map(|p| p.0).map(u64::from).sum();
    let samples = u64::from(image.width()) * u64::from(image.height()) * 3;
    let mean = total as f32 / (samples as f32 * 255.0);
    Ok(HashMap::from([
        ("bright".to_string(), mean),
        ("dark".to_string(), 1.0 - mean),
    ]))
}

fn main() -> Result<(), BoxError> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => EvolutionConfig::load(path)?,
        None => EvolutionConfig {
            image_width: 64,
            image_height: 64,
            target_fitness: 0.9,
            max_generations: Some(200),
            seed: Some(42),
            ..EvolutionConfig::with_goal("bright")
        },
    };
    let out = args
        .get(2)
        .map_or_else(|| PathBuf::from("cppn_run"), PathBuf::from);

    println!("CPPN Brightness Example");
    println!("=======================\n");
    println!("Goal: {}", config.goal);
    println!("Population: {}", config.population_size);
    println!("Image: {}x{}", config.image_width, config.image_height);

    let population_dir = out.join("population");
    let mut renderer = PngRenderer::new(&population_dir, config.image_width, config.image_height)
        .with_scale(config.output_scale);
    let mut store = FsArtifactStore::new(&population_dir, out.join("archive"));
    let mut population = Population::new(config)?;
    println!("Images: {}", renderer.dir().display());
    println!("Archive: {}", store.archive_dir().display());
    println!();

    let champion = population.evolve(&mut renderer, &mut brightness_classifier, &mut store)?;

    println!("Evolution Complete!");
    println!("==================");
    println!("Champion: {} (generation {})", champion.label, champion.generation);
    println!("Fitness: {:.4}", champion.fitness);
    println!("Nodes: {}", champion.network.num_nodes());
    println!(
        "Enabled connections: {}",
        champion.network.num_enabled_connections()
    );
    println!(
        "Hidden nodes: {}",
        champion.network.hidden_node_ids().count()
    );
    println!("Genome: {}", champion.genome);

    Ok(())
}
