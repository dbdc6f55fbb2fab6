//! Benchmarks for symbios-cppn.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use symbios_cppn::{
    codec, crossover, mutate, render_raster, select_winners, InnovationCounter, Layout,
    MutationConfig, Network,
};

/// A seed network grown by a run of aggressive mutations.
fn grown(seed: u64, innovations: &mut InnovationCounter) -> Network {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut network = Network::fully_connected(Layout::default(), &mut rng);
    let config = MutationConfig {
        add_node_prob: 0.3,
        add_connection_prob: 0.5,
        ..MutationConfig::default()
    };
    for _ in 0..20 {
        mutate(&mut network, innovations, &config, &mut rng);
    }
    network
}

fn bench_genome_creation(c: &mut Criterion) {
    c.bench_function("network_fully_connected", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| {
            black_box(Network::fully_connected(Layout::default(), &mut rng));
        });
    });
}

fn bench_mutation(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let network = Network::fully_connected(Layout::default(), &mut rng);
    let config = MutationConfig {
        add_node_prob: 0.1,
        add_connection_prob: 0.3,
        ..MutationConfig::default()
    };

    c.bench_function("network_mutation", |b| {
        let mut n = network.clone();
        let mut innovations = InnovationCounter::after_seed(n.layout());
        b.iter(|| {
            mutate(&mut n, &mut innovations, &config, &mut rng);
            black_box(&n);
        });
    });
}

fn bench_crossover(c: &mut Criterion) {
    let mut innovations = InnovationCounter::after_seed(&Layout::default());
    let parent1 = codec::encode(&grown(1, &mut innovations));
    let parent2 = codec::encode(&grown(2, &mut innovations));
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    c.bench_function("genome_crossover", |b| {
        b.iter(|| {
            black_box(crossover(&parent1, Some(0.6), &parent2, Some(0.4), &mut rng))
        });
    });

    c.bench_function("genome_decode", |b| {
        b.iter(|| {
            black_box(codec::decode(&parent1, Layout::default()).unwrap());
        });
    });
}

fn bench_evaluation(c: &mut Criterion) {
    let mut innovations = InnovationCounter::after_seed(&Layout::default());
    let mut network = grown(3, &mut innovations);

    c.bench_function("cppn_query_single", |b| {
        b.iter(|| {
            black_box(network.query(0.5, -0.5, 255.0));
        });
    });

    c.bench_function("cppn_render_32x32", |b| {
        b.iter(|| {
            black_box(render_raster(&mut network, 32, 32));
        });
    });
}

fn bench_selection(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let fitnesses: Vec<f32> = (0..100).map(|i| (i % 10) as f32 / 10.0).collect();

    c.bench_function("select_winners_100", |b| {
        b.iter(|| {
            black_box(select_winners(&fitnesses, &mut rng));
        });
    });
}

criterion_group!(
    benches,
    bench_genome_creation,
    bench_mutation,
    bench_crossover,
    bench_evaluation,
    bench_selection,
);
criterion_main!(benches);
