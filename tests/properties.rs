//! Property tests over random mutation histories.

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use symbios_cppn::operators::breed;
use symbios_cppn::{codec, mutate, InnovationCounter, InputMode, Layout, MutationConfig, Network};

fn layout_strategy() -> impl Strategy<Value = Layout> {
    (prop_oneof![Just(InputMode::Planar), Just(InputMode::Radial)], 1usize..=4)
        .prop_map(|(mode, outputs)| Layout::new(mode, outputs))
}

fn aggressive() -> MutationConfig {
    MutationConfig {
        weight_mutation_prob: 1.0,
        weight_mutation_power: 1.5,
        add_node_prob: 0.4,
        add_connection_prob: 0.6,
        ..MutationConfig::default()
    }
}

/// Grow a seed network through `steps` aggressive mutations.
fn grown(layout: Layout, seed: u64, steps: usize) -> Network {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut innovations = InnovationCounter::after_seed(&layout);
    let mut network = Network::fully_connected(layout, &mut rng);
    let config = aggressive();
    for _ in 0..steps {
        mutate(&mut network, &mut innovations, &config, &mut rng);
    }
    network
}

/// Grow two lineages, cross them with tied fitness and keep mutating the
/// offspring, so it carries nodes neither parent connects for it.
fn bred(layout: Layout, seed: u64, steps: usize) -> Network {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut innovations = InnovationCounter::after_seed(&layout);
    let config = aggressive();
    let mut a = Network::fully_connected(layout, &mut rng);
    let mut b = Network::fully_connected(layout, &mut rng);
    for _ in 0..steps {
        mutate(&mut a, &mut innovations, &config, &mut rng);
        mutate(&mut b, &mut innovations, &config, &mut rng);
    }

    let mut child = breed(&a, Some(0.5), &b, Some(0.5), &mut rng).unwrap();
    for _ in 0..steps {
        mutate(&mut child, &mut innovations, &config, &mut rng);
    }
    child
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn connections_point_to_higher_layers(
        layout in layout_strategy(),
        seed in any::<u64>(),
        steps in 0usize..30,
    ) {
        let network = grown(layout, seed, steps);
        prop_assert!(!network.has_cycle());

        for conn in network.connections() {
            let (source, target) = network.endpoints(conn);
            let from = network.node(source).unwrap().layer;
            let to = network.node(target).unwrap().layer;
            prop_assert!(from < to, "{source}@{from} -> {target}@{to}");
        }

        let out_layer = network.out_layer();
        for id in network.output_node_ids() {
            prop_assert_eq!(network.node(id).unwrap().layer, out_layer);
        }
        for id in network.input_node_ids() {
            prop_assert_eq!(network.node(id).unwrap().layer, 1);
        }
    }

    #[test]
    fn reachable_connections_point_to_higher_layers_after_crossover(
        layout in layout_strategy(),
        seed in any::<u64>(),
        steps in 0usize..20,
        x in -1.0f32..=1.0,
        y in -1.0f32..=1.0,
    ) {
        let mut network = bred(layout, seed, steps);
        prop_assert!(!network.has_cycle());

        // Layer 0 marks hidden nodes no input reaches
        for conn in network.connections() {
            let (source, target) = network.endpoints(conn);
            let from = network.node(source).unwrap().layer;
            let to = network.node(target).unwrap().layer;
            if from > 0 {
                prop_assert!(from < to, "{source}@{from} -> {target}@{to}");
            }
        }
        let out_layer = network.out_layer();
        for id in network.output_node_ids() {
            prop_assert_eq!(network.node(id).unwrap().layer, out_layer);
        }

        prop_assert!(network.query(x, y, 255.0).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn weights_stay_clamped(seed in any::<u64>(), steps in 0usize..30) {
        let network = grown(Layout::default(), seed, steps);
        for conn in network.connections() {
            prop_assert!((-1.0..=1.0).contains(&conn.weight));
        }
    }

    #[test]
    fn codec_round_trip_is_exact(
        layout in layout_strategy(),
        seed in any::<u64>(),
        steps in 0usize..20,
        x in -1.0f32..=1.0,
        y in -1.0f32..=1.0,
    ) {
        let mut network = grown(layout, seed, steps);
        let text = codec::encode(&network);
        let mut restored = codec::decode(&text, layout).unwrap();

        prop_assert_eq!(codec::encode(&restored), text);
        prop_assert_eq!(network.query(x, y, 255.0), restored.query(x, y, 255.0));
    }

    #[test]
    fn evaluation_is_deterministic(seed in any::<u64>(), x in -1.0f32..=1.0, y in -1.0f32..=1.0) {
        let mut network = grown(Layout::default(), seed, 10);
        let first = network.query(x, y, 255.0);
        let second = network.query(x, y, 255.0);
        prop_assert_eq!(first, second);
    }
}
