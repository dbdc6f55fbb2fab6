//! Genetic operators: weight perturbation, random structural mutation and
//! innovation-aligned crossover.
//!
//! Structural mutation draws endpoint pairs uniformly from all nodes and
//! retries rejected pairs up to a budget. Crossover works on genome
//! encodings, aligning connection genes by innovation number.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand_distr::StandardNormal;

use crate::codec::{self, ConnectionRecord, GenomeRecord};
use crate::config::MutationConfig;
use crate::error::{CodecError, MutationError};
use crate::genome::Network;
use crate::innovation::InnovationCounter;

/// What [`mutate`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationSummary {
    /// Whether the weight perturbation gate fired.
    pub perturbed_weights: bool,
    /// Id of the hidden node added, if any.
    pub added_node: Option<u64>,
    /// Innovation of the connection added, if any.
    pub added_connection: Option<u64>,
}

/// Perturb enabled connection weights with Gaussian noise.
///
/// Each enabled connection is hit with probability `per_connection_prob`;
/// results are clamped to `[-1, 1]`.
pub fn perturb_weights<R: Rng>(
    network: &mut Network,
    per_connection_prob: f32,
    power: f32,
    rng: &mut R,
) {
    for conn in network.connections.values_mut() {
        if conn.enabled && rng.random::<f32>() < per_connection_prob {
            let noise: f32 = rng.sample(StandardNormal);
            conn.weight = (conn.weight + noise * power).clamp(-1.0, 1.0);
        }
    }
}

fn random_pair<R: Rng>(ids: &[u64], rng: &mut R) -> (u64, u64) {
    (
        ids[rng.random_range(0..ids.len())],
        ids[rng.random_range(0..ids.len())],
    )
}

/// Add a hidden node between a random valid pair of nodes.
///
/// # Errors
///
/// Returns [`MutationError::RetryBudgetExhausted`] when `max_attempts`
/// random pairs were all rejected.
pub fn add_random_node<R: Rng>(
    network: &mut Network,
    innovations: &mut InnovationCounter,
    max_attempts: usize,
    rng: &mut R,
) -> Result<u64, MutationError> {
    let ids: Vec<u64> = network.nodes().map(|n| n.id).collect();
    for _ in 0..max_attempts {
        let (before, after) = random_pair(&ids, rng);
        if let Ok(node) = network.add_node(before, after, innovations, rng) {
            log::debug!("added node {node} between {before} and {after}");
            return Ok(node);
        }
    }
    Err(MutationError::RetryBudgetExhausted {
        attempts: max_attempts,
    })
}

/// Add a connection between a random valid pair of nodes.
///
/// # Errors
///
/// Returns [`MutationError::RetryBudgetExhausted`] when `max_attempts`
/// random pairs were all rejected.
pub fn add_random_connection<R: Rng>(
    network: &mut Network,
    innovations: &mut InnovationCounter,
    max_attempts: usize,
    rng: &mut R,
) -> Result<u64, MutationError> {
    let ids: Vec<u64> = network.nodes().map(|n| n.id).collect();
    for _ in 0..max_attempts {
        let (source, target) = random_pair(&ids, rng);
        if let Ok(innovation) = network.add_connection(source, target, innovations, rng) {
            log::debug!("added connection {innovation}: {source} -> {target}");
            return Ok(innovation);
        }
    }
    Err(MutationError::RetryBudgetExhausted {
        attempts: max_attempts,
    })
}

/// Mutate one offspring in place.
///
/// Weight perturbation and structural growth are independent gates; at most
/// one structural mutation happens, add-node taking precedence. An exhausted
/// retry budget is logged and leaves the topology unchanged.
pub fn mutate<R: Rng>(
    network: &mut Network,
    innovations: &mut InnovationCounter,
    config: &MutationConfig,
    rng: &mut R,
) -> MutationSummary {
    let mut summary = MutationSummary::default();

    if rng.random::<f32>() < config.weight_mutation_prob {
        perturb_weights(
            network,
            config.weight_perturb_prob,
            config.weight_mutation_power,
            rng,
        );
        summary.perturbed_weights = true;
    }

    if rng.random::<f32>() < config.add_node_prob {
        match add_random_node(network, innovations, config.max_structural_attempts, rng) {
            Ok(node) => summary.added_node = Some(node),
            Err(err) => log::warn!("add-node mutation skipped: {err}"),
        }
    } else if rng.random::<f32>() < config.add_connection_prob {
        match add_random_connection(network, innovations, config.max_structural_attempts, rng) {
            Ok(innovation) => summary.added_connection = Some(innovation),
            Err(err) => log::warn!("add-connection mutation skipped: {err}"),
        }
    }

    summary
}

/// Which parent contributes its unique (disjoint and excess) genes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dominance {
    A,
    B,
    Tie,
}

impl Dominance {
    fn of(fitness_a: Option<f32>, fitness_b: Option<f32>) -> Self {
        match (fitness_a, fitness_b) {
            (Some(a), Some(b)) if a > b => Self::A,
            (Some(a), Some(b)) if b > a => Self::B,
            _ => Self::Tie,
        }
    }
}

/// Whether `to` is reachable from `from` in a successor map of node ids.
fn reaches(successors: &HashMap<u64, Vec<u64>>, from: u64, to: u64) -> bool {
    let mut stack = vec![from];
    let mut visited = HashSet::new();
    while let Some(node) = stack.pop() {
        if node == to {
            return true;
        }
        if visited.insert(node) {
            if let Some(next) = successors.get(&node) {
                stack.extend(next);
            }
        }
    }
    false
}

/// Cross two parsed genomes.
///
/// Node genes are the union of both parents, first occurrence winning.
/// Matching connection genes come from either parent with equal probability.
/// Unique connection genes come from the strictly fitter parent, or from
/// both when fitness is tied or unknown. A gene that would close a cycle with
/// the genes already inherited is left out.
///
/// Hidden nodes whose connections were not inherited stay in the offspring
/// unreachable from the inputs. They sit on layer 0, are never fired, and
/// edges later added between two of them are exempt from layer ordering.
pub fn crossover_records<R: Rng>(
    parent_a: &GenomeRecord,
    fitness_a: Option<f32>,
    parent_b: &GenomeRecord,
    fitness_b: Option<f32>,
    rng: &mut R,
) -> GenomeRecord {
    let mut seen = HashSet::with_capacity(parent_a.nodes.len() + parent_b.nodes.len());
    let nodes = parent_a
        .nodes
        .iter()
        .chain(&parent_b.nodes)
        .filter(|node| seen.insert(node.id))
        .copied()
        .collect();

    let genes_a: HashMap<u64, &ConnectionRecord> = parent_a
        .connections
        .iter()
        .map(|c| (c.innovation, c))
        .collect();
    let genes_b: HashMap<u64, &ConnectionRecord> = parent_b
        .connections
        .iter()
        .map(|c| (c.innovation, c))
        .collect();

    let mut connections: Vec<ConnectionRecord> = parent_a
        .connections
        .iter()
        .filter_map(|a| {
            genes_b
                .get(&a.innovation)
                .map(|&b| if rng.random_bool(0.5) { *a } else { *b })
        })
        .collect();

    let dominance = Dominance::of(fitness_a, fitness_b);
    if dominance != Dominance::B {
        connections.extend(
            parent_a
                .connections
                .iter()
                .filter(|c| !genes_b.contains_key(&c.innovation)),
        );
    }
    if dominance != Dominance::A {
        connections.extend(
            parent_b
                .connections
                .iter()
                .filter(|c| !genes_a.contains_key(&c.innovation)),
        );
    }

    let mut successors: HashMap<u64, Vec<u64>> = HashMap::new();
    connections.retain(|gene| {
        if reaches(&successors, gene.target, gene.source) {
            log::debug!(
                "offspring skips connection {} closing a cycle",
                gene.innovation
            );
            return false;
        }
        successors.entry(gene.source).or_default().push(gene.target);
        true
    });

    GenomeRecord { nodes, connections }
}

/// Cross two genome encodings, returning the offspring encoding.
///
/// # Errors
///
/// Returns a [`CodecError`] if either parent encoding is malformed.
pub fn crossover<R: Rng>(
    parent_a: &str,
    fitness_a: Option<f32>,
    parent_b: &str,
    fitness_b: Option<f32>,
    rng: &mut R,
) -> Result<String, CodecError> {
    let a: GenomeRecord = parent_a.parse()?;
    let b: GenomeRecord = parent_b.parse()?;
    let child = crossover_records(&a, fitness_a, &b, fitness_b, rng);
    Ok(child.to_string())
}

/// Cross two networks and rebuild the offspring with `parent_a`'s layout.
///
/// # Errors
///
/// Returns a [`CodecError`] if the merged genes cannot form a network.
pub fn breed<R: Rng>(
    parent_a: &Network,
    fitness_a: Option<f32>,
    parent_b: &Network,
    fitness_b: Option<f32>,
    rng: &mut R,
) -> Result<Network, CodecError> {
    let offspring = crossover(
        &codec::encode(parent_a),
        fitness_a,
        &codec::encode(parent_b),
        fitness_b,
        rng,
    )?;
    codec::decode(&offspring, *parent_a.layout())
}
