//! Plain-text genome encoding.
//!
//! A genome is written as `<nodes>|<connections>`. Records within a section
//! are joined by `:` and fields within a record by `;`:
//!
//! - node: `id;activation;layer`
//! - connection: `innovation;source;target;weight;enabled` (`enabled` is `0` or `1`)
//!
//! ```text
//! 1;identity;1:2;identity;1:3;sigmoid;2|1;1;3;0.25;1:2;2;3;-0.5;0
//! ```
//!
//! Layers are written for inspection only; decoding recomputes them. Node
//! roles are not stored either: the [`Layout`] assigns them by id.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::activation::Activation;
use crate::error::CodecError;
use crate::gene::{ConnectionGene, NodeGene, NodeId, NodeType};
use crate::genome::{Layout, Network};

/// Separator between the fields of one record.
pub const FIELD_SEPARATOR: char = ';';
/// Separator between records of one section.
pub const RECORD_SEPARATOR: char = ':';
/// Separator between the node and connection sections.
pub const SECTION_SEPARATOR: char = '|';

/// One encoded node gene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRecord {
    pub id: u64,
    pub activation: Activation,
    pub layer: u32,
}

/// One encoded connection gene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionRecord {
    pub innovation: u64,
    pub source: u64,
    pub target: u64,
    pub weight: f32,
    pub enabled: bool,
}

/// A whole genome as flat gene lists, independent of any arena.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenomeRecord {
    pub nodes: Vec<NodeRecord>,
    pub connections: Vec<ConnectionRecord>,
}

fn split_fields<'a>(
    kind: &'static str,
    record: &'a str,
    expected: usize,
) -> Result<Vec<&'a str>, CodecError> {
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
    if fields.len() != expected {
        return Err(CodecError::FieldCount {
            kind,
            record: record.to_string(),
            found: fields.len(),
            expected,
        });
    }
    Ok(fields)
}

fn parse_number<T: FromStr>(field: &'static str, value: &str) -> Result<T, CodecError> {
    value.parse().map_err(|_| CodecError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn split_records(section: &str) -> impl Iterator<Item = &str> {
    section
        .split(RECORD_SEPARATOR)
        .filter(|record| !record.is_empty())
}

impl fmt::Display for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            self.id, self.activation, self.layer
        )
    }
}

impl FromStr for NodeRecord {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = split_fields("node", s, 3)?;
        Ok(Self {
            id: parse_number("node id", fields[0])?,
            activation: fields[1].parse()?,
            layer: parse_number("layer", fields[2])?,
        })
    }
}

impl fmt::Display for ConnectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            self.innovation,
            self.source,
            self.target,
            self.weight,
            u8::from(self.enabled)
        )
    }
}

impl FromStr for ConnectionRecord {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = split_fields("connection", s, 5)?;
        let enabled = match fields[4] {
            "1" => true,
            "0" => false,
            other => return Err(CodecError::InvalidFlag(other.to_string())),
        };
        Ok(Self {
            innovation: parse_number("innovation", fields[0])?,
            source: parse_number("source id", fields[1])?,
            target: parse_number("target id", fields[2])?,
            weight: parse_number("weight", fields[3])?,
            enabled,
        })
    }
}

impl fmt::Display for GenomeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, "{RECORD_SEPARATOR}")?;
            }
            write!(f, "{node}")?;
        }
        write!(f, "{SECTION_SEPARATOR}")?;
        for (i, conn) in self.connections.iter().enumerate() {
            if i > 0 {
                write!(f, "{RECORD_SEPARATOR}")?;
            }
            write!(f, "{conn}")?;
        }
        Ok(())
    }
}

impl FromStr for GenomeRecord {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (nodes, connections) = s
            .trim()
            .split_once(SECTION_SEPARATOR)
            .ok_or(CodecError::MissingSection)?;

        Ok(Self {
            nodes: split_records(nodes)
                .map(str::parse::<NodeRecord>)
                .collect::<Result<_, _>>()?,
            connections: split_records(connections)
                .map(str::parse::<ConnectionRecord>)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl GenomeRecord {
    /// Snapshot a network's genes in internal order.
    #[must_use]
    pub fn from_network(network: &Network) -> Self {
        let nodes = network
            .nodes()
            .map(|node| NodeRecord {
                id: node.id,
                activation: node.activation,
                layer: node.layer,
            })
            .collect();
        let connections = network
            .connections()
            .map(|conn| {
                let (source, target) = network.endpoints(conn);
                ConnectionRecord {
                    innovation: conn.innovation,
                    source,
                    target,
                    weight: conn.weight,
                    enabled: conn.enabled,
                }
            })
            .collect();
        Self { nodes, connections }
    }

    /// Rebuild a network, classifying nodes by `layout`.
    ///
    /// Inputs and outputs are ordered by id; hidden nodes and connections keep
    /// their record order. Layers are recomputed.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] on duplicate ids, connections referencing
    /// undeclared nodes or violating the input/output roles, layout nodes
    /// missing from the record, and connections closing a cycle.
    pub fn into_network(self, layout: Layout) -> Result<Network, CodecError> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(node.id) {
                return Err(CodecError::DuplicateNode(node.id));
            }
        }
        for id in layout.input_node_ids().chain(layout.output_node_ids()) {
            if !seen.contains(&id) {
                return Err(CodecError::MissingLayoutNode(id));
            }
        }

        let mut inputs = Vec::with_capacity(layout.num_inputs());
        let mut outputs = Vec::with_capacity(layout.num_outputs);
        let mut hidden = Vec::new();
        for node in self.nodes {
            match layout.role_of(node.id) {
                NodeType::Input => inputs.push(NodeGene::input(node.id, node.activation)),
                NodeType::Output => outputs.push(NodeGene::output(node.id, node.activation)),
                NodeType::Hidden => hidden.push(NodeGene::hidden(node.id, node.activation)),
            }
        }
        inputs.sort_by_key(|n| n.id);
        outputs.sort_by_key(|n| n.id);

        let mut network = Network::empty(layout);
        let mut keys: HashMap<u64, NodeId> = HashMap::new();
        for node in inputs.into_iter().chain(outputs).chain(hidden) {
            let id = node.id;
            keys.insert(id, network.push_node(node));
        }

        let mut innovations = HashSet::with_capacity(self.connections.len());
        for conn in self.connections {
            if !innovations.insert(conn.innovation) {
                return Err(CodecError::DuplicateConnection(conn.innovation));
            }
            let lookup = |node: u64| {
                keys.get(&node)
                    .copied()
                    .ok_or(CodecError::DanglingReference {
                        innovation: conn.innovation,
                        node,
                    })
            };
            let source = lookup(conn.source)?;
            let target = lookup(conn.target)?;

            if conn.source == conn.target
                || layout.role_of(conn.target) == NodeType::Input
                || layout.role_of(conn.source) == NodeType::Output
            {
                return Err(CodecError::InvalidEndpoint {
                    innovation: conn.innovation,
                    from: conn.source,
                    to: conn.target,
                });
            }

            let mut gene = ConnectionGene::new(conn.innovation, source, target, conn.weight);
            gene.enabled = conn.enabled;
            network.connections.insert(gene);
        }

        network.update_conns();
        if let Some(innovation) = network.find_cycle() {
            return Err(CodecError::Cycle(innovation));
        }

        network.update();
        Ok(network)
    }
}

/// Encode a network as genome text.
#[must_use]
pub fn encode(network: &Network) -> String {
    GenomeRecord::from_network(network).to_string()
}

/// Decode genome text into a network with the given layout.
///
/// # Errors
///
/// Any malformed or inconsistent encoding is a [`CodecError`]; nothing is
/// repaired silently.
pub fn decode(text: &str, layout: Layout) -> Result<Network, CodecError> {
    text.parse::<GenomeRecord>()?.into_network(layout)
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&GenomeRecord::from_network(self), f)
    }
}
