//! Run-wide innovation tracking.
//!
//! Node ids and connection innovation numbers come from two monotonically
//! increasing counters shared by every structural mutation of one evolutionary
//! run. The counters live in an explicit [`InnovationCounter`] that callers
//! pass to the operators, so independent runs (and tests) never share state.

use serde::{Deserialize, Serialize};

use crate::genome::Layout;

/// The next free node id and connection innovation number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnovationCounter {
    next_node: u64,
    next_connection: u64,
}

impl InnovationCounter {
    /// Start from explicit values.
    #[must_use]
    pub const fn new(next_node: u64, next_connection: u64) -> Self {
        Self {
            next_node,
            next_connection,
        }
    }

    /// Counters positioned just past the ids used by the seed topology of
    /// `layout`: one id per input and output node, one innovation per
    /// input-output connection.
    #[must_use]
    pub fn after_seed(layout: &Layout) -> Self {
        let nodes = (layout.num_inputs() + layout.num_outputs) as u64;
        let connections = (layout.num_inputs() * layout.num_outputs) as u64;
        Self::new(nodes + 1, connections + 1)
    }

    /// The id the next added node will receive.
    #[must_use]
    pub const fn peek_node(&self) -> u64 {
        self.next_node
    }

    /// The innovation the next added connection will receive.
    #[must_use]
    pub const fn peek_connection(&self) -> u64 {
        self.next_connection
    }

    /// Take the next node id.
    pub fn allocate_node(&mut self) -> u64 {
        let id = self.next_node;
        self.next_node += 1;
        id
    }

    /// Take the next connection innovation number.
    pub fn allocate_connection(&mut self) -> u64 {
        let id = self.next_connection;
        self.next_connection += 1;
        id
    }
}
