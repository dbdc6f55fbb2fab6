//! Forward evaluation of a CPPN.
//!
//! Evaluation is a single ascending sweep over layers: inputs, then each
//! middle layer, then the outputs. Activating a node consumes its
//! accumulator and pushes `weight × value` into each target's accumulator.
//! Because every enabled connection points to a strictly higher layer, all
//! contributions to a node have arrived before its layer fires.

use crate::gene::NodeId;
use crate::genome::{InputMode, Network};

impl Network {
    /// Evaluate the network, writing scaled outputs into a provided buffer.
    ///
    /// This is the allocation-free version for hot paths like rendering.
    ///
    /// # Panics
    ///
    /// Panics if input or output length doesn't match the network layout.
    pub fn evaluate_into(&mut self, inputs: &[f32], scale: f32, outputs: &mut [f32]) {
        assert_eq!(
            inputs.len(),
            self.input_ids.len(),
            "Input length mismatch: expected {}, got {}",
            self.input_ids.len(),
            inputs.len()
        );
        assert_eq!(
            outputs.len(),
            self.output_ids.len(),
            "Output length mismatch: expected {}, got {}",
            self.output_ids.len(),
            outputs.len()
        );

        // Unreachable or dead-end hidden nodes may still hold signal
        for node in self.nodes.values_mut() {
            node.accumulator = 0.0;
        }

        for (i, &value) in inputs.iter().enumerate() {
            let id = self.input_ids[i];
            self.nodes[id].accumulator = value;
        }

        for i in 0..self.input_ids.len() {
            self.activate(self.input_ids[i]);
        }

        for layer in 0..self.middle_layers.len() {
            for i in 0..self.middle_layers[layer].len() {
                self.activate(self.middle_layers[layer][i]);
            }
        }

        for (i, out) in outputs.iter_mut().enumerate() {
            *out = self.activate(self.output_ids[i]) * scale;
        }
    }

    /// Evaluate the network with given inputs.
    ///
    /// Returns one value per output node, multiplied by `scale`.
    ///
    /// # Panics
    ///
    /// Panics if input length doesn't match the number of input nodes.
    pub fn evaluate(&mut self, inputs: &[f32], scale: f32) -> Vec<f32> {
        let mut outputs = vec![0.0; self.output_ids.len()];
        self.evaluate_into(inputs, scale, &mut outputs);
        outputs
    }

    /// Query with planar coordinates `[x, y]`.
    #[inline]
    pub fn query_2d(&mut self, x: f32, y: f32, scale: f32) -> Vec<f32> {
        self.evaluate(&[x, y], scale)
    }

    /// Query with `[x, y, d]` where `d = sqrt(x² + y²)`.
    #[inline]
    pub fn query_2d_with_distance(&mut self, x: f32, y: f32, scale: f32) -> Vec<f32> {
        self.evaluate(&[x, y, x.hypot(y)], scale)
    }

    /// Query a coordinate, deriving inputs from the layout's input mode.
    pub fn query(&mut self, x: f32, y: f32, scale: f32) -> Vec<f32> {
        match self.layout.input_mode {
            InputMode::Planar => self.query_2d(x, y, scale),
            InputMode::Radial => self.query_2d_with_distance(x, y, scale),
        }
    }

    /// Fire one node: apply its activation to the drained accumulator and
    /// forward the result along its outgoing connections.
    fn activate(&mut self, id: NodeId) -> f32 {
        let node = &mut self.nodes[id];
        let value = node.activation.apply(node.accumulator);
        node.accumulator = 0.0;

        for i in 0..self.nodes[id].out_conns.len() {
            let conn = &self.connections[self.nodes[id].out_conns[i]];
            let signal = conn.transmit(value);
            self.nodes[conn.output].accumulator += signal;
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use crate::activation::Activation;
    use crate::genome::{InputMode, Layout, Network};
    use crate::innovation::InnovationCounter;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn planar() -> Layout {
        Layout::new(InputMode::Planar, 3)
    }

    /// Seed network with every weight set.
    fn seed_with_weight(weight: f32, rng: &mut ChaCha8Rng) -> Network {
        let mut network = Network::fully_connected(planar(), rng);
        for innovation in 1..=6 {
            network.set_weight(innovation, weight);
        }
        network
    }

    #[test]
    fn test_zero_weights_yield_activation_of_zero() {
        let mut rng = test_rng();
        let mut network = seed_with_weight(0.0, &mut rng);
        network.set_activation(3, Activation::Sigmoid);
        network.set_activation(4, Activation::Sine);
        network.set_activation(5, Activation::Abs);

        let outputs = network.evaluate(&[0.0, 0.0], 255.0);
        assert_eq!(outputs.len(), 3);
        assert!((outputs[0] - 127.5).abs() < 1e-4);
        assert!(outputs[1].abs() < 1e-6);
        assert!(outputs[2].abs() < 1e-6);

        // Inputs don't matter with zero weights
        let again = network.evaluate(&[0.7, -0.2], 255.0);
        assert_eq!(outputs, again);
    }

    #[test]
    fn test_evaluator_deterministic() {
        let mut rng = test_rng();
        let mut network = Network::fully_connected(planar(), &mut rng);
        let mut innovations = InnovationCounter::after_seed(network.layout());
        let a = network.add_node(1, 3, &mut innovations, &mut rng).unwrap();
        network.add_node(a, 4, &mut innovations, &mut rng).unwrap();

        let outputs1 = network.evaluate(&[0.5, -0.5], 1.0);
        let outputs2 = network.evaluate(&[0.5, -0.5], 1.0);

        assert_eq!(outputs1, outputs2, "Evaluation should be deterministic");
    }

    #[test]
    fn test_identity_network_sums_inputs() {
        let mut rng = test_rng();
        let mut network = seed_with_weight(0.5, &mut rng);
        for id in 3..=5 {
            network.set_activation(id, Activation::Identity);
        }

        let outputs = network.evaluate(&[0.4, 0.2], 2.0);
        for value in outputs {
            assert!((value - 0.6).abs() < 1e-6);
        }
    }

    #[test]
    fn test_signal_routes_through_hidden_node() {
        let mut rng = test_rng();
        let mut network = seed_with_weight(0.0, &mut rng);
        for id in 3..=5 {
            network.set_activation(id, Activation::Identity);
        }
        let mut innovations = InnovationCounter::new(6, 7);
        let hidden = network.add_node(1, 3, &mut innovations, &mut rng).unwrap();
        network.set_activation(hidden, Activation::Identity);
        network.set_weight(7, 0.5);
        network.set_weight(8, 0.5);

        let outputs = network.evaluate(&[1.0, 1.0], 1.0);
        assert!((outputs[0] - 0.25).abs() < 1e-6);
        assert!(outputs[1].abs() < 1e-6);
    }

    #[test]
    fn test_radial_query_feeds_distance() {
        let mut rng = test_rng();
        let layout = Layout::new(InputMode::Radial, 1);
        let mut network = Network::fully_connected(layout, &mut rng);
        network.set_activation(4, Activation::Identity);
        network.set_weight(1, 0.0);
        network.set_weight(2, 0.0);
        network.set_weight(3, 1.0);

        let outputs = network.query(0.6, 0.8, 1.0);
        assert!((outputs[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "Input length mismatch")]
    fn test_evaluator_input_mismatch() {
        let mut rng = test_rng();
        let mut network = Network::fully_connected(planar(), &mut rng);
        network.evaluate(&[1.0], 1.0);
    }
}
