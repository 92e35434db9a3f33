use super::{
    activate::{dsigmoid, sigmoid},
    DeserializationError,
};
use crate::{
    constants::{GYMKHANA_LEARNING_RATE, GYMKHANA_MUTATION_SCALE},
    random::{gaussian, happens},
    serialize::{deserialize_matrix, serialize_matrix},
};
use core::error::Error;
use rand::{Rng, RngCore};
use rulinalg::matrix::{BaseMatrix, BaseMatrixMut, Matrix};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

fn default_learning_rate() -> f64 {
    GYMKHANA_LEARNING_RATE
}

/// A fully connected input → hidden → output network with σ activation on both layers.
///
/// Topology is fixed at construction: nothing here resizes a matrix, and [NeuralNetwork::from_str]
/// refuses payloads whose matrices disagree with the declared node counts.
/// [Clone] is the deep copy used for elitism; clones share no state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNetwork {
    input_nodes: usize,
    hidden_nodes: usize,
    output_nodes: usize,
    /// hidden × input
    #[serde(serialize_with = "serialize_matrix", deserialize_with = "deserialize_matrix")]
    weights_ih: Matrix<f64>,
    /// output × hidden
    #[serde(serialize_with = "serialize_matrix", deserialize_with = "deserialize_matrix")]
    weights_ho: Matrix<f64>,
    /// hidden × 1
    #[serde(serialize_with = "serialize_matrix", deserialize_with = "deserialize_matrix")]
    bias_h: Matrix<f64>,
    /// output × 1
    #[serde(serialize_with = "serialize_matrix", deserialize_with = "deserialize_matrix")]
    bias_o: Matrix<f64>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
}

fn random_matrix(rows: usize, cols: usize, rng: &mut impl RngCore) -> Matrix<f64> {
    Matrix::new(
        rows,
        cols,
        (0..rows * cols)
            .map(|_| rng.random_range(-1.0..=1.0))
            .collect::<Vec<f64>>(),
    )
}

impl NeuralNetwork {
    /// A network with every weight and bias drawn uniformly from [-1, 1]
    pub fn new(
        input_nodes: usize,
        hidden_nodes: usize,
        output_nodes: usize,
        rng: &mut impl RngCore,
    ) -> Self {
        assert!(
            input_nodes > 0 && hidden_nodes > 0 && output_nodes > 0,
            "network layers must be non-empty, got ({input_nodes}, {hidden_nodes}, {output_nodes})"
        );

        Self {
            input_nodes,
            hidden_nodes,
            output_nodes,
            weights_ih: random_matrix(hidden_nodes, input_nodes, rng),
            weights_ho: random_matrix(output_nodes, hidden_nodes, rng),
            bias_h: random_matrix(hidden_nodes, 1, rng),
            bias_o: random_matrix(output_nodes, 1, rng),
            learning_rate: GYMKHANA_LEARNING_RATE,
        }
    }

    #[inline]
    pub fn input_nodes(&self) -> usize {
        self.input_nodes
    }

    #[inline]
    pub fn hidden_nodes(&self) -> usize {
        self.hidden_nodes
    }

    #[inline]
    pub fn output_nodes(&self) -> usize {
        self.output_nodes
    }

    pub fn weights_ih(&self) -> &Matrix<f64> {
        &self.weights_ih
    }

    pub fn weights_ho(&self) -> &Matrix<f64> {
        &self.weights_ho
    }

    pub fn bias_h(&self) -> &Matrix<f64> {
        &self.bias_h
    }

    pub fn bias_o(&self) -> &Matrix<f64> {
        &self.bias_o
    }

    fn layers(&self, inputs: &[f64]) -> (Matrix<f64>, Matrix<f64>, Matrix<f64>) {
        assert_eq!(
            inputs.len(),
            self.input_nodes,
            "network expects {} inputs",
            self.input_nodes
        );

        let inputs = Matrix::new(self.input_nodes, 1, inputs.to_vec());
        let hidden = (&self.weights_ih * &inputs + &self.bias_h).apply(&sigmoid);
        let output = (&self.weights_ho * &hidden + &self.bias_o).apply(&sigmoid);
        (inputs, hidden, output)
    }

    /// Output activations for some input. Panics if `inputs` doesn't match the input layer.
    pub fn feed_forward(&self, inputs: &[f64]) -> Vec<f64> {
        self.layers(inputs).2.into_vec()
    }

    /// The index of the strongest output, ties going to the lowest index
    pub fn predict(&self, inputs: &[f64]) -> usize {
        self.feed_forward(inputs)
            .into_iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(best, best_v), (idx, v)| {
                if v > best_v {
                    (idx, v)
                } else {
                    (best, best_v)
                }
            })
            .0
    }

    /// With probability `rate`, independently nudge every weight and bias by a gaussian
    /// sample scaled by [GYMKHANA_MUTATION_SCALE]
    pub fn mutate(&mut self, rate: f64, rng: &mut impl RngCore) {
        for m in [
            &mut self.weights_ih,
            &mut self.weights_ho,
            &mut self.bias_h,
            &mut self.bias_o,
        ] {
            for v in m.mut_data().iter_mut() {
                if happens(rng, rate) {
                    *v += gaussian(rng) * GYMKHANA_MUTATION_SCALE;
                }
            }
        }
    }

    /// One step of gradient descent towards `targets`. The genetic path never calls this.
    pub fn train(&mut self, inputs: &[f64], targets: &[f64]) {
        assert_eq!(
            targets.len(),
            self.output_nodes,
            "network expects {} targets",
            self.output_nodes
        );

        let (inputs, hidden, outputs) = self.layers(inputs);
        let targets = Matrix::new(self.output_nodes, 1, targets.to_vec());

        let output_errors = targets - &outputs;
        let gradients = outputs.apply(&dsigmoid).elemul(&output_errors) * self.learning_rate;
        let hidden_errors = &self.weights_ho.transpose() * &output_errors;

        self.weights_ho += &gradients * &hidden.transpose();
        self.bias_o += gradients;

        let hidden_gradient = hidden.apply(&dsigmoid).elemul(&hidden_errors) * self.learning_rate;
        self.weights_ih += &hidden_gradient * &inputs.transpose();
        self.bias_h += hidden_gradient;
    }

    fn check_topology(&self) -> Result<(), DeserializationError> {
        if self.input_nodes == 0 || self.hidden_nodes == 0 || self.output_nodes == 0 {
            return Err(DeserializationError::EmptyLayer {
                input: self.input_nodes,
                hidden: self.hidden_nodes,
                output: self.output_nodes,
            });
        }

        for (matrix, m, want_rows, want_cols) in [
            ("weights_ih", &self.weights_ih, self.hidden_nodes, self.input_nodes),
            ("weights_ho", &self.weights_ho, self.output_nodes, self.hidden_nodes),
            ("bias_h", &self.bias_h, self.hidden_nodes, 1),
            ("bias_o", &self.bias_o, self.output_nodes, 1),
        ] {
            if (m.rows(), m.cols()) != (want_rows, want_cols) {
                return Err(DeserializationError::Topology {
                    matrix,
                    rows: m.rows(),
                    cols: m.cols(),
                    want_rows,
                    want_cols,
                });
            }
        }

        Ok(())
    }

    pub fn to_string(&self) -> Result<String, Box<dyn Error>> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, DeserializationError> {
        let network: Self = serde_json::from_str(s)?;
        network.check_topology()?;
        Ok(network)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        Ok(Self::from_str(&fs::read_to_string(path)?)?)
    }

    /// A network that picks `action` regardless of its input
    #[cfg(test)]
    pub(crate) fn always(input_nodes: usize, output_nodes: usize, action: usize) -> Self {
        let mut bias_o = Matrix::zeros(output_nodes, 1);
        bias_o.mut_data()[action] = 1.;
        Self {
            input_nodes,
            hidden_nodes: 1,
            output_nodes,
            weights_ih: Matrix::zeros(1, input_nodes),
            weights_ho: Matrix::zeros(output_nodes, 1),
            bias_h: Matrix::zeros(1, 1),
            bias_o,
            learning_rate: GYMKHANA_LEARNING_RATE,
        }
    }
}
