//! The policy networks driving agents. Only one representation is evolved: a fixed-topology
//! feed-forward network whose arg-max output is a discrete action id.

pub mod feed_forward;

pub use feed_forward::NeuralNetwork;

use thiserror::Error;

pub mod activate {
    use core::f64::consts::E;

    pub fn sigmoid(x: f64) -> f64 {
        1. / (1. + E.powf(-x))
    }

    /// Derivative of [sigmoid], in terms of its output `y`
    pub fn dsigmoid(y: f64) -> f64 {
        y * (1. - y)
    }
}

/// Why a stored network could not be brought back
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("malformed network payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{matrix} is {rows}x{cols}, expected {want_rows}x{want_cols}")]
    Topology {
        matrix: &'static str,
        rows: usize,
        cols: usize,
        want_rows: usize,
        want_cols: usize,
    },
    #[error("network has an empty layer ({input}, {hidden}, {output})")]
    EmptyLayer {
        input: usize,
        hidden: usize,
        output: usize,
    },
}
