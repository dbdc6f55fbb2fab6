//! Activation functions for CPPN nodes.
//!
//! The registry is fixed: every node picks one of four functions, and the
//! function's name is what the genome text encoding stores. Sine and absolute
//! value give CPPNs their periodic and symmetric patterns; sigmoid squashes
//! into `(0, 1)`; identity passes coordinates through untouched.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Activation function types supported by CPPN nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Sigmoid: f(x) = 1 / (1 + e^(-x))
    Sigmoid,
    /// Absolute value: f(x) = |x|
    Abs,
    /// Sine: f(x) = sin(x)
    Sine,
    /// Identity: f(x) = x
    #[default]
    Identity,
}

impl Activation {
    /// The full registry, in encoding order.
    pub const ALL: [Self; 4] = [Self::Sigmoid, Self::Abs, Self::Sine, Self::Identity];

    /// Pick a registry entry uniformly at random.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Name used in the genome text encoding.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sigmoid => "sigmoid",
            Self::Abs => "abs",
            Self::Sine => "sine",
            Self::Identity => "identity",
        }
    }

    /// Apply this activation function to an input value.
    ///
    /// NaN propagates. Infinite inputs map to finite outputs where the
    /// function has a limit.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        if x.is_nan() {
            return f32::NAN;
        }

        match self {
            Self::Sigmoid => {
                if x == f32::INFINITY {
                    return 1.0;
                }
                if x == f32::NEG_INFINITY {
                    return 0.0;
                }
                // sigmoid(-88) ≈ 0, sigmoid(88) ≈ 1; avoids exp overflow
                let clamped = x.clamp(-88.0, 88.0);
                1.0 / (1.0 + (-clamped).exp())
            }
            Self::Abs => x.abs(),
            Self::Sine => {
                if x.is_infinite() {
                    return 0.0;
                }
                x.sin()
            }
            Self::Identity => x,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| CodecError::UnknownActivation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sigmoid() {
        assert!((Activation::Sigmoid.apply(0.0) - 0.5).abs() < 1e-6);
        assert!(Activation::Sigmoid.apply(10.0) > 0.99);
        assert!(Activation::Sigmoid.apply(-10.0) < 0.01);
        assert!((Activation::Sigmoid.apply(f32::INFINITY) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_abs() {
        assert!((Activation::Abs.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Activation::Abs.apply(-0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sine() {
        use std::f32::consts::PI;
        assert!(Activation::Sine.apply(0.0).abs() < 1e-6);
        assert!((Activation::Sine.apply(PI / 2.0) - 1.0).abs() < 1e-6);
        assert_eq!(Activation::Sine.apply(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_identity() {
        assert!((Activation::Identity.apply(-2.0) - -2.0).abs() < 1e-6);
    }

    #[test]
    fn test_nan_propagates() {
        for activation in Activation::ALL {
            assert!(activation.apply(f32::NAN).is_nan());
        }
    }

    #[test]
    fn test_names_parse_back() {
        for activation in Activation::ALL {
            assert_eq!(activation.name().parse::<Activation>().unwrap(), activation);
        }
        assert!(matches!(
            "tanh".parse::<Activation>(),
            Err(CodecError::UnknownActivation(name)) if name == "tanh"
        ));
    }

    #[test]
    fn test_random_covers_registry() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(Activation::random(&mut rng));
        }
        assert_eq!(seen.len(), Activation::ALL.len());
    }
}
