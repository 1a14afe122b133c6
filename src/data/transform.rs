use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scales a raw `u8` pixel to `[0, 1]` and then standardises it:
/// `(p / 255 - mean) / std`.
///
/// The default `mean = std = 0.5` maps pixels onto `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalize {
    pub mean: f64,
    pub std: f64,
}

impl Default for Normalize {
    fn default() -> Self {
        Normalize { mean: 0.5, std: 0.5 }
    }
}

impl Normalize {
    /// `std` must be finite and strictly positive.
    pub fn new(mean: f64, std: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(Error::invalid_config(format!("normalize mean must be finite, got {mean}")));
        }
        if !(std.is_finite() && std > 0.0) {
            return Err(Error::invalid_config(format!(
                "normalize std must be finite and > 0, got {std}"
            )));
        }
        Ok(Normalize { mean, std })
    }

    pub fn apply(&self, pixel: u8) -> f64 {
        (pixel as f64 / 255.0 - self.mean) / self.std
    }

    pub fn apply_unit(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    /// Inverse of `apply`, in `[0, 1]` units.
    pub fn denormalize(&self, value: f64) -> f64 {
        value * self.std + self.mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_maps_onto_minus_one_one() {
        let n = Normalize::default();
        assert_relative_eq!(n.apply(0), -1.0);
        assert_relative_eq!(n.apply(255), 1.0);
        assert_relative_eq!(n.denormalize(n.apply(51)), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_std_is_rejected() {
        assert!(matches!(Normalize::new(0.5, 0.0), Err(Error::InvalidConfig(_))));
        assert!(Normalize::new(0.5, -1.0).is_err());
        assert!(Normalize::new(0.5, f64::NAN).is_err());
        assert!(Normalize::new(f64::INFINITY, 0.5).is_err());

        let n = Normalize::new(0.1307, 0.3081).unwrap();
        assert_relative_eq!(n.apply_unit(0.1307), 0.0);
    }
}
