//! Vasicek short-rate model.
//!
//! dr = a (b - r) dt + sigma dW
//!
//! The process is an Ornstein-Uhlenbeck diffusion whose conditional
//! distribution is Gaussian, so the transition is sampled exactly:
//!
//! r' = b + (r - b) e^{-a dt} + sigma sqrt((1 - e^{-2 a dt}) / (2a)) Z
//!
//! Rates may go negative; that is a property of the model, not a bug.

use crate::error::ModelError;

/// Threshold below which mean reversion is treated as zero and the exact
/// transition degrades to arithmetic Brownian motion.
const MEAN_REVERSION_EPS: f64 = 1e-12;

/// Parameters of a Vasicek short-rate process.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VasicekParams {
    /// Initial short rate.
    pub initial_rate: f64,
    /// Mean-reversion speed `a`, non-negative.
    pub mean_reversion: f64,
    /// Long-run mean level `b`.
    pub long_rate: f64,
    /// Volatility, non-negative.
    pub volatility: f64,
}

impl VasicekParams {
    /// Creates validated Vasicek parameters.
    ///
    /// # Errors
    /// - [`ModelError::InvalidMeanReversion`] if `mean_reversion < 0`
    /// - [`ModelError::InvalidVolatility`] if `volatility < 0`
    /// - [`ModelError::NotFinite`] if any value is NaN or infinite
    pub fn new(
        initial_rate: f64,
        mean_reversion: f64,
        long_rate: f64,
        volatility: f64,
    ) -> Result<Self, ModelError> {
        let params = Self {
            initial_rate,
            mean_reversion,
            long_rate,
            volatility,
        };
        params.validate()?;
        Ok(params)
    }

    /// Re-checks the parameter constraints.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.initial_rate.is_finite() {
            return Err(ModelError::NotFinite("initial_rate"));
        }
        if !self.mean_reversion.is_finite() {
            return Err(ModelError::NotFinite("mean_reversion"));
        }
        if !self.long_rate.is_finite() {
            return Err(ModelError::NotFinite("long_rate"));
        }
        if !self.volatility.is_finite() {
            return Err(ModelError::NotFinite("volatility"));
        }
        if self.mean_reversion < 0.0 {
            return Err(ModelError::InvalidMeanReversion(self.mean_reversion));
        }
        if self.volatility < 0.0 {
            return Err(ModelError::InvalidVolatility(self.volatility));
        }
        Ok(())
    }

    /// Advances a rate by `dt` using the exact OU transition.
    ///
    /// In the `a -> 0` limit the conditional variance tends to
    /// `sigma^2 dt` and the step reduces to `r + sigma sqrt(dt) Z`.
    #[inline]
    pub fn step(&self, rate: f64, dt: f64, z: f64) -> f64 {
        let a = self.mean_reversion;
        if a < MEAN_REVERSION_EPS {
            return rate + self.volatility * dt.sqrt() * z;
        }
        let decay = (-a * dt).exp();
        let mean = self.long_rate + (rate - self.long_rate) * decay;
        let std = self.volatility * ((1.0 - decay * decay) / (2.0 * a)).sqrt();
        mean + std * z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_validates() {
        assert!(VasicekParams::new(0.03, 0.5, 0.04, 0.01).is_ok());
        assert_eq!(
            VasicekParams::new(0.03, -0.5, 0.04, 0.01),
            Err(ModelError::InvalidMeanReversion(-0.5))
        );
        assert_eq!(
            VasicekParams::new(0.03, 0.5, 0.04, -0.01),
            Err(ModelError::InvalidVolatility(-0.01))
        );
    }

    #[test]
    fn test_step_mean_reverts() {
        // With z = 0 the rate moves towards the long-run mean.
        let params = VasicekParams::new(0.10, 1.0, 0.04, 0.01).unwrap();
        let next = params.step(0.10, 1.0, 0.0);
        assert!(next < 0.10);
        assert!(next > 0.04);
        let expected = 0.04 + (0.10 - 0.04) * (-1.0_f64).exp();
        assert_relative_eq!(next, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_step_long_horizon_converges_to_mean() {
        let params = VasicekParams::new(0.10, 2.0, 0.04, 0.0).unwrap();
        let next = params.step(0.10, 50.0, 0.0);
        assert_relative_eq!(next, 0.04, epsilon = 1e-10);
    }

    #[test]
    fn test_step_zero_mean_reversion_is_brownian() {
        let params = VasicekParams::new(0.03, 0.0, 0.04, 0.02).unwrap();
        let next = params.step(0.03, 0.25, 1.5);
        assert_relative_eq!(next, 0.03 + 0.02 * 0.5 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_conditional_std_matches_ou_formula() {
        let params = VasicekParams::new(0.03, 0.8, 0.03, 0.015).unwrap();
        // Difference of the z = 1 and z = 0 steps isolates the std term.
        let std = params.step(0.03, 0.5, 1.0) - params.step(0.03, 0.5, 0.0);
        let expected = 0.015 * ((1.0 - (-0.8_f64).exp()) / 1.6).sqrt();
        assert_relative_eq!(std, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_rates_can_go_negative() {
        let params = VasicekParams::new(0.001, 0.1, 0.001, 0.02).unwrap();
        let next = params.step(0.001, 1.0, -4.0);
        assert!(next < 0.0);
    }
}
