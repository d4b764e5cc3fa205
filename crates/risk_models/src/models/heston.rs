//! Heston stochastic volatility model.
//!
//! dS = mu S dt + sqrt(v) S dW1
//! dv = kappa (theta - v) dt + xi sqrt(v) dW2,   corr(dW1, dW2) = rho
//!
//! The variance is discretised with the **full-truncation Euler** scheme:
//! both the drift and the diffusion of the variance read `max(v, 0)`, and
//! the stored next variance is floored at zero. This is the documented
//! contract the simulator's tests pin down; stored variances are never
//! negative regardless of the Feller condition.

use crate::error::ModelError;

/// Parameters of a Heston stochastic volatility process.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HestonParams {
    /// Initial level (spot), strictly positive.
    pub spot: f64,
    /// Drift rate of the level (annualised).
    pub drift: f64,
    /// Initial instantaneous variance, non-negative.
    pub initial_var: f64,
    /// Long-run variance `theta`, non-negative.
    pub long_var: f64,
    /// Variance mean-reversion speed `kappa`, non-negative.
    pub mean_reversion: f64,
    /// Volatility of variance `xi`, non-negative.
    pub vol_of_vol: f64,
    /// Spot/variance correlation `rho`, in [-1, 1].
    pub rho: f64,
}

impl HestonParams {
    /// Creates validated Heston parameters.
    ///
    /// # Errors
    /// - [`ModelError::InvalidInitialLevel`] if `spot <= 0`
    /// - [`ModelError::InvalidVariance`] if `initial_var < 0` or `long_var < 0`
    /// - [`ModelError::InvalidMeanReversion`] if `mean_reversion < 0`
    /// - [`ModelError::InvalidVolatility`] if `vol_of_vol < 0`
    /// - [`ModelError::InvalidCorrelation`] if `rho` is outside [-1, 1]
    /// - [`ModelError::NotFinite`] if any value is NaN or infinite
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spot: f64,
        drift: f64,
        initial_var: f64,
        long_var: f64,
        mean_reversion: f64,
        vol_of_vol: f64,
        rho: f64,
    ) -> Result<Self, ModelError> {
        let params = Self {
            spot,
            drift,
            initial_var,
            long_var,
            mean_reversion,
            vol_of_vol,
            rho,
        };
        params.validate()?;
        Ok(params)
    }

    /// Re-checks the parameter constraints.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (name, value) in [
            ("spot", self.spot),
            ("drift", self.drift),
            ("initial_var", self.initial_var),
            ("long_var", self.long_var),
            ("mean_reversion", self.mean_reversion),
            ("vol_of_vol", self.vol_of_vol),
            ("rho", self.rho),
        ] {
            if !value.is_finite() {
                return Err(ModelError::NotFinite(name));
            }
        }
        if self.spot <= 0.0 {
            return Err(ModelError::InvalidInitialLevel(self.spot));
        }
        if self.initial_var < 0.0 {
            return Err(ModelError::InvalidVariance(self.initial_var));
        }
        if self.long_var < 0.0 {
            return Err(ModelError::InvalidVariance(self.long_var));
        }
        if self.mean_reversion < 0.0 {
            return Err(ModelError::InvalidMeanReversion(self.mean_reversion));
        }
        if self.vol_of_vol < 0.0 {
            return Err(ModelError::InvalidVolatility(self.vol_of_vol));
        }
        if !(-1.0..=1.0).contains(&self.rho) {
            return Err(ModelError::InvalidCorrelation(self.rho));
        }
        Ok(())
    }

    /// Whether `2 kappa theta >= xi^2` holds.
    ///
    /// Advisory only: the full-truncation scheme is well defined either
    /// way, but parameter sets violating Feller touch the variance floor
    /// more often.
    pub fn satisfies_feller(&self) -> bool {
        2.0 * self.mean_reversion * self.long_var >= self.vol_of_vol * self.vol_of_vol
    }

    /// Advances `(level, variance)` by `dt` with full-truncation Euler.
    ///
    /// `z1` drives the level; `z2` is an independent standard normal that
    /// is mixed with `z1` through `rho` inside this kernel, so the caller
    /// hands in uncorrelated draws.
    #[inline]
    pub fn step(&self, level: f64, variance: f64, dt: f64, z1: f64, z2: f64) -> (f64, f64) {
        let v_plus = variance.max(0.0);
        let sqrt_v_dt = (v_plus * dt).sqrt();

        let next_level =
            level * ((self.drift - 0.5 * v_plus) * dt + sqrt_v_dt * z1).exp();

        let w2 = self.rho * z1 + (1.0 - self.rho * self.rho).sqrt() * z2;
        let next_var = v_plus
            + self.mean_reversion * (self.long_var - v_plus) * dt
            + self.vol_of_vol * sqrt_v_dt * w2;

        (next_level, next_var.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params() -> HestonParams {
        HestonParams::new(100.0, 0.03, 0.04, 0.04, 1.5, 0.3, -0.7).unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(params().validate().is_ok());
        assert_eq!(
            HestonParams::new(0.0, 0.03, 0.04, 0.04, 1.5, 0.3, -0.7),
            Err(ModelError::InvalidInitialLevel(0.0))
        );
        assert_eq!(
            HestonParams::new(100.0, 0.03, -0.01, 0.04, 1.5, 0.3, -0.7),
            Err(ModelError::InvalidVariance(-0.01))
        );
        assert_eq!(
            HestonParams::new(100.0, 0.03, 0.04, 0.04, 1.5, 0.3, -1.5),
            Err(ModelError::InvalidCorrelation(-1.5))
        );
    }

    #[test]
    fn test_feller_condition() {
        // 2 * 1.5 * 0.04 = 0.12 >= 0.09
        assert!(params().satisfies_feller());
        let violating = HestonParams::new(100.0, 0.0, 0.04, 0.01, 0.5, 0.5, 0.0).unwrap();
        assert!(!violating.satisfies_feller());
    }

    #[test]
    fn test_step_variance_never_negative() {
        let p = params();
        let mut state = (100.0, 0.0001);
        for i in 0..200 {
            // Alternate harsh shocks to push the variance around.
            let z1 = if i % 2 == 0 { 3.0 } else { -3.0 };
            let z2 = if i % 3 == 0 { -4.0 } else { 2.0 };
            state = p.step(state.0, state.1, 1.0 / 52.0, z1, z2);
            assert!(state.1 >= 0.0, "variance went negative at step {}", i);
            assert!(state.0 > 0.0);
        }
    }

    #[test]
    fn test_step_zero_variance_freezes_level_diffusion() {
        let p = HestonParams::new(100.0, 0.0, 0.0, 0.0, 1.0, 0.5, 0.0).unwrap();
        let (level, var) = p.step(100.0, 0.0, 0.1, 2.5, -1.5);
        // With v = 0 and theta = 0 neither component can move.
        assert_relative_eq!(level, 100.0, epsilon = 1e-12);
        assert_relative_eq!(var, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_step_variance_drift_towards_long_run() {
        let p = params();
        let (_, var) = p.step(100.0, 0.09, 0.01, 0.0, 0.0);
        let expected = 0.09 + 1.5 * (0.04 - 0.09) * 0.01;
        assert_relative_eq!(var, expected, epsilon = 1e-12);
    }
}
