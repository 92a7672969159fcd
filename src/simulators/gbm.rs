// src/simulators/gbm.rs

use crate::error::ConfigError;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

/// Geometric Brownian motion for the risky asset, priced in a numeraire
/// that stays fixed, plus a transient impact term fed back from the AMM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalMarket {
    drift: f64,
    volatility: f64,
    dt: f64,
    /// Decay speed of the transient impact.
    beta: f64,
    /// Weight of the transient impact in the quoted price.
    impact_scale: f64,
    risky_price: f64,
    numeraire_price: f64,
    price_with_impact: f64,
    transient_impact: f64,
}

impl ExternalMarket {
    pub fn new(
        initial_price: f64,
        drift: f64,
        volatility: f64,
        dt: f64,
        beta: f64,
        impact_scale: f64,
    ) -> Result<Self, ConfigError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::TimeStep(dt));
        }
        if !(volatility.is_finite() && volatility >= 0.0) {
            return Err(ConfigError::Volatility(volatility));
        }
        if !(beta.is_finite() && beta > 0.0) {
            return Err(ConfigError::ImpactDecay(beta));
        }
        if !(initial_price.is_finite() && initial_price > 0.0) {
            return Err(ConfigError::InitialPrice(initial_price));
        }
        Ok(Self {
            drift,
            volatility,
            dt,
            beta,
            impact_scale,
            risky_price: initial_price,
            numeraire_price: 1.0,
            price_with_impact: initial_price,
            transient_impact: 0.0,
        })
    }

    /// One GBM step: `P <- P * exp((mu - sigma^2/2) dt + sigma sqrt(dt) z)`.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let z: f64 = StandardNormal.sample(rng);
        let exponent = (self.drift - 0.5 * self.volatility.powi(2)) * self.dt
            + self.volatility * self.dt.sqrt() * z;
        // exp() can underflow to zero over very long runs.
        self.risky_price = (self.risky_price * exponent.exp()).max(f64::MIN_POSITIVE);
        self.price_with_impact =
            (self.risky_price + self.impact_scale * self.transient_impact).max(f64::MIN_POSITIVE);
        self.risky_price
    }

    /// `impact <- exp(-beta dt) impact + observed`
    pub fn impact_decay(&mut self, observed_impact: f64) {
        self.transient_impact = (-self.beta * self.dt).exp() * self.transient_impact + observed_impact;
    }

    pub fn set_drift(&mut self, drift: f64) {
        self.drift = drift;
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    pub fn transient_impact(&self) -> f64 {
        self.transient_impact
    }

    pub fn price_risky(&self) -> f64 {
        self.risky_price
    }

    pub fn price_with_impact(&self) -> f64 {
        self.price_with_impact
    }

    /// sqrt of the risky asset priced in numeraire, impact included.
    pub fn sqrt_price_risky(&self) -> f64 {
        (self.price_with_impact / self.numeraire_price).sqrt()
    }

    /// sqrt of the numeraire priced in the risky asset, impact included.
    pub fn sqrt_price_numeraire(&self) -> f64 {
        (self.numeraire_price / self.price_with_impact).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn market(volatility: f64) -> ExternalMarket {
        ExternalMarket::new(2000.0, 0.0, volatility, 0.01, 2.0, 0.1).unwrap()
    }

    #[test]
    fn test_price_stays_positive_under_extreme_volatility() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(7);
        let mut gbm = ExternalMarket::new(1.0, -5.0, 20.0, 1.0, 2.0, 0.1).unwrap();

        // Act / Assert
        for _ in 0..10_000 {
            let price = gbm.advance(&mut rng);
            assert!(price > 0.0 && price.is_finite());
        }
    }

    #[test]
    fn test_zero_volatility_zero_drift_keeps_price() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut gbm = market(0.0);

        for _ in 0..100 {
            gbm.advance(&mut rng);
        }

        assert_relative_eq!(gbm.price_risky(), 2000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_impact_decays_geometrically() {
        // Arrange
        let mut gbm = market(0.3);
        gbm.impact_decay(10.0);
        let factor = (-2.0_f64 * 0.01).exp();

        // Act
        for _ in 0..5 {
            gbm.impact_decay(0.0);
        }

        // Assert
        assert_relative_eq!(gbm.transient_impact(), 10.0 * factor.powi(5), max_relative = 1e-12);
    }

    #[test]
    fn test_impact_shifts_quoted_price_only() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut gbm = market(0.0);
        gbm.impact_decay(100.0);

        gbm.advance(&mut rng);

        assert_relative_eq!(gbm.price_risky(), 2000.0, max_relative = 1e-12);
        assert_relative_eq!(gbm.price_with_impact(), 2010.0, max_relative = 1e-12);
        assert_relative_eq!(
            gbm.sqrt_price_risky() * gbm.sqrt_price_numeraire(),
            1.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert_eq!(
            ExternalMarket::new(2000.0, 0.0, 0.3, 0.0, 2.0, 0.1).unwrap_err(),
            ConfigError::TimeStep(0.0)
        );
        assert_eq!(
            ExternalMarket::new(2000.0, 0.0, -0.1, 0.01, 2.0, 0.1).unwrap_err(),
            ConfigError::Volatility(-0.1)
        );
        assert_eq!(
            ExternalMarket::new(-1.0, 0.0, 0.3, 0.01, 2.0, 0.1).unwrap_err(),
            ConfigError::InitialPrice(-1.0)
        );
    }
}
