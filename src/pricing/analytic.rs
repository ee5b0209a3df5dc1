use crate::errors::{EngineResult, PricingError};
use crate::pricing::greeks::compute_greeks;
use crate::pricing::payoff::AUTOCALL_TRIGGER;
use crate::pricing::{
    request_rng, round_dp, MarketParams, PricingMethod, PricingRequest, PricingResult, ProductType,
    Valuator, DEGENERATE_VOL_EPS,
};
use rand::rngs::StdRng;
use rand::Rng;
use statrs::distribution::{ContinuousCDF, Normal};

/// Closed-form and quasi-closed-form quoting, no simulation.
///
/// digital:      exp(-rT) * Phi(d2) * 100
/// barrier:      digital * exp(-((S - B)/S)^2)       heuristic decay, not a
///               rigorous barrier formula
/// autocallable: digital * (1 + p_ac * 0.2),         p_ac = 0.8 above the
///               autocall trigger, 0.3 below
/// generic:      S * (1 + Z * sigma * sqrt(T) * 0.1) one normal draw; this
///               branch is intentionally stochastic
pub struct AnalyticPricer {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl AnalyticPricer {
    pub fn new() -> Self {
        let normal = Normal::new(0.0, 1.0).unwrap_or(Normal::standard());
        Self { normal }
    }

    /// Risk-neutral digital price per 100 notional.
    ///
    /// d2 = (ln(S/K) + (r - sigma^2/2)*T) / (sigma*sqrt(T))
    ///
    /// When sigma*sqrt(T) is degenerate the terminal distribution collapses
    /// to the forward, and the digital pays exp(-rT)*100 if the forward ends
    /// above the strike, zero otherwise.
    #[inline]
    fn digital_price(&self, params: &MarketParams) -> f64 {
        if params.sigma_sqrt_t < DEGENERATE_VOL_EPS {
            return if params.forward() > params.strike {
                params.discount * 100.0
            } else {
                0.0
            };
        }

        let d2 =
            (params.ln_s_k + (params.rate - params.half_sigma_sq) * params.maturity)
                / params.sigma_sqrt_t;
        params.discount * self.normal.cdf(d2) * 100.0
    }

    /// Unrounded fair value for one resolved request.
    fn fair_value(&self, params: &MarketParams, rng: &mut StdRng) -> f64 {
        match params.product {
            ProductType::DigitalOption => self.digital_price(params),
            ProductType::BarrierOption => {
                let decay = (-((params.spot - params.barrier) / params.spot).powi(2)).exp();
                self.digital_price(params) * decay
            }
            ProductType::Autocallable => {
                let autocall_prob = if params.spot > params.strike * AUTOCALL_TRIGGER {
                    0.8
                } else {
                    0.3
                };
                self.digital_price(params) * (1.0 + autocall_prob * 0.2)
            }
            ProductType::Generic => {
                let z: f64 = rng.sample(self.normal);
                params.spot * (1.0 + z * params.sigma * params.sqrt_t * 0.1)
            }
        }
    }

    /// Full analytic quote: fair value plus Greeks repriced through this
    /// pricer. No confidence interval on this path.
    pub fn price(&self, request: &PricingRequest) -> EngineResult<PricingResult> {
        let params = MarketParams::resolve(request)?;
        let mut rng = request_rng(request.seed);
        let base = self.fair_value(&params, &mut rng);

        if !base.is_finite() {
            return Err(PricingError::Computation(format!(
                "analytic price is not finite for {}",
                params.product
            )));
        }

        let greeks = compute_greeks(self, request, base)?;

        Ok(PricingResult {
            price: round_dp(base, 4),
            greeks,
            confidence_interval: None,
            num_simulations_used: None,
            pricing_method: PricingMethod::Analytic,
        })
    }
}

impl Default for AnalyticPricer {
    fn default() -> Self {
        Self::new()
    }
}

impl Valuator for AnalyticPricer {
    fn method(&self) -> PricingMethod {
        PricingMethod::Analytic
    }

    fn value(&self, request: &PricingRequest, rng: &mut StdRng) -> EngineResult<f64> {
        let params = MarketParams::resolve(request)?;
        Ok(self.fair_value(&params, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingRequest;

    fn request(product: ProductType) -> PricingRequest {
        let mut r = PricingRequest::new(product);
        r.seed = Some(3);
        r
    }

    #[test]
    fn test_atm_digital_known_value() {
        // S=K=100, sigma=0.2, r=0.05, T=1:
        // d2 = (0 + (0.05 - 0.02)*1) / 0.2 = 0.15
        // price = exp(-0.05) * Phi(0.15) * 100 ~ 53.2325
        let pricer = AnalyticPricer::new();
        let result = pricer.price(&request(ProductType::DigitalOption)).unwrap();
        assert!(
            (result.price - 53.2325).abs() < 0.01,
            "ATM digital price {} should be ~53.2325",
            result.price
        );
        assert_eq!(result.pricing_method, PricingMethod::Analytic);
        assert!(result.confidence_interval.is_none());
        assert!(result.num_simulations_used.is_none());
        // 4-decimal rounding on the price.
        let scaled = result.price * 1e4;
        assert!((scaled - scaled.round()).abs() < 1e-6);
    }

    #[test]
    fn test_digital_price_monotone_in_spot() {
        let pricer = AnalyticPricer::new();
        let base = request(ProductType::DigitalOption);
        let mut previous = f64::NEG_INFINITY;
        for spot in [60.0, 80.0, 90.0, 100.0, 110.0, 130.0, 180.0] {
            let mut rng = request_rng(base.seed);
            let price = pricer.value(&base.with_spot_price(spot), &mut rng).unwrap();
            assert!(
                price >= previous,
                "digital price must be non-decreasing in spot: {price} at {spot} after {previous}"
            );
            previous = price;
        }
    }

    #[test]
    fn test_barrier_decay_never_exceeds_digital_base() {
        let pricer = AnalyticPricer::new();
        let digital = pricer.price(&request(ProductType::DigitalOption)).unwrap();
        let barrier = pricer.price(&request(ProductType::BarrierOption)).unwrap();
        assert!(
            barrier.price <= digital.price,
            "barrier {} must not exceed its digital base {}",
            barrier.price,
            digital.price
        );
        // Defaults: S=100, B=80 -> decay = exp(-0.04).
        let expected = digital.price * (-0.04f64).exp();
        assert!((barrier.price - expected).abs() < 0.01);
    }

    #[test]
    fn test_autocall_scaling_below_trigger() {
        let pricer = AnalyticPricer::new();
        let digital = pricer.price(&request(ProductType::DigitalOption)).unwrap();
        let auto = pricer.price(&request(ProductType::Autocallable)).unwrap();
        // Default spot 100 is below strike * 1.1, so p_ac = 0.3.
        let expected = digital.price * 1.06;
        assert!(
            (auto.price - expected).abs() < 0.01,
            "autocallable {} should be digital * 1.06 = {}",
            auto.price,
            expected
        );
    }

    #[test]
    fn test_autocall_scaling_above_trigger() {
        let pricer = AnalyticPricer::new();
        let above = request(ProductType::Autocallable).with_spot_price(120.0);
        let digital_above = request(ProductType::DigitalOption).with_spot_price(120.0);
        let auto = pricer.price(&above).unwrap();
        let digital = pricer.price(&digital_above).unwrap();
        let expected = digital.price * 1.16;
        assert!(
            (auto.price - expected).abs() < 0.01,
            "autocallable {} above trigger should be digital * 1.16 = {}",
            auto.price,
            expected
        );
    }

    #[test]
    fn test_zero_vol_digital_is_discounted_indicator() {
        let pricer = AnalyticPricer::new();
        let r = request(ProductType::DigitalOption).with_volatility(0.0);
        let mut rng = request_rng(r.seed);
        let price = pricer.value(&r, &mut rng).unwrap();
        // Forward 100*exp(0.05) > 100, so the digital pays exp(-0.05)*100.
        let expected = (-0.05f64).exp() * 100.0;
        assert!(
            (price - expected).abs() < 1e-9,
            "zero-vol digital {price} should be {expected}"
        );

        let otm = r.with_spot_price(50.0);
        let mut rng = request_rng(r.seed);
        let price = pricer.value(&otm, &mut rng).unwrap();
        assert_eq!(price, 0.0, "zero-vol OTM digital must be worthless");
    }

    #[test]
    fn test_generic_quote_is_seed_reproducible() {
        let pricer = AnalyticPricer::new();
        let r = request(ProductType::Generic);
        let a = pricer.price(&r).unwrap();
        let b = pricer.price(&r).unwrap();
        assert_eq!(a, b, "same seed must reproduce the stochastic generic quote");

        let mut rng_a = request_rng(Some(3));
        let mut rng_b = request_rng(Some(4));
        let va = pricer.value(&r, &mut rng_a).unwrap();
        let vb = pricer.value(&r, &mut rng_b).unwrap();
        assert_ne!(va, vb, "different seeds should move the generic quote");
    }

    #[test]
    fn test_unknown_product_routes_to_generic() {
        let pricer = AnalyticPricer::new();
        let mut r: PricingRequest =
            serde_json::from_str(r#"{"productType":"range_accrual"}"#).unwrap();
        r.seed = Some(3);
        assert_eq!(r.product_type, ProductType::Generic);
        let result = pricer.price(&r).unwrap();
        assert_eq!(result.pricing_method, PricingMethod::Analytic);
    }
}
