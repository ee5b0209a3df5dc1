use crate::errors::{EngineResult, PricingError};
use crate::pricing::greeks::compute_greeks;
use crate::pricing::payoff::terminal_payoff;
use crate::pricing::simulate::PriceSimulator;
use crate::pricing::{
    request_rng, round_dp, MarketParams, PricingMethod, PricingRequest, PricingResult, Valuator,
};
use rand::rngs::StdRng;

pub const DEFAULT_NUM_SIMULATIONS: u32 = 100_000;

/// Two-sided 95% normal quantile.
const CONFIDENCE_Z: f64 = 1.96;

/// Raw Monte Carlo estimate before rounding.
#[derive(Debug, Clone, Copy)]
pub struct McEstimate {
    pub price: f64,
    pub half_width: f64,
    pub trials: u32,
}

/// N independent simulate -> payoff trials, discounted sample mean, and a
/// sampling-based 95% confidence half-width.
///
/// price      = mean(payoff) * exp(-r*T)
/// half_width = 1.96 * sqrt(s^2 / N) * exp(-r*T)
///
/// s^2 is the sample variance (N-1 denominator); the discount applies to the
/// interval as well as the mean. The half-width shrinks like 1/sqrt(N).
pub struct MonteCarloEngine {
    simulator: PriceSimulator,
    /// Trials per request are clamped here; `numSimulations` is caller
    /// controlled and otherwise unbounded.
    max_simulations: u32,
}

impl MonteCarloEngine {
    pub fn new(max_simulations: u32) -> Self {
        Self {
            simulator: PriceSimulator::new(),
            max_simulations,
        }
    }

    /// One estimation batch. Accumulates payoff sum and sum of squares in a
    /// single pass; the reduction is commutative, so trial order never
    /// affects the estimate beyond the draws themselves.
    pub fn estimate(&self, request: &PricingRequest, rng: &mut StdRng) -> EngineResult<McEstimate> {
        let params = MarketParams::resolve(request)?;

        let requested = request.num_simulations.unwrap_or(DEFAULT_NUM_SIMULATIONS);
        if requested == 0 {
            return Err(PricingError::InvalidInput {
                field: "numSimulations",
                reason: "must be at least 1".into(),
            });
        }
        let trials = requested.min(self.max_simulations);
        if trials < requested {
            tracing::warn!(
                requested,
                clamped = trials,
                "numSimulations clamped to configured cap"
            );
        }

        let n = trials as f64;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for _ in 0..trials {
            let terminal = self.simulator.terminal_price(
                params.spot,
                params.rate,
                params.sigma,
                params.maturity,
                rng,
            );
            let payoff = terminal_payoff(terminal, &params);
            sum += payoff;
            sum_sq += payoff * payoff;
        }

        let mean = sum / n;
        // One-pass sample variance can dip below zero at float precision.
        let variance = if trials > 1 {
            ((sum_sq - n * mean * mean) / (n - 1.0)).max(0.0)
        } else {
            0.0
        };
        let standard_error = (variance / n).sqrt();

        let price = mean * params.discount;
        let half_width = CONFIDENCE_Z * standard_error * params.discount;

        if !price.is_finite() || !half_width.is_finite() {
            return Err(PricingError::Computation(format!(
                "monte carlo estimate is not finite for {}",
                params.product
            )));
        }

        Ok(McEstimate {
            price,
            half_width,
            trials,
        })
    }

    /// Full simulation quote: estimate plus Greeks, each bump repriced with a
    /// fresh batch of the same size through this engine.
    pub fn price(&self, request: &PricingRequest) -> EngineResult<PricingResult> {
        let mut rng = request_rng(request.seed);
        let estimate = self.estimate(request, &mut rng)?;
        let greeks = compute_greeks(self, request, estimate.price)?;

        Ok(PricingResult {
            price: round_dp(estimate.price, 4),
            greeks,
            confidence_interval: Some(round_dp(estimate.half_width, 4)),
            num_simulations_used: Some(estimate.trials),
            pricing_method: PricingMethod::MonteCarlo,
        })
    }
}

impl Valuator for MonteCarloEngine {
    fn method(&self) -> PricingMethod {
        PricingMethod::MonteCarlo
    }

    fn value(&self, request: &PricingRequest, rng: &mut StdRng) -> EngineResult<f64> {
        Ok(self.estimate(request, rng)?.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::analytic::AnalyticPricer;
    use crate::pricing::ProductType;

    fn engine() -> MonteCarloEngine {
        MonteCarloEngine::new(5_000_000)
    }

    /// Digital request whose payoff (coupon = 1.0, so 100 above the strike)
    /// lines up with the analytic digital's 100-notional payout.
    fn digital_request(trials: u32, seed: u64) -> PricingRequest {
        let mut request = PricingRequest::new(ProductType::DigitalOption);
        request.coupon = Some(1.0);
        request.num_simulations = Some(trials);
        request.seed = Some(seed);
        request
    }

    #[test]
    fn test_converges_to_analytic_digital() {
        let mc = engine();
        let request = digital_request(200_000, 17);
        let mut rng = request_rng(request.seed);
        let estimate = mc.estimate(&request, &mut rng).unwrap();

        let analytic = AnalyticPricer::new();
        let mut rng = request_rng(request.seed);
        let reference = analytic.value(&request, &mut rng).unwrap();

        assert!(
            (estimate.price - reference).abs() < 0.5,
            "MC {} should converge to analytic {} (half-width {})",
            estimate.price,
            reference,
            estimate.half_width
        );
        assert!(estimate.half_width < 0.3);
    }

    #[test]
    fn test_half_width_shrinks_like_inverse_sqrt_n() {
        let mc = engine();
        let mut rng = request_rng(Some(23));
        let coarse = mc.estimate(&digital_request(2_000, 23), &mut rng).unwrap();
        let mut rng = request_rng(Some(23));
        let fine = mc.estimate(&digital_request(200_000, 23), &mut rng).unwrap();

        // 100x the trials should shrink the interval ~10x.
        let ratio = coarse.half_width / fine.half_width;
        assert!(
            (7.0..13.0).contains(&ratio),
            "half-width ratio {ratio} should be near sqrt(100) = 10"
        );
    }

    #[test]
    fn test_seeded_price_is_reproducible() {
        let mc = engine();
        let mut request = PricingRequest::new(ProductType::Autocallable);
        request.num_simulations = Some(20_000);
        request.seed = Some(99);
        let a = mc.price(&request).unwrap();
        let b = mc.price(&request).unwrap();
        assert_eq!(a, b, "same seed and request must reproduce bit-identical results");
    }

    #[test]
    fn test_default_fill_idempotence() {
        // All-defaults explicit vs everything omitted: identical results.
        let mc = engine();
        let mut bare = PricingRequest::new(ProductType::DigitalOption);
        bare.num_simulations = Some(20_000);
        bare.seed = Some(5);

        let mut explicit = bare.clone();
        explicit.spot_price = Some(100.0);
        explicit.strike = Some(100.0);
        explicit.barrier = Some(80.0);
        explicit.coupon = Some(0.1);
        explicit.volatility = Some(0.2);
        explicit.risk_free_rate = Some(0.05);
        explicit.time_to_maturity = Some(1.0);

        assert_eq!(mc.price(&bare).unwrap(), mc.price(&explicit).unwrap());
    }

    #[test]
    fn test_result_carries_method_interval_and_trials() {
        let mc = engine();
        let mut request = PricingRequest::new(ProductType::BarrierOption);
        request.num_simulations = Some(20_000);
        request.seed = Some(31);
        let result = mc.price(&request).unwrap();
        assert_eq!(result.pricing_method, PricingMethod::MonteCarlo);
        assert_eq!(result.num_simulations_used, Some(20_000));
        let half = result.confidence_interval.expect("interval must be populated");
        assert!(half > 0.0);
    }

    #[test]
    fn test_trials_clamped_to_cap() {
        let mc = MonteCarloEngine::new(1_000);
        let mut request = PricingRequest::new(ProductType::Generic);
        request.num_simulations = Some(50_000);
        request.seed = Some(2);
        let mut rng = request_rng(request.seed);
        let estimate = mc.estimate(&request, &mut rng).unwrap();
        assert_eq!(estimate.trials, 1_000);
    }

    #[test]
    fn test_zero_trials_rejected() {
        let mc = engine();
        let mut request = PricingRequest::new(ProductType::Generic);
        request.num_simulations = Some(0);
        let mut rng = request_rng(None);
        assert!(mc.estimate(&request, &mut rng).is_err());
    }

    #[test]
    fn test_generic_price_never_negative() {
        // max(0, S_T - K) keeps the discounted mean non-negative.
        let mc = engine();
        let mut request = PricingRequest::new(ProductType::Generic);
        request.num_simulations = Some(20_000);
        request.seed = Some(13);
        let mut rng = request_rng(request.seed);
        let estimate = mc.estimate(&request, &mut rng).unwrap();
        assert!(estimate.price >= 0.0);
    }

    #[test]
    fn test_zero_vol_digital_matches_degenerate_analytic() {
        // sigma = 0 collapses every trial to the forward; the estimate must
        // agree with the analytic degenerate branch and carry a zero interval.
        let mc = engine();
        let mut request = digital_request(5_000, 41);
        request.volatility = Some(0.0);
        let mut rng = request_rng(request.seed);
        let estimate = mc.estimate(&request, &mut rng).unwrap();
        let expected = (-0.05f64).exp() * 100.0;
        assert!(
            (estimate.price - expected).abs() < 1e-9,
            "zero-vol MC {} should equal {}",
            estimate.price,
            expected
        );
        assert!(estimate.half_width.abs() < 1e-9);
    }
}
