use rand::rngs::StdRng;
use rand::Rng;
use statrs::distribution::Normal;

/// One-step risk-neutral GBM terminal sampling.
///
/// S_T = S_0 * exp((r - sigma^2/2)*T + sigma*sqrt(T)*Z),  Z ~ N(0,1)
///
/// Payoffs in this engine depend only on the value at maturity, so no
/// intermediate path points are generated and no barrier monitoring happens
/// along the path; knock conditions are evaluated on the terminal price only.
pub struct PriceSimulator {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl PriceSimulator {
    pub fn new() -> Self {
        // Normal::new(0, 1) only fails if std_dev <= 0; this is safe.
        let normal = Normal::new(0.0, 1.0).unwrap_or(Normal::standard());
        Self { normal }
    }

    /// Draw one terminal price. Always consumes exactly one normal variate,
    /// including the sigma = 0 case where the diffusion term vanishes and the
    /// result is the deterministic forward spot * exp(rate * maturity).
    #[inline]
    pub fn terminal_price(
        &self,
        spot: f64,
        rate: f64,
        sigma: f64,
        maturity: f64,
        rng: &mut StdRng,
    ) -> f64 {
        let drift = (rate - 0.5 * sigma * sigma) * maturity;
        let diffusion = sigma * maturity.sqrt() * rng.sample(self.normal);
        spot * (drift + diffusion).exp()
    }
}

impl Default for PriceSimulator {
    fn default() -> Self {
        Self::new()
    }
}
