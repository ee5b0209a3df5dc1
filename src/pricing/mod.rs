pub mod analytic;
pub mod greeks;
pub mod monte_carlo;
pub mod payoff;
pub mod simulate;

use crate::errors::{EngineResult, PricingError};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Defaults for absent request fields ──
// A missing field is never an error; it resolves to these values.

pub const DEFAULT_SPOT: f64 = 100.0;
pub const DEFAULT_STRIKE: f64 = 100.0;
pub const DEFAULT_BARRIER: f64 = 80.0;
pub const DEFAULT_COUPON: f64 = 0.1;
pub const DEFAULT_VOLATILITY: f64 = 0.2;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.05;
pub const DEFAULT_TIME_TO_MATURITY: f64 = 1.0;

/// Below this value of sigma*sqrt(T) the lognormal terminal distribution is
/// treated as degenerate (deterministic forward).
pub const DEGENERATE_VOL_EPS: f64 = 1e-12;

// ── Product dispatch ──

/// Closed set of supported product payoffs. Unrecognized labels map to
/// `Generic` rather than failing; a missing label is a deserialization error
/// handled at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    DigitalOption,
    BarrierOption,
    Autocallable,
    Generic,
}

impl ProductType {
    /// Case-insensitive label dispatch. Unknown labels fall through to
    /// `Generic`.
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "digital_option" => Self::DigitalOption,
            "barrier_option" => Self::BarrierOption,
            "autocallable" => Self::Autocallable,
            _ => Self::Generic,
        }
    }
}

impl<'de> serde::Deserialize<'de> for ProductType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(ProductType::from_label(&label))
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DigitalOption => write!(f, "digital_option"),
            Self::BarrierOption => write!(f, "barrier_option"),
            Self::Autocallable => write!(f, "autocallable"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

// ── Pricing request (immutable value) ──

/// A single pricing request. All market fields are optional and resolve to
/// defaults; the request itself is never mutated — the Greeks bumps work on
/// copies produced by the `with_*` builders.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRequest {
    pub product_type: ProductType,
    pub spot_price: Option<f64>,
    pub strike: Option<f64>,
    pub barrier: Option<f64>,
    pub coupon: Option<f64>,
    pub volatility: Option<f64>,
    pub risk_free_rate: Option<f64>,
    pub time_to_maturity: Option<f64>,
    pub num_simulations: Option<u32>,
    /// Fixes the random stream for reproducible results. Absent = entropy.
    pub seed: Option<u64>,
}

impl PricingRequest {
    pub fn new(product_type: ProductType) -> Self {
        Self {
            product_type,
            spot_price: None,
            strike: None,
            barrier: None,
            coupon: None,
            volatility: None,
            risk_free_rate: None,
            time_to_maturity: None,
            num_simulations: None,
            seed: None,
        }
    }

    pub fn with_spot_price(&self, spot: f64) -> Self {
        Self {
            spot_price: Some(spot),
            ..self.clone()
        }
    }

    pub fn with_volatility(&self, volatility: f64) -> Self {
        Self {
            volatility: Some(volatility),
            ..self.clone()
        }
    }

    pub fn with_time_to_maturity(&self, maturity: f64) -> Self {
        Self {
            time_to_maturity: Some(maturity),
            ..self.clone()
        }
    }
}

// ── Resolved market parameters (stack, no alloc) ──

/// Request with defaults filled in, validated, and common quantities
/// precomputed. Every valuation path works from this struct.
#[derive(Debug, Clone, Copy)]
pub struct MarketParams {
    pub product: ProductType,
    pub spot: f64,
    pub strike: f64,
    pub barrier: f64,
    pub coupon: f64,
    pub sigma: f64,
    pub rate: f64,
    pub maturity: f64,
    // Precomputed
    pub ln_s_k: f64,
    pub sqrt_t: f64,
    pub sigma_sqrt_t: f64,
    pub half_sigma_sq: f64,
    pub discount: f64,
}

impl MarketParams {
    pub fn resolve(request: &PricingRequest) -> EngineResult<Self> {
        let spot = request.spot_price.unwrap_or(DEFAULT_SPOT);
        let strike = request.strike.unwrap_or(DEFAULT_STRIKE);
        let barrier = request.barrier.unwrap_or(DEFAULT_BARRIER);
        let coupon = request.coupon.unwrap_or(DEFAULT_COUPON);
        let sigma = request.volatility.unwrap_or(DEFAULT_VOLATILITY);
        let rate = request.risk_free_rate.unwrap_or(DEFAULT_RISK_FREE_RATE);
        let maturity = request.time_to_maturity.unwrap_or(DEFAULT_TIME_TO_MATURITY);

        require_positive("spotPrice", spot)?;
        require_positive("strike", strike)?;
        require_positive("barrier", barrier)?;
        require_positive("timeToMaturity", maturity)?;
        require_finite("coupon", coupon)?;
        require_finite("riskFreeRate", rate)?;
        require_finite("volatility", sigma)?;
        if sigma < 0.0 {
            return Err(PricingError::InvalidInput {
                field: "volatility",
                reason: format!("must be non-negative, got {sigma}"),
            });
        }

        let sqrt_t = maturity.sqrt();
        Ok(Self {
            product: request.product_type,
            spot,
            strike,
            barrier,
            coupon,
            sigma,
            rate,
            maturity,
            ln_s_k: (spot / strike).ln(),
            sqrt_t,
            sigma_sqrt_t: sigma * sqrt_t,
            half_sigma_sq: 0.5 * sigma * sigma,
            discount: (-rate * maturity).exp(),
        })
    }

    /// Deterministic terminal price in the zero-volatility limit.
    #[inline]
    pub fn forward(&self) -> f64 {
        self.spot * (self.rate * self.maturity).exp()
    }
}

fn require_positive(field: &'static str, value: f64) -> EngineResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PricingError::InvalidInput {
            field,
            reason: format!("must be a positive finite number, got {value}"),
        });
    }
    Ok(())
}

fn require_finite(field: &'static str, value: f64) -> EngineResult<()> {
    if !value.is_finite() {
        return Err(PricingError::InvalidInput {
            field,
            reason: format!("must be finite, got {value}"),
        });
    }
    Ok(())
}

// ── Pricing result ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMethod {
    Analytic,
    MonteCarlo,
}

impl std::fmt::Display for PricingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Analytic => write!(f, "analytic"),
            Self::MonteCarlo => write!(f, "monte_carlo"),
        }
    }
}

/// Outcome of one pricing call. `price` carries 4 decimals, each sensitivity
/// 6; the confidence half-width and trial count are present only for the
/// Monte Carlo path.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub price: f64,
    pub greeks: greeks::Greeks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_simulations_used: Option<u32>,
    pub pricing_method: PricingMethod,
}

// ── Valuation seam ──

/// Both pricers implement this trait; the Greeks calculator reprices bumped
/// requests through whichever valuator produced the base price.
/// `value` returns the unrounded fair value and draws any randomness it
/// needs from the caller-supplied generator.
pub trait Valuator: Send + Sync {
    fn method(&self) -> PricingMethod;

    fn value(&self, request: &PricingRequest, rng: &mut StdRng) -> EngineResult<f64>;
}

// ── Random variate source ──

/// One generator per request (or per bump reprice): explicit state, no
/// shared instance across calls. Seeded requests are bit-reproducible.
#[inline]
pub fn request_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

// ── Rounding ──

/// Round half away from zero at `dp` decimal places.
#[inline]
pub fn round_dp(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}
