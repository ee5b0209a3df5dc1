use crate::errors::EngineResult;
use crate::pricing::{request_rng, round_dp, MarketParams, PricingRequest, Valuator};

/// Relative spot bump shared by the delta and gamma differences.
const SPOT_BUMP: f64 = 0.01;

/// Absolute volatility bump (one vol point).
const VOL_BUMP: f64 = 0.01;

/// Theta step: one calendar day.
const ONE_DAY: f64 = 1.0 / 365.0;

/// First and second order sensitivities, rounded to 6 decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
}

/// Bump-and-reprice finite differences.
///
/// delta = (V(S*1.01) - V) / (S*0.01)            forward difference
/// gamma = (V(S*1.01) - 2V + V(S*0.99)) / (S*0.01)^2
/// vega  = (V(sigma+0.01) - V) / 0.01
/// theta = (V(T - 1/365) - V) / (1/365)
///
/// The theta step shortens the horizon by one day and takes a forward
/// difference over that step; requests within one day of expiry fail the
/// bumped reprice instead of producing a negative horizon.
///
/// Each reprice goes through the same valuator that produced `base_price`,
/// on an immutable copy of the request. Seeded requests reuse the request
/// seed for every bump, so bumped Monte Carlo batches share their random
/// draws with the base estimate (common random numbers).
pub fn compute_greeks<V: Valuator + ?Sized>(
    valuator: &V,
    request: &PricingRequest,
    base_price: f64,
) -> EngineResult<Greeks> {
    let params = MarketParams::resolve(request)?;

    let reprice = |bumped: &PricingRequest| -> EngineResult<f64> {
        let mut rng = request_rng(request.seed);
        valuator.value(bumped, &mut rng)
    };

    let spot_step = params.spot * SPOT_BUMP;
    let price_up = reprice(&request.with_spot_price(params.spot * (1.0 + SPOT_BUMP)))?;
    let price_down = reprice(&request.with_spot_price(params.spot * (1.0 - SPOT_BUMP)))?;
    let price_vol = reprice(&request.with_volatility(params.sigma + VOL_BUMP))?;
    let price_short = reprice(&request.with_time_to_maturity(params.maturity - ONE_DAY))?;

    let delta = (price_up - base_price) / spot_step;
    let gamma = (price_up - 2.0 * base_price + price_down) / (spot_step * spot_step);
    let vega = (price_vol - base_price) / VOL_BUMP;
    let theta = (price_short - base_price) / ONE_DAY;

    Ok(Greeks {
        delta: round_dp(delta, 6),
        gamma: round_dp(gamma, 6),
        vega: round_dp(vega, 6),
        theta: round_dp(theta, 6),
    })
}
