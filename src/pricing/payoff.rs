use crate::pricing::{MarketParams, ProductType};

/// Autocall trigger as a multiple of strike: early redemption pays the full
/// coupon once the terminal price reaches strike * 1.1.
pub const AUTOCALL_TRIGGER: f64 = 1.1;

/// Terminal payoff per 100 notional. Pure function of the terminal price and
/// the resolved parameters; no side effects, no allocations.
///
/// - digital: coupon * 100 above strike, zero otherwise
/// - barrier: coupon * 100 above both barrier and strike, zero otherwise
/// - autocallable: coupon * 100 at or above the autocall trigger, coupon * 100
///   at or above the barrier, otherwise max(0, terminal - strike)
/// - generic: max(0, terminal - strike)
#[inline]
pub fn terminal_payoff(terminal: f64, params: &MarketParams) -> f64 {
    match params.product {
        ProductType::DigitalOption => {
            if terminal > params.strike {
                params.coupon * 100.0
            } else {
                0.0
            }
        }
        ProductType::BarrierOption => {
            if terminal > params.barrier && terminal > params.strike {
                params.coupon * 100.0
            } else {
                0.0
            }
        }
        ProductType::Autocallable => {
            if terminal >= params.strike * AUTOCALL_TRIGGER {
                params.coupon * 100.0 // early redemption
            } else if terminal >= params.barrier {
                params.coupon * 100.0 // coupon tier
            } else {
                (terminal - params.strike).max(0.0) // capital at risk
            }
        }
        ProductType::Generic => (terminal - params.strike).max(0.0),
    }
}
