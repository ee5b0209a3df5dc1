use crate::errors::{EngineResult, PricingError};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    /// Hard cap on Monte Carlo trials per request. `numSimulations` is
    /// caller-controlled; requests above the cap are clamped, not rejected.
    pub max_simulations: u32,
    /// Whole-request timeout applied at the router layer.
    pub request_timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| PricingError::Config(format!("SERVER_PORT: {e}")))?;

        let max_simulations = env_var_or("MAX_SIMULATIONS", "5000000")
            .parse::<u32>()
            .map_err(|e| PricingError::Config(format!("MAX_SIMULATIONS: {e}")))?;
        if max_simulations == 0 {
            return Err(PricingError::Config(
                "MAX_SIMULATIONS must be at least 1".into(),
            ));
        }

        let request_timeout_ms = env_var_or("REQUEST_TIMEOUT_MS", "10000")
            .parse::<u64>()
            .map_err(|e| PricingError::Config(format!("REQUEST_TIMEOUT_MS: {e}")))?;

        Ok(Self {
            server_port,
            max_simulations,
            request_timeout_ms,
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
