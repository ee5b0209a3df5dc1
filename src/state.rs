use crate::config::AppConfig;
use crate::pricing::analytic::AnalyticPricer;
use crate::pricing::monte_carlo::MonteCarloEngine;
use portable_atomic::AtomicU64;
use std::sync::Arc;

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub analytic_requests: AtomicU64,
    pub monte_carlo_requests: AtomicU64,
    /// Trials of the base Monte Carlo estimate per request; Greeks bump
    /// batches are not counted here.
    pub simulations_run: AtomicU64,
    pub pricing_errors: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            analytic_requests: AtomicU64::new(0),
            monte_carlo_requests: AtomicU64::new(0),
            simulations_run: AtomicU64::new(0),
            pricing_errors: AtomicU64::new(0),
        }
    }
}

// ── Application shared state ──

/// Pricers are created once and reused; they hold no per-request state, so
/// handlers share them freely across tasks. Randomness is confined to the
/// request-scoped generators inside the pricing module.
pub struct AppState {
    pub config: AppConfig,
    pub analytic: AnalyticPricer,
    pub monte_carlo: MonteCarloEngine,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        Arc::new(Self {
            analytic: AnalyticPricer::new(),
            monte_carlo: MonteCarloEngine::new(config.max_simulations),
            started_at: chrono::Utc::now(),
            counters: PerfCounters::new(),
            config,
        })
    }
}
