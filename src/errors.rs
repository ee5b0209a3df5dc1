/// Domain-specific error types for the pricing engine.
/// Pricing is a stateless, idempotent read: a failed request surfaces as a
/// client-visible failure with no partial result, and is never retried
/// internally.
#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("invalid input: {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("computation error: {0}")]
    Computation(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for PricingError {
    fn from(e: tokio::task::JoinError) -> Self {
        PricingError::Computation(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, PricingError>;
