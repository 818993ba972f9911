use thiserror::Error;

mod domain_types;
mod ids;

pub use domain_types::*;
pub use ids::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Resource ID cannot be empty")]
    EmptyResourceId,

    #[error("Invalid API key format: {reason}")]
    InvalidApiKey { reason: String },

    #[error("Value out of bounds for {field}: {value}, expected at least {min}")]
    BelowMinimum {
        field: &'static str,
        value: u64,
        min: u64,
    },
}
