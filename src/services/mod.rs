//! Service layer modules

pub mod pricing;

pub use pricing::{compute_interest_rate, PricingError};
