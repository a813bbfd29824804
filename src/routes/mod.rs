//! Route definitions for the Bundle API

mod activity;
mod bundle;
mod deposit;
mod loan;
mod story;
mod user;

pub use activity::activity_routes;
pub use bundle::bundle_routes;
pub use deposit::deposit_routes;
pub use loan::loan_routes;
pub use story::story_routes;
pub use user::user_routes;
