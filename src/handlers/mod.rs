//! API handlers for the Bundle backend

pub mod activity;
pub mod bundle;
pub mod deposit;
pub mod loan;
pub mod story;
pub mod user;

pub use activity::*;
pub use bundle::*;
pub use deposit::*;
pub use loan::*;
pub use story::*;
pub use user::*;
