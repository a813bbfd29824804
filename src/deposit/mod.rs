//! Deposit domain: bridging the external payment gateway to user balances

mod model;
mod paypal;
mod service;

pub use model::{
    CompleteDepositRequest, Deposit, DepositReceipt, DepositStatus, InitiateDepositRequest,
    InitiateDepositResponse,
};
pub use paypal::{CapturedPayment, CreatedOrder, PayPalClient};
pub use service::DepositService;
