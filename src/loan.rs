//! Loan models
//!
//! Loan rows are stored with a schema version and upcast at the read
//! boundary: version 1 rows carried free-text purposes and no default
//! rate, and are only accepted when they still fit the current contract.

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use std::str::FromStr;
use uuid::Uuid;

/// Current loan document schema version.
///
/// v1: free-text purpose, no default_rate column.
/// v2: canonical purpose enum, default_rate in [0, 1].
pub const LOAN_SCHEMA_VERSION: i32 = 2;

/// Sort order assigned to fully repaid loans so listings push them to the
/// bottom.
pub const PAID_LOAN_SORT_ORDER: i32 = 1000;

/// The canonical loan purpose categories.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoanPurpose {
    Agriculture,
    Business,
    Education,
    Medical,
    Housing,
    HomeImprovement,
    DebtConsolidation,
    Vehicle,
    Appliances,
    Wedding,
    Travel,
    Emergency,
    Utilities,
    Childcare,
    Other,
}

impl LoanPurpose {
    pub const ALL: [LoanPurpose; 15] = [
        LoanPurpose::Agriculture,
        LoanPurpose::Business,
        LoanPurpose::Education,
        LoanPurpose::Medical,
        LoanPurpose::Housing,
        LoanPurpose::HomeImprovement,
        LoanPurpose::DebtConsolidation,
        LoanPurpose::Vehicle,
        LoanPurpose::Appliances,
        LoanPurpose::Wedding,
        LoanPurpose::Travel,
        LoanPurpose::Emergency,
        LoanPurpose::Utilities,
        LoanPurpose::Childcare,
        LoanPurpose::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanPurpose::Agriculture => "agriculture",
            LoanPurpose::Business => "business",
            LoanPurpose::Education => "education",
            LoanPurpose::Medical => "medical",
            LoanPurpose::Housing => "housing",
            LoanPurpose::HomeImprovement => "home_improvement",
            LoanPurpose::DebtConsolidation => "debt_consolidation",
            LoanPurpose::Vehicle => "vehicle",
            LoanPurpose::Appliances => "appliances",
            LoanPurpose::Wedding => "wedding",
            LoanPurpose::Travel => "travel",
            LoanPurpose::Emergency => "emergency",
            LoanPurpose::Utilities => "utilities",
            LoanPurpose::Childcare => "childcare",
            LoanPurpose::Other => "other",
        }
    }
}

impl FromStr for LoanPurpose {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoanPurpose::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or(())
    }
}

/// Repayment cadence chosen at application time
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_schedule", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentSchedule {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
}

/// Approval-pipeline state of a loan request
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

/// Repayment-pipeline state of a loan
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "repay_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RepayStatus {
    Pending,
    InRepayment,
    Paid,
    Defaulted,
}

/// Supported currencies
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "currency", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    /// ISO 4217 code, as the payment gateway expects it
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

/// Raw loan row as stored, before schema upcasting
#[derive(Debug, sqlx::FromRow)]
pub struct LoanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: String,
    pub loaned_amount_cents: i64,
    pub funded_amount_cents: i64,
    pub loan_duration_weeks: i32,
    pub payment_schedule: PaymentSchedule,
    pub request_status: RequestStatus,
    pub repay_status: RepayStatus,
    pub amount_repaid_cents: i64,
    pub currency: Currency,
    pub default_rate: Option<f64>,
    pub sort_order: i32,
    pub schema_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Loan model after read-boundary validation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Loan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: LoanPurpose,
    pub loaned_amount_cents: i64,
    pub funded_amount_cents: i64,
    pub loan_duration_weeks: i32,
    pub payment_schedule: PaymentSchedule,
    pub request_status: RequestStatus,
    pub repay_status: RepayStatus,
    pub amount_repaid_cents: i64,
    pub currency: Currency,
    pub default_rate: f64,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Error raised when a stored row no longer fits the current loan contract
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LoanUpcastError {
    #[error("Unknown loan purpose '{0}'")]
    UnknownPurpose(String),

    #[error("Default rate out of range [0, 1]: {0}")]
    DefaultRateOutOfRange(f64),

    #[error("Unsupported loan schema version {0}")]
    UnsupportedVersion(i32),
}

impl TryFrom<LoanRow> for Loan {
    type Error = LoanUpcastError;

    fn try_from(row: LoanRow) -> Result<Self, Self::Error> {
        if row.schema_version < 1 || row.schema_version > LOAN_SCHEMA_VERSION {
            return Err(LoanUpcastError::UnsupportedVersion(row.schema_version));
        }

        // v1 purposes were free text; they upcast only when the text already
        // matches a canonical category.
        let purpose = LoanPurpose::from_str(&row.purpose)
            .map_err(|_| LoanUpcastError::UnknownPurpose(row.purpose.clone()))?;

        // v1 rows predate default_rate; absent means "no estimate yet".
        let default_rate = row.default_rate.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&default_rate) {
            return Err(LoanUpcastError::DefaultRateOutOfRange(default_rate));
        }

        Ok(Loan {
            id: row.id,
            user_id: row.user_id,
            purpose,
            loaned_amount_cents: row.loaned_amount_cents,
            funded_amount_cents: row.funded_amount_cents,
            loan_duration_weeks: row.loan_duration_weeks,
            payment_schedule: row.payment_schedule,
            request_status: row.request_status,
            repay_status: row.repay_status,
            amount_repaid_cents: row.amount_repaid_cents,
            currency: row.currency,
            default_rate,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl Loan {
    /// Remaining principal to be repaid, in cents
    pub fn remaining_cents(&self) -> i64 {
        self.loaned_amount_cents - self.amount_repaid_cents
    }

    /// Minimum accepted installment: principal spread over the duration
    /// in weeks, rounded down to whole cents.
    pub fn minimum_installment_cents(&self) -> i64 {
        self.loaned_amount_cents / self.loan_duration_weeks as i64
    }
}

/// Request to apply for a new loan.
///
/// Amount and duration arrive as the raw strings the client form collected;
/// intake validation owns parsing them.
#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub purpose: String,
    pub loaned_amount: String,
    pub loan_duration: String,
    pub payment_schedule: PaymentSchedule,
    pub currency: Currency,
}

/// Request to make a repayment on a loan
#[derive(Debug, Deserialize)]
pub struct MakePaymentRequest {
    pub amount_cents: i64,
}

/// Receipt returned after a successful loan payment
#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub loan_id: Uuid,
    pub amount_cents: i64,
    pub amount_repaid_cents: i64,
    pub fully_repaid: bool,
    pub new_balance_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> LoanRow {
        LoanRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            purpose: "education".to_string(),
            loaned_amount_cents: 100_000,
            funded_amount_cents: 0,
            loan_duration_weeks: 52,
            payment_schedule: PaymentSchedule::Monthly,
            request_status: RequestStatus::Approved,
            repay_status: RepayStatus::InRepayment,
            amount_repaid_cents: 0,
            currency: Currency::Usd,
            default_rate: Some(0.2),
            sort_order: 0,
            schema_version: LOAN_SCHEMA_VERSION,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_purpose_round_trip() {
        for purpose in LoanPurpose::ALL {
            assert_eq!(LoanPurpose::from_str(purpose.as_str()), Ok(purpose));
        }
        assert_eq!(LoanPurpose::ALL.len(), 15);
    }

    #[test]
    fn test_upcast_current_version() {
        let loan = Loan::try_from(sample_row()).unwrap();
        assert_eq!(loan.purpose, LoanPurpose::Education);
        assert_eq!(loan.default_rate, 0.2);
    }

    #[test]
    fn test_upcast_v1_defaults_missing_rate() {
        let mut row = sample_row();
        row.schema_version = 1;
        row.default_rate = None;
        let loan = Loan::try_from(row).unwrap();
        assert_eq!(loan.default_rate, 0.0);
    }

    #[test]
    fn test_upcast_rejects_free_text_purpose() {
        let mut row = sample_row();
        row.purpose = "buy a boat".to_string();
        assert_eq!(
            Loan::try_from(row),
            Err(LoanUpcastError::UnknownPurpose("buy a boat".to_string()))
        );
    }

    #[test]
    fn test_upcast_rejects_future_version() {
        let mut row = sample_row();
        row.schema_version = LOAN_SCHEMA_VERSION + 1;
        assert!(matches!(
            Loan::try_from(row),
            Err(LoanUpcastError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_upcast_rejects_out_of_range_rate() {
        let mut row = sample_row();
        row.default_rate = Some(1.2);
        assert_eq!(
            Loan::try_from(row),
            Err(LoanUpcastError::DefaultRateOutOfRange(1.2))
        );
    }

    #[test]
    fn test_minimum_installment() {
        let loan = Loan::try_from(sample_row()).unwrap();
        // 100_000 cents over 52 weeks
        assert_eq!(loan.minimum_installment_cents(), 1923);
    }
}
