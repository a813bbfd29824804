//! Loan service layer - application intake, listing, and repayment

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::activity::{ActivityStatus, ActivityType, NewActivity};
use crate::activity_service::ActivityService;
use crate::error::{ApiError, ApiResult};
use crate::loan::{
    CreateLoanRequest, Loan, LoanPurpose, LoanRow, RepayStatus, RequestStatus, PaymentReceipt,
    LOAN_SCHEMA_VERSION, PAID_LOAN_SORT_ORDER,
};
use crate::models::User;

/// A single field-level intake validation failure
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Validated loan application input, produced by [`validate_loan_request`]
#[derive(Debug)]
pub struct ValidatedLoanInput {
    pub purpose: LoanPurpose,
    pub loaned_amount_cents: i64,
    pub loan_duration_weeks: i32,
}

/// Parse a user-entered decimal amount into cents.
///
/// Returns None for non-numeric, non-finite, or non-positive input.
fn parse_amount_cents(input: &str) -> Option<i64> {
    let value: f64 = input.trim().parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some((value * 100.0).round() as i64)
}

/// Validate a loan application against the intake rules.
///
/// All failing fields are reported together so the client can surface
/// per-field messages; nothing is written unless every field passes.
pub fn validate_loan_request(
    request: &CreateLoanRequest,
    max_amount_cents: i64,
    max_duration_weeks: i32,
) -> Result<ValidatedLoanInput, Vec<FieldError>> {
    let mut errors = Vec::new();

    let purpose = match request.purpose.parse::<LoanPurpose>() {
        Ok(p) => Some(p),
        Err(_) => {
            errors.push(FieldError {
                field: "purpose",
                message: "Please choose one of the listed loan purposes".to_string(),
            });
            None
        }
    };

    let loaned_amount_cents = match parse_amount_cents(&request.loaned_amount) {
        Some(cents) if cents <= max_amount_cents => Some(cents),
        Some(_) => {
            errors.push(FieldError {
                field: "loaned_amount",
                message: format!("Maximum loan amount is {:.2}", max_amount_cents as f64 / 100.0),
            });
            None
        }
        None => {
            errors.push(FieldError {
                field: "loaned_amount",
                message: "Please enter a valid amount".to_string(),
            });
            None
        }
    };

    let loan_duration_weeks = match request.loan_duration.trim().parse::<i32>() {
        Ok(weeks) if weeks > 0 && weeks <= max_duration_weeks => Some(weeks),
        Ok(weeks) if weeks > 0 => {
            errors.push(FieldError {
                field: "loan_duration",
                message: format!("Maximum loan duration is {} weeks", max_duration_weeks),
            });
            None
        }
        _ => {
            errors.push(FieldError {
                field: "loan_duration",
                message: "Please enter a valid duration".to_string(),
            });
            None
        }
    };

    match (purpose, loaned_amount_cents, loan_duration_weeks) {
        (Some(purpose), Some(loaned_amount_cents), Some(loan_duration_weeks)) => {
            Ok(ValidatedLoanInput {
                purpose,
                loaned_amount_cents,
                loan_duration_weeks,
            })
        }
        _ => Err(errors),
    }
}

fn intake_errors_to_api(errors: Vec<FieldError>) -> ApiError {
    let joined = errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");
    ApiError::ValidationError(joined)
}

/// Loan service for managing the loan lifecycle
#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
    activity_service: ActivityService,
    max_amount_cents: i64,
    max_duration_weeks: i32,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(
        db_pool: PgPool,
        activity_service: ActivityService,
        max_amount_cents: i64,
        max_duration_weeks: i32,
    ) -> Self {
        Self {
            db_pool,
            activity_service,
            max_amount_cents,
            max_duration_weeks,
        }
    }

    /// Submit a loan application, creating the loan in pending status
    pub async fn create_loan(&self, user_id: Uuid, request: CreateLoanRequest) -> ApiResult<Loan> {
        let input = validate_loan_request(&request, self.max_amount_cents, self.max_duration_weeks)
            .map_err(intake_errors_to_api)?;

        let now = Utc::now();
        let row = sqlx::query_as::<_, LoanRow>(
            r#"
            INSERT INTO loans (
                id, user_id, purpose, loaned_amount_cents, funded_amount_cents,
                loan_duration_weeks, payment_schedule, request_status, repay_status,
                amount_repaid_cents, currency, default_rate, sort_order,
                schema_version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 0, $5, $6, $7, $8, 0, $9, 0.0, 0, $10, $11, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(input.purpose.as_str())
        .bind(input.loaned_amount_cents)
        .bind(input.loan_duration_weeks)
        .bind(request.payment_schedule)
        .bind(RequestStatus::Pending)
        .bind(RepayStatus::Pending)
        .bind(request.currency)
        .bind(LOAN_SCHEMA_VERSION)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        let loan = Loan::try_from(row).map_err(|e| ApiError::InternalError(e.to_string()))?;

        tracing::info!(
            loan_id = %loan.id,
            user_id = %user_id,
            amount_cents = loan.loaned_amount_cents,
            "Loan application submitted"
        );

        Ok(loan)
    }

    /// Get a loan by ID, restricted to its owner
    pub async fn get_loan(&self, user_id: Uuid, loan_id: Uuid) -> ApiResult<Loan> {
        let row = sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = $1")
            .bind(loan_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        let loan = Loan::try_from(row).map_err(|e| ApiError::ValidationError(e.to_string()))?;

        if loan.user_id != user_id {
            return Err(ApiError::Forbidden("Loan belongs to another user".to_string()));
        }

        Ok(loan)
    }

    /// List a user's loans, repaid loans last, most recently touched first
    pub async fn list_loans(&self, user_id: Uuid) -> ApiResult<Vec<Loan>> {
        let rows = sqlx::query_as::<_, LoanRow>(
            r#"
            SELECT * FROM loans
            WHERE user_id = $1
            ORDER BY sort_order ASC, updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        rows.into_iter()
            .map(|row| Loan::try_from(row).map_err(|e| ApiError::ValidationError(e.to_string())))
            .collect()
    }

    /// Count a user's loans still in the approval pipeline
    pub async fn active_loan_count(&self, user_id: Uuid) -> ApiResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM loans
            WHERE user_id = $1 AND request_status IN ('pending', 'approved')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(count)
    }

    /// Apply a repayment to a loan while debiting the payer's balance.
    ///
    /// Both writes commit in one database transaction; loan and user rows
    /// are re-read under `FOR UPDATE` locks (loan first, then user) so
    /// concurrent payments against the same loan serialize rather than
    /// racing on stale reads. Logical failures leave both rows untouched
    /// and are terminal: callers must not retry them.
    pub async fn apply_payment(
        &self,
        user_id: Uuid,
        loan_id: Uuid,
        amount_cents: i64,
    ) -> ApiResult<PaymentReceipt> {
        if amount_cents <= 0 {
            return Err(ApiError::ValidationError(
                "Payment amount must be greater than 0".to_string(),
            ));
        }

        let mut tx = self.db_pool.begin().await?;

        let loan_row =
            sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
                .bind(loan_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

        let loan =
            Loan::try_from(loan_row).map_err(|e| ApiError::ValidationError(e.to_string()))?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let remaining = loan.remaining_cents();
        // The final installment may legitimately be smaller than the floor.
        let minimum_due = loan.minimum_installment_cents().min(remaining);

        if amount_cents < minimum_due {
            return Err(ApiError::PaymentBelowMinimum(minimum_due));
        }
        if amount_cents > remaining {
            return Err(ApiError::PaymentExceedsRemaining(remaining));
        }

        let new_balance = user.balance_cents - amount_cents;
        if new_balance < 0 {
            return Err(ApiError::InsufficientBalance);
        }

        let new_amount_repaid = loan.amount_repaid_cents + amount_cents;
        let fully_repaid = new_amount_repaid >= loan.loaned_amount_cents;
        let now = Utc::now();

        if fully_repaid {
            sqlx::query(
                r#"
                UPDATE loans
                SET amount_repaid_cents = $1, repay_status = $2, request_status = $3,
                    sort_order = $4, updated_at = $5
                WHERE id = $6
                "#,
            )
            .bind(new_amount_repaid)
            .bind(RepayStatus::Paid)
            .bind(RequestStatus::Completed)
            .bind(PAID_LOAN_SORT_ORDER)
            .bind(now)
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r#"
                UPDATE loans
                SET amount_repaid_cents = $1, repay_status = $2, updated_at = $3
                WHERE id = $4
                "#,
            )
            .bind(new_amount_repaid)
            .bind(RepayStatus::InRepayment)
            .bind(now)
            .bind(loan_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE users SET balance_cents = $1, updated_at = $2 WHERE id = $3")
            .bind(new_balance)
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            loan_id = %loan_id,
            user_id = %user_id,
            amount_cents,
            fully_repaid,
            "Loan payment processed"
        );

        // The repayment ledger and balance are already committed; the
        // activity record is a single-writer append and needs no lock.
        self.activity_service
            .record(NewActivity {
                activity_type: ActivityType::Loan,
                amount_cents,
                status: ActivityStatus::Completed,
                user_id,
                description: Some(format!(
                    "Loan repayment of {:.2}",
                    amount_cents as f64 / 100.0
                )),
                reference_id: Some(loan_id.to_string()),
            })
            .await?;

        Ok(PaymentReceipt {
            loan_id,
            amount_cents,
            amount_repaid_cents: new_amount_repaid,
            fully_repaid,
            new_balance_cents: new_balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{Currency, PaymentSchedule};

    fn request(purpose: &str, amount: &str, duration: &str) -> CreateLoanRequest {
        CreateLoanRequest {
            purpose: purpose.to_string(),
            loaned_amount: amount.to_string(),
            loan_duration: duration.to_string(),
            payment_schedule: PaymentSchedule::Monthly,
            currency: Currency::Usd,
        }
    }

    #[test]
    fn test_valid_application_parses() {
        let input =
            validate_loan_request(&request("education", "2500.50", "52"), 1_000_000, 104).unwrap();
        assert_eq!(input.purpose, LoanPurpose::Education);
        assert_eq!(input.loaned_amount_cents, 250_050);
        assert_eq!(input.loan_duration_weeks, 52);
    }

    #[test]
    fn test_amount_above_ceiling_rejected() {
        let errors =
            validate_loan_request(&request("business", "15000", "52"), 1_000_000, 104).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "loaned_amount");
        assert!(errors[0].message.contains("Maximum loan amount"));
    }

    #[test]
    fn test_duration_above_ceiling_rejected() {
        let errors =
            validate_loan_request(&request("business", "5000", "200"), 1_000_000, 104).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "loan_duration");
        assert!(errors[0].message.contains("104 weeks"));
    }

    #[test]
    fn test_free_text_purpose_rejected() {
        let errors =
            validate_loan_request(&request("a new boat", "5000", "52"), 1_000_000, 104).unwrap_err();
        assert_eq!(errors[0].field, "purpose");
    }

    #[test]
    fn test_all_invalid_fields_reported_together() {
        let errors =
            validate_loan_request(&request("nope", "abc", "-3"), 1_000_000, 104).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["purpose", "loaned_amount", "loan_duration"]);
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        assert!(validate_loan_request(&request("business", "0", "52"), 1_000_000, 104).is_err());
        assert!(validate_loan_request(&request("business", "-10", "52"), 1_000_000, 104).is_err());
        assert!(validate_loan_request(&request("business", "NaN", "52"), 1_000_000, 104).is_err());
    }

    #[test]
    fn test_amount_exactly_at_ceiling_accepted() {
        let input =
            validate_loan_request(&request("business", "10000", "104"), 1_000_000, 104).unwrap();
        assert_eq!(input.loaned_amount_cents, 1_000_000);
        assert_eq!(input.loan_duration_weeks, 104);
    }
}
