//! Deposit service layer
//!
//! Bridges the gateway checkout flow to user balances. The completion step
//! is split in two recorded stages (capture, then credit) so that a failure
//! between them leaves a resumable `captured` row instead of money that
//! exists externally but not internally. Re-running completion for the same
//! order token never talks to the gateway twice and never credits twice.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::activity::{ActivityStatus, ActivityType};
use crate::deposit::model::{
    Deposit, DepositReceipt, DepositStatus, InitiateDepositRequest, InitiateDepositResponse,
};
use crate::deposit::paypal::PayPalClient;
use crate::error::{ApiError, ApiResult};

/// Deposit service
#[derive(Clone)]
pub struct DepositService {
    db_pool: PgPool,
    gateway: Option<PayPalClient>,
}

impl DepositService {
    /// Create a new deposit service instance.
    ///
    /// `gateway` is None when credentials are not configured; deposit
    /// operations then fail fast with a configuration error.
    pub fn new(db_pool: PgPool, gateway: Option<PayPalClient>) -> Self {
        Self { db_pool, gateway }
    }

    fn gateway(&self) -> ApiResult<&PayPalClient> {
        self.gateway.as_ref().ok_or_else(|| {
            ApiError::GatewayNotConfigured(
                "Payment gateway credentials are not configured".to_string(),
            )
        })
    }

    /// Start a deposit checkout: create a gateway order and record it.
    ///
    /// Returns the approval URL the client must redirect the user to.
    pub async fn initiate(
        &self,
        user_id: Uuid,
        request: InitiateDepositRequest,
    ) -> ApiResult<InitiateDepositResponse> {
        request.validate()?;
        let gateway = self.gateway()?;

        let description = format!(
            "Deposit of {} {}",
            crate::deposit::paypal::format_cents(request.amount_cents),
            request.currency.code()
        );

        let order = gateway
            .create_order(
                request.amount_cents,
                request.currency,
                &description,
                &user_id.to_string(),
            )
            .await?;

        let now = Utc::now();
        let deposit = sqlx::query_as::<_, Deposit>(
            r#"
            INSERT INTO deposits (
                id, user_id, order_id, amount_cents, currency, status,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&order.order_id)
        .bind(request.amount_cents)
        .bind(request.currency)
        .bind(DepositStatus::Created)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            deposit_id = %deposit.id,
            order_id = %order.order_id,
            amount_cents = request.amount_cents,
            "Deposit checkout initiated"
        );

        Ok(InitiateDepositResponse {
            deposit_id: deposit.id,
            order_id: order.order_id,
            approval_url: order.approval_url,
        })
    }

    /// Complete a deposit after the gateway redirect.
    ///
    /// Stage one captures the payment and records the result on the deposit
    /// row. Stage two credits the balance inside one database transaction,
    /// guarded by the row's status, and appends the deposit activity. Either
    /// stage can be retried by calling this again with the same token.
    pub async fn complete(&self, user_id: Uuid, order_token: &str) -> ApiResult<DepositReceipt> {
        let deposit = sqlx::query_as::<_, Deposit>("SELECT * FROM deposits WHERE order_id = $1")
            .bind(order_token)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Deposit not found".to_string()))?;

        if deposit.user_id != user_id {
            return Err(ApiError::Forbidden(
                "Deposit belongs to another user".to_string(),
            ));
        }

        let deposit = match deposit.status {
            DepositStatus::Created => self.capture_stage(deposit).await?,
            DepositStatus::Captured => deposit,
            DepositStatus::Credited => {
                // Already fully processed; report the current state instead
                // of crediting again.
                let user_balance = self.current_balance(user_id).await?;
                return Ok(DepositReceipt {
                    deposit_id: deposit.id,
                    credited_cents: deposit.captured_amount_cents.unwrap_or(0),
                    new_balance_cents: user_balance,
                });
            }
            DepositStatus::Failed => {
                return Err(ApiError::BadRequest(
                    "Deposit has failed and cannot be completed".to_string(),
                ))
            }
        };

        self.credit_stage(deposit).await
    }

    /// Stage one: capture through the gateway, record the result.
    ///
    /// This is the only place the capture call is made; once the row says
    /// `captured`, retries skip straight to crediting.
    async fn capture_stage(&self, deposit: Deposit) -> ApiResult<Deposit> {
        let gateway = self.gateway()?;
        let captured = gateway.capture_order(&deposit.order_id).await?;

        let deposit = sqlx::query_as::<_, Deposit>(
            r#"
            UPDATE deposits
            SET status = $1, captured_amount_cents = $2, capture_id = $3, updated_at = $4
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(DepositStatus::Captured)
        .bind(captured.amount_cents)
        .bind(&captured.capture_id)
        .bind(Utc::now())
        .bind(deposit.id)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            deposit_id = %deposit.id,
            capture_id = %captured.capture_id,
            amount_cents = captured.amount_cents,
            "Gateway capture recorded"
        );

        Ok(deposit)
    }

    /// Stage two: credit the balance and append the activity, atomically.
    async fn credit_stage(&self, deposit: Deposit) -> ApiResult<DepositReceipt> {
        let mut tx = self.db_pool.begin().await?;

        // Re-read under lock: a concurrent completion may have advanced the
        // row between our read and this transaction.
        let locked =
            sqlx::query_as::<_, Deposit>("SELECT * FROM deposits WHERE id = $1 FOR UPDATE")
                .bind(deposit.id)
                .fetch_one(&mut *tx)
                .await?;

        let amount_cents = match (locked.status, locked.captured_amount_cents) {
            (DepositStatus::Captured, Some(cents)) => cents,
            (DepositStatus::Credited, cents) => {
                // Lost the race to another completion call; nothing to do.
                tx.rollback().await?;
                let balance = self.current_balance(locked.user_id).await?;
                return Ok(DepositReceipt {
                    deposit_id: locked.id,
                    credited_cents: cents.unwrap_or(0),
                    new_balance_cents: balance,
                });
            }
            _ => {
                return Err(ApiError::InternalError(format!(
                    "Deposit {} in unexpected state for crediting",
                    locked.id
                )))
            }
        };

        let (balance,): (i64,) =
            sqlx::query_as("SELECT balance_cents FROM users WHERE id = $1 FOR UPDATE")
                .bind(locked.user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let new_balance = balance + amount_cents;
        let now = Utc::now();

        sqlx::query("UPDATE users SET balance_cents = $1, updated_at = $2 WHERE id = $3")
            .bind(new_balance)
            .bind(now)
            .bind(locked.user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO activities (id, activity_type, amount_cents, date, status, user_id, description, reference_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(ActivityType::Deposit)
        .bind(amount_cents)
        .bind(now)
        .bind(ActivityStatus::Completed)
        .bind(locked.user_id)
        .bind(format!(
            "Deposit of {}",
            crate::deposit::paypal::format_cents(amount_cents)
        ))
        .bind(locked.capture_id.clone())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE deposits SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(DepositStatus::Credited)
            .bind(now)
            .bind(locked.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            deposit_id = %locked.id,
            user_id = %locked.user_id,
            amount_cents,
            new_balance_cents = new_balance,
            "Deposit credited"
        );

        Ok(DepositReceipt {
            deposit_id: locked.id,
            credited_cents: amount_cents,
            new_balance_cents: new_balance,
        })
    }

    async fn current_balance(&self, user_id: Uuid) -> ApiResult<i64> {
        let (balance,): (i64,) =
            sqlx::query_as("SELECT balance_cents FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.db_pool)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        Ok(balance)
    }
}
