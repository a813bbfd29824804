//! Loan payment transaction tests
//!
//! These tests exercise the all-or-nothing repayment path against a real
//! database: the ledger and balance must move together or not at all.
//! They require a PostgreSQL instance and are ignored by default; run with
//! `cargo test -- --ignored` after setting TEST_DATABASE_URL.

use sqlx::PgPool;
use uuid::Uuid;

use bundle_server::activity_service::ActivityService;
use bundle_server::error::ApiError;
use bundle_server::loan::{LoanRow, RepayStatus, RequestStatus, LOAN_SCHEMA_VERSION};
use bundle_server::loan_service::LoanService;

/// Helper to create a test database pool
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost/bundle_test".to_string());

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Insert a user with the given balance, returning its id
async fn seed_user(pool: &PgPool, balance_cents: i64) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, country, region, gender, risk_score,
                           balance_cents, created_at, updated_at)
        VALUES ($1, $2, $3, 'US', 'CA', 'prefer_not_to_say', 0, $4, NOW(), NOW())
        "#,
    )
    .bind(id)
    .bind(format!("Test User {}", id))
    .bind(format!("{}@test.example", id))
    .bind(balance_cents)
    .execute(pool)
    .await
    .expect("Failed to seed user");
    id
}

/// Insert an approved loan mid-repayment, returning its id
async fn seed_loan(
    pool: &PgPool,
    user_id: Uuid,
    loaned_cents: i64,
    repaid_cents: i64,
    duration_weeks: i32,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO loans (id, user_id, purpose, loaned_amount_cents, funded_amount_cents,
                           loan_duration_weeks, payment_schedule, request_status, repay_status,
                           amount_repaid_cents, currency, default_rate, sort_order,
                           schema_version, created_at, updated_at)
        VALUES ($1, $2, 'business', $3, $3, $4, 'monthly', 'approved', 'in_repayment',
                $5, 'USD', 0.1, 0, $6, NOW(), NOW())
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(loaned_cents)
    .bind(duration_weeks)
    .bind(repaid_cents)
    .bind(LOAN_SCHEMA_VERSION)
    .execute(pool)
    .await
    .expect("Failed to seed loan");
    id
}

async fn fetch_loan(pool: &PgPool, id: Uuid) -> LoanRow {
    sqlx::query_as::<_, LoanRow>("SELECT * FROM loans WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("Loan should exist")
}

async fn fetch_balance(pool: &PgPool, id: Uuid) -> i64 {
    let (balance,): (i64,) = sqlx::query_as("SELECT balance_cents FROM users WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("User should exist");
    balance
}

fn service(pool: &PgPool) -> LoanService {
    LoanService::new(
        pool.clone(),
        ActivityService::new(pool.clone()),
        1_000_000,
        104,
    )
}

// ============================================================================
// Final payment: ledger, statuses, and balance move together
// ============================================================================

#[tokio::test]
#[ignore] // Requires database setup
async fn test_final_payment_completes_loan() {
    let pool = setup_test_db().await;

    // Loan of 1000.00 with 800.00 repaid; payer holds 300.00
    let user_id = seed_user(&pool, 30_000).await;
    let loan_id = seed_loan(&pool, user_id, 100_000, 80_000, 50).await;

    let receipt = service(&pool)
        .apply_payment(user_id, loan_id, 20_000)
        .await
        .expect("Payment should succeed");

    assert_eq!(receipt.amount_repaid_cents, 100_000);
    assert!(receipt.fully_repaid);
    assert_eq!(receipt.new_balance_cents, 10_000);

    // The status flip commits atomically with the ledger update
    let loan = fetch_loan(&pool, loan_id).await;
    assert_eq!(loan.amount_repaid_cents, 100_000);
    assert_eq!(loan.repay_status, RepayStatus::Paid);
    assert_eq!(loan.request_status, RequestStatus::Completed);
    assert_eq!(fetch_balance(&pool, user_id).await, 10_000);
}

// ============================================================================
// Insufficient balance: neither entity moves
// ============================================================================

#[tokio::test]
#[ignore] // Requires database setup
async fn test_insufficient_balance_is_a_no_op() {
    let pool = setup_test_db().await;

    // Same loan, but the payer only holds 100.00
    let user_id = seed_user(&pool, 10_000).await;
    let loan_id = seed_loan(&pool, user_id, 100_000, 80_000, 50).await;

    let err = service(&pool)
        .apply_payment(user_id, loan_id, 20_000)
        .await
        .expect_err("Payment should fail");
    assert!(matches!(err, ApiError::InsufficientBalance));

    let loan = fetch_loan(&pool, loan_id).await;
    assert_eq!(loan.amount_repaid_cents, 80_000);
    assert_eq!(loan.repay_status, RepayStatus::InRepayment);
    assert_eq!(fetch_balance(&pool, user_id).await, 10_000);
}

// ============================================================================
// Business-rule rejections
// ============================================================================

#[tokio::test]
#[ignore] // Requires database setup
async fn test_payment_above_remaining_rejected() {
    let pool = setup_test_db().await;

    let user_id = seed_user(&pool, 500_000).await;
    let loan_id = seed_loan(&pool, user_id, 100_000, 80_000, 50).await;

    let err = service(&pool)
        .apply_payment(user_id, loan_id, 30_000)
        .await
        .expect_err("Overpayment should fail");
    assert!(matches!(err, ApiError::PaymentExceedsRemaining(20_000)));

    // The ledger never exceeds the principal and never moved
    let loan = fetch_loan(&pool, loan_id).await;
    assert_eq!(loan.amount_repaid_cents, 80_000);
    assert_eq!(fetch_balance(&pool, user_id).await, 500_000);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_payment_below_installment_rejected() {
    let pool = setup_test_db().await;

    // Installment floor is 100_000 / 50 = 2_000 cents
    let user_id = seed_user(&pool, 500_000).await;
    let loan_id = seed_loan(&pool, user_id, 100_000, 0, 50).await;

    let err = service(&pool)
        .apply_payment(user_id, loan_id, 500)
        .await
        .expect_err("Underpayment should fail");
    assert!(matches!(err, ApiError::PaymentBelowMinimum(2_000)));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_final_payment_smaller_than_installment_allowed() {
    let pool = setup_test_db().await;

    // Remaining 1_000 is below the 2_000 installment floor; paying it off
    // exactly must still be possible.
    let user_id = seed_user(&pool, 500_000).await;
    let loan_id = seed_loan(&pool, user_id, 100_000, 99_000, 50).await;

    let receipt = service(&pool)
        .apply_payment(user_id, loan_id, 1_000)
        .await
        .expect("Final payment should succeed");
    assert!(receipt.fully_repaid);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_missing_loan_rejected() {
    let pool = setup_test_db().await;

    let user_id = seed_user(&pool, 500_000).await;
    let err = service(&pool)
        .apply_payment(user_id, Uuid::new_v4(), 2_000)
        .await
        .expect_err("Unknown loan should fail");
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(fetch_balance(&pool, user_id).await, 500_000);
}

// ============================================================================
// Repeated payments: ledger is monotonic and capped
// ============================================================================

#[tokio::test]
#[ignore] // Requires database setup
async fn test_repayment_ledger_monotonic() {
    let pool = setup_test_db().await;

    let user_id = seed_user(&pool, 200_000).await;
    let loan_id = seed_loan(&pool, user_id, 100_000, 0, 50).await;
    let svc = service(&pool);

    let mut last_repaid = 0;
    for _ in 0..5 {
        let receipt = svc
            .apply_payment(user_id, loan_id, 20_000)
            .await
            .expect("Payment should succeed");
        assert!(receipt.amount_repaid_cents > last_repaid);
        last_repaid = receipt.amount_repaid_cents;
    }

    let loan = fetch_loan(&pool, loan_id).await;
    assert_eq!(loan.amount_repaid_cents, 100_000);
    assert_eq!(loan.repay_status, RepayStatus::Paid);

    // Any further payment is rejected without touching either row
    let err = svc
        .apply_payment(user_id, loan_id, 20_000)
        .await
        .expect_err("Paying a settled loan should fail");
    assert!(matches!(err, ApiError::PaymentExceedsRemaining(0)));
    assert_eq!(fetch_balance(&pool, user_id).await, 100_000);
}
