//! Bundle service layer
//!
//! The interest rate is re-derived from the member loans' current default
//! rates on every read and every mutation (pure re-derivation on access;
//! no dirty flag). The refreshed value is persisted for display, but the
//! source of truth stays the computation itself.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::bundle::{Bundle, CreateBundleRequest, UpdateBundleRequest};
use crate::error::{ApiError, ApiResult};
use crate::services::pricing::{compute_interest_rate, PricingError};

fn pricing_to_api(err: PricingError) -> ApiError {
    match err {
        PricingError::UndefinedDefaultRate => ApiError::UndefinedDefaultRate,
        other => ApiError::ValidationError(other.to_string()),
    }
}

/// Bundle service
#[derive(Clone)]
pub struct BundleService {
    db_pool: PgPool,
}

impl BundleService {
    /// Create a new bundle service instance
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Fetch the default rates of the given loans, failing if any is missing.
    ///
    /// Rows that predate the default_rate column count as 0.0, matching the
    /// loan read boundary.
    async fn member_default_rates(&self, loan_ids: &[Uuid]) -> ApiResult<Vec<f64>> {
        let rows: Vec<(Uuid, Option<f64>)> =
            sqlx::query_as("SELECT id, default_rate FROM loans WHERE id = ANY($1)")
                .bind(loan_ids)
                .fetch_all(&self.db_pool)
                .await?;

        if rows.len() != loan_ids.len() {
            let found: Vec<Uuid> = rows.iter().map(|(id, _)| *id).collect();
            let message = match loan_ids.iter().find(|id| !found.contains(id)) {
                Some(missing) => format!("Loan {} not found", missing),
                None => "Loan not found".to_string(),
            };
            return Err(ApiError::NotFound(message));
        }

        Ok(rows.into_iter().map(|(_, rate)| rate.unwrap_or(0.0)).collect())
    }

    /// Recompute a bundle's interest rate from live loan data
    async fn derive_rate(&self, loan_ids: &[Uuid], m: f64) -> ApiResult<f64> {
        let rates = self.member_default_rates(loan_ids).await?;
        compute_interest_rate(&rates, m).map_err(pricing_to_api)
    }

    /// Persist a freshly derived rate so listings show current numbers
    async fn store_rate(&self, bundle_id: Uuid, i_rate: f64) -> ApiResult<()> {
        sqlx::query("UPDATE bundles SET i_rate = $1 WHERE id = $2")
            .bind(i_rate)
            .bind(bundle_id)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    /// Create a bundle over the given loans
    pub async fn create_bundle(&self, request: CreateBundleRequest) -> ApiResult<Bundle> {
        request.validate()?;

        let i_rate = self.derive_rate(&request.loan_ids, request.m).await?;

        let bundle = sqlx::query_as::<_, Bundle>(
            r#"
            INSERT INTO bundles (
                id, bundle_id, loan_ids, m, name, description, value_cents,
                active, i_rate, created_at, end_date
            )
            VALUES (
                $1,
                (SELECT COALESCE(MAX(bundle_id), 0) + 1 FROM bundles),
                $2, $3, $4, $5, $6, TRUE, $7, $8, $9
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.loan_ids)
        .bind(request.m)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.value_cents)
        .bind(i_rate)
        .bind(Utc::now())
        .bind(request.end_date)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            bundle_id = bundle.bundle_id,
            loans = bundle.loan_ids.len(),
            i_rate,
            "Bundle created"
        );

        Ok(bundle)
    }

    /// Get a bundle with its interest rate re-derived from current loan data
    pub async fn get_bundle(&self, id: Uuid) -> ApiResult<Bundle> {
        let mut bundle = sqlx::query_as::<_, Bundle>("SELECT * FROM bundles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Bundle not found".to_string()))?;

        bundle.i_rate = self.derive_rate(&bundle.loan_ids, bundle.m).await?;
        self.store_rate(bundle.id, bundle.i_rate).await?;

        Ok(bundle)
    }

    /// List active bundles, newest first, each with a freshly derived rate
    pub async fn list_active_bundles(&self) -> ApiResult<Vec<Bundle>> {
        let mut bundles = sqlx::query_as::<_, Bundle>(
            "SELECT * FROM bundles WHERE active = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(&self.db_pool)
        .await?;

        for bundle in &mut bundles {
            bundle.i_rate = self.derive_rate(&bundle.loan_ids, bundle.m).await?;
            self.store_rate(bundle.id, bundle.i_rate).await?;
        }

        Ok(bundles)
    }

    /// List bundles containing the given loan
    pub async fn bundles_by_loan(&self, loan_id: Uuid) -> ApiResult<Vec<Bundle>> {
        let mut bundles = sqlx::query_as::<_, Bundle>(
            "SELECT * FROM bundles WHERE $1 = ANY(loan_ids) ORDER BY created_at DESC",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;

        for bundle in &mut bundles {
            bundle.i_rate = self.derive_rate(&bundle.loan_ids, bundle.m).await?;
        }

        Ok(bundles)
    }

    /// Update a bundle; loan-set or multiplier changes re-derive the rate
    pub async fn update_bundle(&self, id: Uuid, request: UpdateBundleRequest) -> ApiResult<Bundle> {
        request.validate()?;

        let current = sqlx::query_as::<_, Bundle>("SELECT * FROM bundles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Bundle not found".to_string()))?;

        let loan_ids = request.loan_ids.unwrap_or(current.loan_ids);
        if loan_ids.is_empty() {
            return Err(ApiError::ValidationError(
                "A bundle must reference at least one loan".to_string(),
            ));
        }
        let m = request.m.unwrap_or(current.m);

        // Pricing inputs may have changed; always leave a consistent rate.
        let i_rate = self.derive_rate(&loan_ids, m).await?;

        let bundle = sqlx::query_as::<_, Bundle>(
            r#"
            UPDATE bundles
            SET loan_ids = $1, m = $2, name = $3, description = $4,
                value_cents = $5, active = $6, end_date = $7, i_rate = $8
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(&loan_ids)
        .bind(m)
        .bind(request.name.unwrap_or(current.name))
        .bind(request.description.unwrap_or(current.description))
        .bind(request.value_cents.unwrap_or(current.value_cents))
        .bind(request.active.unwrap_or(current.active))
        .bind(request.end_date.unwrap_or(current.end_date))
        .bind(i_rate)
        .bind(id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(bundle)
    }

    /// Add a loan to a bundle, re-deriving the rate
    pub async fn add_loan(&self, id: Uuid, loan_id: Uuid) -> ApiResult<Bundle> {
        let current = self.get_bundle(id).await?;

        if current.loan_ids.contains(&loan_id) {
            return Ok(current);
        }

        let mut loan_ids = current.loan_ids;
        loan_ids.push(loan_id);

        self.update_bundle(
            id,
            UpdateBundleRequest {
                loan_ids: Some(loan_ids),
                m: None,
                name: None,
                description: None,
                value_cents: None,
                active: None,
                end_date: None,
            },
        )
        .await
    }

    /// Remove a loan from a bundle, re-deriving the rate
    pub async fn remove_loan(&self, id: Uuid, loan_id: Uuid) -> ApiResult<Bundle> {
        let current = self.get_bundle(id).await?;

        let loan_ids: Vec<Uuid> = current
            .loan_ids
            .into_iter()
            .filter(|id| *id != loan_id)
            .collect();

        if loan_ids.is_empty() {
            return Err(ApiError::ValidationError(
                "Removing the last loan would leave an unpriceable bundle".to_string(),
            ));
        }

        self.update_bundle(
            id,
            UpdateBundleRequest {
                loan_ids: Some(loan_ids),
                m: None,
                name: None,
                description: None,
                value_cents: None,
                active: None,
                end_date: None,
            },
        )
        .await
    }

    /// Delete a bundle. Member loans are untouched: the bundle holds only
    /// non-owning references.
    pub async fn delete_bundle(&self, id: Uuid) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM bundles WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Bundle not found".to_string()));
        }

        tracing::info!(bundle_id = %id, "Bundle deleted");

        Ok(())
    }
}
