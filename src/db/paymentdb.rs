// db/paymentdb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgConnection;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::paymentmodel::*;

/// Shared `approved -> paid` transition, used by both settlement paths so the
/// guard lives in exactly one place. Zero rows affected means the request is
/// missing, foreign, or not in `approved`.
pub(crate) async fn mark_request_paid(
    conn: &mut PgConnection,
    request_id: Uuid,
    method: SettlementMethod,
) -> Result<Option<PaymentRequest>, sqlx::Error> {
    sqlx::query_as::<_, PaymentRequest>(
        r#"
        UPDATE stage_payment_requests
        SET status = 'paid',
            settlement_method = $2,
            payment_date = NOW(),
            updated_at = NOW()
        WHERE id = $1 AND status = 'approved'
        RETURNING
            id, project_id, contractor_id, homeowner_id, stage_name,
            requested_amount, approved_amount, completion_percentage,
            work_description, materials_used, labor_count,
            contractor_notes, homeowner_notes, rejection_reason,
            status, settlement_method,
            request_date, response_date, payment_date,
            created_at, updated_at
        "#,
    )
    .bind(request_id)
    .bind(method)
    .fetch_optional(conn)
    .await
}

/// Guarded completion of an open gateway attempt, transaction-scoped so the
/// caller can settle the parent request atomically with it.
pub(crate) async fn complete_transaction(
    conn: &mut PgConnection,
    transaction_id: Uuid,
    razorpay_payment_id: String,
    razorpay_signature: String,
) -> Result<Option<PaymentTransaction>, sqlx::Error> {
    sqlx::query_as::<_, PaymentTransaction>(
        r#"
        UPDATE stage_payment_transactions
        SET status = 'completed',
            razorpay_payment_id = $2,
            razorpay_signature = $3,
            updated_at = NOW()
        WHERE id = $1 AND status IN ('created', 'pending')
        RETURNING
            id, payment_request_id, homeowner_id, contractor_id,
            amount, currency,
            razorpay_order_id, razorpay_payment_id, razorpay_signature,
            status, created_at, updated_at
        "#,
    )
    .bind(transaction_id)
    .bind(razorpay_payment_id)
    .bind(razorpay_signature)
    .fetch_optional(conn)
    .await
}

/// Transaction-scoped fetch, for settlement paths that need to re-check the
/// request state before deciding to commit.
pub(crate) async fn get_request(
    conn: &mut PgConnection,
    request_id: Uuid,
) -> Result<Option<PaymentRequest>, sqlx::Error> {
    sqlx::query_as::<_, PaymentRequest>(
        r#"
        SELECT
            id, project_id, contractor_id, homeowner_id, stage_name,
            requested_amount, approved_amount, completion_percentage,
            work_description, materials_used, labor_count,
            contractor_notes, homeowner_notes, rejection_reason,
            status, settlement_method,
            request_date, response_date, payment_date,
            created_at, updated_at
        FROM stage_payment_requests
        WHERE id = $1
        "#,
    )
    .bind(request_id)
    .fetch_optional(conn)
    .await
}

#[async_trait]
pub trait StagePaymentExt {
    #[allow(clippy::too_many_arguments)]
    async fn create_payment_request(
        &self,
        project_id: Uuid,
        contractor_id: Uuid,
        homeowner_id: Uuid,
        stage_name: String,
        requested_amount: BigDecimal,
        completion_percentage: BigDecimal,
        work_description: String,
        materials_used: Option<String>,
        labor_count: Option<i32>,
        contractor_notes: Option<String>,
    ) -> Result<PaymentRequest, sqlx::Error>;

    async fn get_payment_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<PaymentRequest>, sqlx::Error>;

    async fn get_contractor_payment_requests(
        &self,
        contractor_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentRequest>, sqlx::Error>;

    async fn get_homeowner_payment_requests(
        &self,
        homeowner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentRequest>, sqlx::Error>;

    /// Guarded `pending -> approved`; `None` when no pending row matched.
    async fn approve_payment_request(
        &self,
        request_id: Uuid,
        homeowner_id: Uuid,
        approved_amount: BigDecimal,
        homeowner_notes: Option<String>,
    ) -> Result<Option<PaymentRequest>, sqlx::Error>;

    /// Guarded `pending -> rejected`; `None` when no pending row matched.
    async fn reject_payment_request(
        &self,
        request_id: Uuid,
        homeowner_id: Uuid,
        rejection_reason: String,
        homeowner_notes: Option<String>,
    ) -> Result<Option<PaymentRequest>, sqlx::Error>;

    async fn create_payment_transaction(
        &self,
        payment_request_id: Uuid,
        homeowner_id: Uuid,
        contractor_id: Uuid,
        amount: BigDecimal,
        currency: String,
        razorpay_order_id: String,
    ) -> Result<PaymentTransaction, sqlx::Error>;

    /// Open attempt for a callback: matched by request, owner and order id,
    /// still in `created` or `pending`.
    async fn get_open_transaction(
        &self,
        payment_request_id: Uuid,
        homeowner_id: Uuid,
        razorpay_order_id: &str,
    ) -> Result<Option<PaymentTransaction>, sqlx::Error>;

    async fn get_request_transactions(
        &self,
        payment_request_id: Uuid,
    ) -> Result<Vec<PaymentTransaction>, sqlx::Error>;

    /// Failed attempts are kept for audit; the row is never reused.
    async fn fail_payment_transaction(
        &self,
        transaction_id: Uuid,
        razorpay_payment_id: String,
        razorpay_signature: String,
    ) -> Result<Option<PaymentTransaction>, sqlx::Error>;
}

#[async_trait]
impl StagePaymentExt for DBClient {
    async fn create_payment_request(
        &self,
        project_id: Uuid,
        contractor_id: Uuid,
        homeowner_id: Uuid,
        stage_name: String,
        requested_amount: BigDecimal,
        completion_percentage: BigDecimal,
        work_description: String,
        materials_used: Option<String>,
        labor_count: Option<i32>,
        contractor_notes: Option<String>,
    ) -> Result<PaymentRequest, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            INSERT INTO stage_payment_requests
                (project_id, contractor_id, homeowner_id, stage_name,
                 requested_amount, completion_percentage, work_description,
                 materials_used, labor_count, contractor_notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
            RETURNING
                id, project_id, contractor_id, homeowner_id, stage_name,
                requested_amount, approved_amount, completion_percentage,
                work_description, materials_used, labor_count,
                contractor_notes, homeowner_notes, rejection_reason,
                status, settlement_method,
                request_date, response_date, payment_date,
                created_at, updated_at
            "#,
        )
        .bind(project_id)
        .bind(contractor_id)
        .bind(homeowner_id)
        .bind(stage_name)
        .bind(requested_amount)
        .bind(completion_percentage)
        .bind(work_description)
        .bind(materials_used)
        .bind(labor_count)
        .bind(contractor_notes)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_payment_request(
        &self,
        request_id: Uuid,
    ) -> Result<Option<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            SELECT
                id, project_id, contractor_id, homeowner_id, stage_name,
                requested_amount, approved_amount, completion_percentage,
                work_description, materials_used, labor_count,
                contractor_notes, homeowner_notes, rejection_reason,
                status, settlement_method,
                request_date, response_date, payment_date,
                created_at, updated_at
            FROM stage_payment_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_contractor_payment_requests(
        &self,
        contractor_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            SELECT
                id, project_id, contractor_id, homeowner_id, stage_name,
                requested_amount, approved_amount, completion_percentage,
                work_description, materials_used, labor_count,
                contractor_notes, homeowner_notes, rejection_reason,
                status, settlement_method,
                request_date, response_date, payment_date,
                created_at, updated_at
            FROM stage_payment_requests
            WHERE contractor_id = $1
            ORDER BY request_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(contractor_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_homeowner_payment_requests(
        &self,
        homeowner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            SELECT
                id, project_id, contractor_id, homeowner_id, stage_name,
                requested_amount, approved_amount, completion_percentage,
                work_description, materials_used, labor_count,
                contractor_notes, homeowner_notes, rejection_reason,
                status, settlement_method,
                request_date, response_date, payment_date,
                created_at, updated_at
            FROM stage_payment_requests
            WHERE homeowner_id = $1
            ORDER BY request_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(homeowner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn approve_payment_request(
        &self,
        request_id: Uuid,
        homeowner_id: Uuid,
        approved_amount: BigDecimal,
        homeowner_notes: Option<String>,
    ) -> Result<Option<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            UPDATE stage_payment_requests
            SET status = 'approved',
                approved_amount = $3,
                homeowner_notes = $4,
                response_date = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND homeowner_id = $2 AND status = 'pending'
            RETURNING
                id, project_id, contractor_id, homeowner_id, stage_name,
                requested_amount, approved_amount, completion_percentage,
                work_description, materials_used, labor_count,
                contractor_notes, homeowner_notes, rejection_reason,
                status, settlement_method,
                request_date, response_date, payment_date,
                created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(homeowner_id)
        .bind(approved_amount)
        .bind(homeowner_notes)
        .fetch_optional(&self.pool)
        .await
    }

    async fn reject_payment_request(
        &self,
        request_id: Uuid,
        homeowner_id: Uuid,
        rejection_reason: String,
        homeowner_notes: Option<String>,
    ) -> Result<Option<PaymentRequest>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRequest>(
            r#"
            UPDATE stage_payment_requests
            SET status = 'rejected',
                rejection_reason = $3,
                homeowner_notes = $4,
                response_date = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND homeowner_id = $2 AND status = 'pending'
            RETURNING
                id, project_id, contractor_id, homeowner_id, stage_name,
                requested_amount, approved_amount, completion_percentage,
                work_description, materials_used, labor_count,
                contractor_notes, homeowner_notes, rejection_reason,
                status, settlement_method,
                request_date, response_date, payment_date,
                created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(homeowner_id)
        .bind(rejection_reason)
        .bind(homeowner_notes)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_payment_transaction(
        &self,
        payment_request_id: Uuid,
        homeowner_id: Uuid,
        contractor_id: Uuid,
        amount: BigDecimal,
        currency: String,
        razorpay_order_id: String,
    ) -> Result<PaymentTransaction, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(
            r#"
            INSERT INTO stage_payment_transactions
                (payment_request_id, homeowner_id, contractor_id,
                 amount, currency, razorpay_order_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'created')
            RETURNING
                id, payment_request_id, homeowner_id, contractor_id,
                amount, currency,
                razorpay_order_id, razorpay_payment_id, razorpay_signature,
                status, created_at, updated_at
            "#,
        )
        .bind(payment_request_id)
        .bind(homeowner_id)
        .bind(contractor_id)
        .bind(amount)
        .bind(currency)
        .bind(razorpay_order_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_open_transaction(
        &self,
        payment_request_id: Uuid,
        homeowner_id: Uuid,
        razorpay_order_id: &str,
    ) -> Result<Option<PaymentTransaction>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(
            r#"
            SELECT
                id, payment_request_id, homeowner_id, contractor_id,
                amount, currency,
                razorpay_order_id, razorpay_payment_id, razorpay_signature,
                status, created_at, updated_at
            FROM stage_payment_transactions
            WHERE payment_request_id = $1
              AND homeowner_id = $2
              AND razorpay_order_id = $3
              AND status IN ('created', 'pending')
            LIMIT 1
            "#,
        )
        .bind(payment_request_id)
        .bind(homeowner_id)
        .bind(razorpay_order_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_request_transactions(
        &self,
        payment_request_id: Uuid,
    ) -> Result<Vec<PaymentTransaction>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(
            r#"
            SELECT
                id, payment_request_id, homeowner_id, contractor_id,
                amount, currency,
                razorpay_order_id, razorpay_payment_id, razorpay_signature,
                status, created_at, updated_at
            FROM stage_payment_transactions
            WHERE payment_request_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(payment_request_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn fail_payment_transaction(
        &self,
        transaction_id: Uuid,
        razorpay_payment_id: String,
        razorpay_signature: String,
    ) -> Result<Option<PaymentTransaction>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTransaction>(
            r#"
            UPDATE stage_payment_transactions
            SET status = 'failed',
                razorpay_payment_id = $2,
                razorpay_signature = $3,
                updated_at = NOW()
            WHERE id = $1 AND status IN ('created', 'pending')
            RETURNING
                id, payment_request_id, homeowner_id, contractor_id,
                amount, currency,
                razorpay_order_id, razorpay_payment_id, razorpay_signature,
                status, created_at, updated_at
            "#,
        )
        .bind(transaction_id)
        .bind(razorpay_payment_id)
        .bind(razorpay_signature)
        .fetch_optional(&self.pool)
        .await
    }
}
