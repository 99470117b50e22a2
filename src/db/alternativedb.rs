// db/alternativedb.rs
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::paymentmodel::*;

#[async_trait]
pub trait AlternativePaymentExt {
    #[allow(clippy::too_many_arguments)]
    async fn create_alternative_payment(
        &self,
        target: PaymentTarget,
        homeowner_id: Uuid,
        contractor_id: Uuid,
        amount: BigDecimal,
        currency: String,
        payment_method: AltPaymentMethod,
        homeowner_notes: Option<String>,
    ) -> Result<AlternativePayment, sqlx::Error>;

    async fn get_alternative_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<AlternativePayment>, sqlx::Error>;

    async fn get_homeowner_alternative_payments(
        &self,
        homeowner_id: Uuid,
    ) -> Result<Vec<AlternativePayment>, sqlx::Error>;

    /// Guarded `initiated -> pending_verification`; stores the receipt file
    /// metadata list in-row.
    async fn attach_receipt(
        &self,
        payment_id: Uuid,
        homeowner_id: Uuid,
        receipt_files: JsonValue,
        transaction_reference: String,
        payment_date: NaiveDate,
        homeowner_notes: Option<String>,
    ) -> Result<Option<AlternativePayment>, sqlx::Error>;

    async fn get_pending_verifications(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<AlternativePayment>, sqlx::Error>;

    /// Guarded rejection; the parent request stays `approved` and a new
    /// settlement attempt can be made.
    async fn reject_verification(
        &self,
        payment_id: Uuid,
        contractor_id: Uuid,
        contractor_notes: Option<String>,
    ) -> Result<Option<AlternativePayment>, sqlx::Error>;

}

/// Guarded verification approval, transaction-scoped so the caller can settle
/// the parent stage payment request atomically with it.
pub(crate) async fn approve_payment(
    conn: &mut sqlx::PgConnection,
    payment_id: Uuid,
    contractor_id: Uuid,
    contractor_notes: Option<String>,
) -> Result<Option<AlternativePayment>, sqlx::Error> {
    sqlx::query_as::<_, AlternativePayment>(&format!(
        r#"
        UPDATE alternative_payments
        SET verification_status = 'approved',
            payment_status = 'completed',
            verified_by = $2,
            verified_at = NOW(),
            contractor_notes = $3,
            updated_at = NOW()
        WHERE id = $1
          AND contractor_id = $2
          AND verification_status = 'pending'
          AND payment_status = 'pending_verification'
        RETURNING {ALTERNATIVE_PAYMENT_COLUMNS}
        "#
    ))
    .bind(payment_id)
    .bind(contractor_id)
    .bind(contractor_notes)
    .fetch_optional(conn)
    .await
}

const ALTERNATIVE_PAYMENT_COLUMNS: &str = r#"
    id, payment_type, reference_id, homeowner_id, contractor_id,
    amount, currency, payment_method, payment_status,
    transaction_reference, payment_date,
    verification_status, verified_by, verified_at,
    receipt_files, homeowner_notes, contractor_notes,
    created_at, updated_at
"#;

#[async_trait]
impl AlternativePaymentExt for DBClient {
    async fn create_alternative_payment(
        &self,
        target: PaymentTarget,
        homeowner_id: Uuid,
        contractor_id: Uuid,
        amount: BigDecimal,
        currency: String,
        payment_method: AltPaymentMethod,
        homeowner_notes: Option<String>,
    ) -> Result<AlternativePayment, sqlx::Error> {
        sqlx::query_as::<_, AlternativePayment>(&format!(
            r#"
            INSERT INTO alternative_payments
                (payment_type, reference_id, homeowner_id, contractor_id,
                 amount, currency, payment_method, payment_status,
                 verification_status, homeowner_notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'initiated', 'pending', $8)
            RETURNING {ALTERNATIVE_PAYMENT_COLUMNS}
            "#
        ))
        .bind(target.kind())
        .bind(target.reference_id())
        .bind(homeowner_id)
        .bind(contractor_id)
        .bind(amount)
        .bind(currency)
        .bind(payment_method)
        .bind(homeowner_notes)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_alternative_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<AlternativePayment>, sqlx::Error> {
        sqlx::query_as::<_, AlternativePayment>(&format!(
            r#"
            SELECT {ALTERNATIVE_PAYMENT_COLUMNS}
            FROM alternative_payments
            WHERE id = $1
            "#
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_homeowner_alternative_payments(
        &self,
        homeowner_id: Uuid,
    ) -> Result<Vec<AlternativePayment>, sqlx::Error> {
        sqlx::query_as::<_, AlternativePayment>(&format!(
            r#"
            SELECT {ALTERNATIVE_PAYMENT_COLUMNS}
            FROM alternative_payments
            WHERE homeowner_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(homeowner_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn attach_receipt(
        &self,
        payment_id: Uuid,
        homeowner_id: Uuid,
        receipt_files: JsonValue,
        transaction_reference: String,
        payment_date: NaiveDate,
        homeowner_notes: Option<String>,
    ) -> Result<Option<AlternativePayment>, sqlx::Error> {
        sqlx::query_as::<_, AlternativePayment>(&format!(
            r#"
            UPDATE alternative_payments
            SET payment_status = 'pending_verification',
                receipt_files = $3,
                transaction_reference = $4,
                payment_date = $5,
                homeowner_notes = COALESCE($6, homeowner_notes),
                updated_at = NOW()
            WHERE id = $1 AND homeowner_id = $2 AND payment_status = 'initiated'
            RETURNING {ALTERNATIVE_PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(homeowner_id)
        .bind(receipt_files)
        .bind(transaction_reference)
        .bind(payment_date)
        .bind(homeowner_notes)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_pending_verifications(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<AlternativePayment>, sqlx::Error> {
        sqlx::query_as::<_, AlternativePayment>(&format!(
            r#"
            SELECT {ALTERNATIVE_PAYMENT_COLUMNS}
            FROM alternative_payments
            WHERE contractor_id = $1
              AND verification_status = 'pending'
              AND payment_status = 'pending_verification'
            ORDER BY created_at ASC
            "#
        ))
        .bind(contractor_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn reject_verification(
        &self,
        payment_id: Uuid,
        contractor_id: Uuid,
        contractor_notes: Option<String>,
    ) -> Result<Option<AlternativePayment>, sqlx::Error> {
        sqlx::query_as::<_, AlternativePayment>(&format!(
            r#"
            UPDATE alternative_payments
            SET verification_status = 'rejected',
                payment_status = 'failed',
                verified_by = $2,
                verified_at = NOW(),
                contractor_notes = $3,
                updated_at = NOW()
            WHERE id = $1
              AND contractor_id = $2
              AND verification_status = 'pending'
              AND payment_status = 'pending_verification'
            RETURNING {ALTERNATIVE_PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment_id)
        .bind(contractor_id)
        .bind(contractor_notes)
        .fetch_optional(&self.pool)
        .await
    }
}
