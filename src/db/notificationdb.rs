// db/notificationdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::paymentmodel::{PaymentNotification, RecipientType};

#[async_trait]
pub trait NotificationExt {
    #[allow(clippy::too_many_arguments)]
    async fn create_notification(
        &self,
        payment_request_id: Option<Uuid>,
        alternative_payment_id: Option<Uuid>,
        recipient_id: Uuid,
        recipient_type: RecipientType,
        notification_type: String,
        title: String,
        message: String,
    ) -> Result<PaymentNotification, sqlx::Error>;

    async fn get_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentNotification>, sqlx::Error>;

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<PaymentNotification>, sqlx::Error>;
}

#[async_trait]
impl NotificationExt for DBClient {
    async fn create_notification(
        &self,
        payment_request_id: Option<Uuid>,
        alternative_payment_id: Option<Uuid>,
        recipient_id: Uuid,
        recipient_type: RecipientType,
        notification_type: String,
        title: String,
        message: String,
    ) -> Result<PaymentNotification, sqlx::Error> {
        sqlx::query_as::<_, PaymentNotification>(
            r#"
            INSERT INTO payment_notifications
                (payment_request_id, alternative_payment_id, recipient_id,
                 recipient_type, notification_type, title, message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id, payment_request_id, alternative_payment_id,
                recipient_id, recipient_type, notification_type,
                title, message, is_read, created_at
            "#,
        )
        .bind(payment_request_id)
        .bind(alternative_payment_id)
        .bind(recipient_id)
        .bind(recipient_type)
        .bind(notification_type)
        .bind(title)
        .bind(message)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_notifications(
        &self,
        recipient_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentNotification>, sqlx::Error> {
        sqlx::query_as::<_, PaymentNotification>(
            r#"
            SELECT
                id, payment_request_id, alternative_payment_id,
                recipient_id, recipient_type, notification_type,
                title, message, is_read, created_at
            FROM payment_notifications
            WHERE recipient_id = $1 AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<PaymentNotification>, sqlx::Error> {
        sqlx::query_as::<_, PaymentNotification>(
            r#"
            UPDATE payment_notifications
            SET is_read = TRUE
            WHERE id = $1 AND recipient_id = $2
            RETURNING
                id, payment_request_id, alternative_payment_id,
                recipient_id, recipient_type, notification_type,
                title, message, is_read, created_at
            "#,
        )
        .bind(notification_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
    }
}
