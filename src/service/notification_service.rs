// service/notification_service.rs
use std::sync::Arc;

use crate::{
    db::{db::DBClient, notificationdb::NotificationExt},
    models::paymentmodel::*,
    service::error::ServiceError,
    utils::currency::format_rupees,
};

/// Fire-and-forget notification rows. A failure here is logged by the caller
/// and never aborts the state transition that produced it.
#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn notify_request_submitted(
        &self,
        request: &PaymentRequest,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            "payment request {} submitted for stage {} ({})",
            request.id,
            request.stage_name,
            format_rupees(&request.requested_amount)
        );

        self.store(
            Some(request.id),
            None,
            request.homeowner_id,
            RecipientType::Homeowner,
            "payment_requested",
            format!("Payment requested for {} stage", request.stage_name),
            format!(
                "Your contractor has requested {} for the {} stage.",
                format_rupees(&request.requested_amount),
                request.stage_name
            ),
        )
        .await
    }

    pub async fn notify_request_decided(
        &self,
        request: &PaymentRequest,
    ) -> Result<(), ServiceError> {
        let (notification_type, title, message) = match request.status {
            PaymentRequestStatus::Approved => (
                "payment_approved",
                format!("Payment approved for {} stage", request.stage_name),
                format!(
                    "The homeowner approved {} for the {} stage.",
                    format_rupees(
                        request
                            .approved_amount
                            .as_ref()
                            .unwrap_or(&request.requested_amount)
                    ),
                    request.stage_name
                ),
            ),
            PaymentRequestStatus::Rejected => (
                "payment_rejected",
                format!("Payment rejected for {} stage", request.stage_name),
                format!(
                    "The homeowner rejected your request for the {} stage. Reason: {}",
                    request.stage_name,
                    request.rejection_reason.as_deref().unwrap_or("not given")
                ),
            ),
            _ => return Ok(()),
        };

        tracing::info!(
            "payment request {} decided: {}",
            request.id,
            request.status.to_str()
        );

        self.store(
            Some(request.id),
            None,
            request.contractor_id,
            RecipientType::Contractor,
            notification_type,
            title,
            message,
        )
        .await
    }

    pub async fn notify_request_settled(
        &self,
        request: &PaymentRequest,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            "payment request {} settled via {}",
            request.id,
            request
                .settlement_method
                .map(|m| m.to_str())
                .unwrap_or("unknown")
        );

        let message = format!(
            "Payment of {} for the {} stage has been completed.",
            format_rupees(
                request
                    .approved_amount
                    .as_ref()
                    .unwrap_or(&request.requested_amount)
            ),
            request.stage_name
        );

        self.store(
            Some(request.id),
            None,
            request.contractor_id,
            RecipientType::Contractor,
            "payment_completed",
            format!("Payment received for {} stage", request.stage_name),
            message.clone(),
        )
        .await?;

        self.store(
            Some(request.id),
            None,
            request.homeowner_id,
            RecipientType::Homeowner,
            "payment_completed",
            format!("Payment completed for {} stage", request.stage_name),
            message,
        )
        .await
    }

    pub async fn notify_receipt_uploaded(
        &self,
        payment: &AlternativePayment,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            "receipt uploaded for alternative payment {} ({} files)",
            payment.id,
            payment.receipt_files().len()
        );

        self.store(
            None,
            Some(payment.id),
            payment.contractor_id,
            RecipientType::Contractor,
            "verification_required",
            "Payment receipt awaiting verification".to_string(),
            format!(
                "The homeowner uploaded a {} receipt for {}. Please verify it.",
                payment.payment_method.to_str(),
                format_rupees(&payment.amount)
            ),
        )
        .await
    }

    pub async fn notify_verification_result(
        &self,
        payment: &AlternativePayment,
    ) -> Result<(), ServiceError> {
        let (notification_type, title, message) = match payment.verification_status {
            VerificationStatus::Approved => (
                "payment_verified",
                "Payment receipt verified".to_string(),
                format!(
                    "Your {} payment of {} has been verified by the contractor.",
                    payment.payment_method.to_str(),
                    format_rupees(&payment.amount)
                ),
            ),
            VerificationStatus::Rejected => (
                "payment_receipt_rejected",
                "Payment receipt needs review".to_string(),
                format!(
                    "Your {} payment receipt was rejected. {}",
                    payment.payment_method.to_str(),
                    payment.contractor_notes.as_deref().unwrap_or("")
                ),
            ),
            VerificationStatus::Pending => return Ok(()),
        };

        tracing::info!(
            "alternative payment {} verification result stored",
            payment.id
        );

        self.store(
            None,
            Some(payment.id),
            payment.homeowner_id,
            RecipientType::Homeowner,
            notification_type,
            title,
            message,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn store(
        &self,
        payment_request_id: Option<uuid::Uuid>,
        alternative_payment_id: Option<uuid::Uuid>,
        recipient_id: uuid::Uuid,
        recipient_type: RecipientType,
        notification_type: &str,
        title: String,
        message: String,
    ) -> Result<(), ServiceError> {
        self.db_client
            .create_notification(
                payment_request_id,
                alternative_payment_id,
                recipient_id,
                recipient_type,
                notification_type.to_string(),
                title,
                message,
            )
            .await
            .map_err(|e| ServiceError::Notification(e.to_string()))?;

        Ok(())
    }
}
