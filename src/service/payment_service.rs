// service/payment_service.rs
use std::sync::Arc;

use bigdecimal::BigDecimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    config::Config,
    db::{db::DBClient, paymentdb, paymentdb::StagePaymentExt, userdb::UserExt},
    dtos::paymentdtos::{
        DecisionAction, GatewayOrderResponseDto, RespondPaymentRequestDto, SubmitPaymentRequestDto,
    },
    models::paymentmodel::*,
    service::{error::ServiceError, notification_service::NotificationService, razorpay::RazorpayClient},
    utils::{
        currency::{format_rupees, paise_to_rupees, rupees_from_f64, rupees_to_paise},
        reference::generate_transaction_reference,
    },
};

/// Anything that can drive a stage payment request from `approved` to `paid`.
/// Both settlement paths converge here instead of each owning its own copy of
/// the transition.
pub trait SettlementSource: Send + Sync {
    fn method(&self) -> SettlementMethod;
    fn is_approved(&self) -> bool;
    /// The stage payment request this source settles, if it settles one.
    fn stage_request_id(&self) -> Option<Uuid>;
}

impl SettlementSource for PaymentTransaction {
    fn method(&self) -> SettlementMethod {
        SettlementMethod::Gateway
    }

    fn is_approved(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    fn stage_request_id(&self) -> Option<Uuid> {
        Some(self.payment_request_id)
    }
}

impl SettlementSource for AlternativePayment {
    fn method(&self) -> SettlementMethod {
        SettlementMethod::Manual
    }

    fn is_approved(&self) -> bool {
        self.verification_status == VerificationStatus::Approved
    }

    fn stage_request_id(&self) -> Option<Uuid> {
        match self.target() {
            PaymentTarget::StagePayment(id) => Some(id),
            PaymentTarget::TechnicalDetails(_) => None,
        }
    }
}

/// Resolve the amount the homeowner approves: defaults to the requested
/// amount, and may never exceed it.
pub fn resolve_approved_amount(
    requested: &BigDecimal,
    approved: Option<BigDecimal>,
) -> Result<BigDecimal, ServiceError> {
    match approved {
        None => Ok(requested.clone()),
        Some(amount) if amount <= BigDecimal::from(0) => Err(ServiceError::InvalidAmount(
            "Approved amount must be positive".to_string(),
        )),
        Some(amount) if &amount > requested => Err(ServiceError::InvalidAmount(
            "Approved amount cannot exceed the requested amount".to_string(),
        )),
        Some(amount) => Ok(amount),
    }
}

/// Zero rows from the paid-guard: fine if a previous settlement already won
/// the race, an error in every other state.
fn already_settled(existing: Option<PaymentRequest>) -> Result<PaymentRequest, ServiceError> {
    match existing {
        Some(request) if request.status == PaymentRequestStatus::Paid => Ok(request),
        _ => Err(ServiceError::RequestNotFoundOrProcessed),
    }
}

#[derive(Debug, Clone)]
pub struct PaymentLifecycleService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    gateway: RazorpayClient,
    currency: String,
    min_payment_amount: i64,
    max_payment_amount: i64,
}

impl PaymentLifecycleService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
        config: &Config,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            gateway: RazorpayClient::new(config),
            currency: config.currency.clone(),
            min_payment_amount: config.min_payment_amount,
            max_payment_amount: config.max_payment_amount,
        }
    }

    /// Contractor submits a request for partial payment against a stage.
    pub async fn submit(
        &self,
        contractor_id: Uuid,
        dto: SubmitPaymentRequestDto,
    ) -> Result<PaymentRequest, ServiceError> {
        let homeowner_id = self
            .db_client
            .get_project_homeowner(dto.project_id)
            .await?
            .ok_or_else(|| ServiceError::Validation("Project not found".to_string()))?;

        let assigned = self
            .db_client
            .is_project_contractor(dto.project_id, contractor_id)
            .await?;
        if !assigned {
            return Err(ServiceError::Unauthorized(contractor_id, dto.project_id));
        }

        let requested_amount = rupees_from_f64(dto.requested_amount);
        if requested_amount <= BigDecimal::from(0) {
            return Err(ServiceError::InvalidAmount(
                "Requested amount must be positive".to_string(),
            ));
        }

        let request = self
            .db_client
            .create_payment_request(
                dto.project_id,
                contractor_id,
                homeowner_id,
                dto.stage_name,
                requested_amount,
                rupees_from_f64(dto.completion_percentage),
                dto.work_description,
                dto.materials_used,
                dto.labor_count,
                dto.contractor_notes,
            )
            .await?;

        if let Err(e) = self.notification_service.notify_request_submitted(&request).await {
            tracing::warn!("failed to notify homeowner of request {}: {}", request.id, e);
        }

        Ok(request)
    }

    /// Homeowner approves or rejects a pending request. The guard lives in the
    /// UPDATE itself, so of two concurrent decisions exactly one matches the
    /// pending row and the other collapses to not-found-or-processed.
    pub async fn decide(
        &self,
        homeowner_id: Uuid,
        request_id: Uuid,
        dto: RespondPaymentRequestDto,
    ) -> Result<PaymentRequest, ServiceError> {
        let request = self
            .db_client
            .get_payment_request(request_id)
            .await?
            .filter(|r| r.homeowner_id == homeowner_id)
            .ok_or(ServiceError::RequestNotFoundOrProcessed)?;

        let updated = match dto.action {
            DecisionAction::Approve => {
                let approved_amount = resolve_approved_amount(
                    &request.requested_amount,
                    dto.approved_amount.map(rupees_from_f64),
                )?;

                self.db_client
                    .approve_payment_request(
                        request_id,
                        homeowner_id,
                        approved_amount,
                        dto.homeowner_notes,
                    )
                    .await?
            }
            DecisionAction::Reject => {
                let reason = dto
                    .rejection_reason
                    .filter(|r| !r.trim().is_empty())
                    .ok_or_else(|| {
                        ServiceError::Validation("Rejection reason is required".to_string())
                    })?;

                self.db_client
                    .reject_payment_request(request_id, homeowner_id, reason, dto.homeowner_notes)
                    .await?
            }
        };

        let request = updated.ok_or(ServiceError::RequestNotFoundOrProcessed)?;

        if let Err(e) = self.notification_service.notify_request_decided(&request).await {
            tracing::warn!("failed to notify contractor of decision on {}: {}", request.id, e);
        }

        Ok(request)
    }

    /// Shared `approved -> paid` transition for both settlement paths,
    /// executed on the caller's database transaction. Idempotent: a request
    /// that is already `paid` is returned untouched.
    pub(crate) async fn settle_in(
        &self,
        conn: &mut PgConnection,
        source: &dyn SettlementSource,
    ) -> Result<PaymentRequest, ServiceError> {
        let request_id = source
            .stage_request_id()
            .ok_or(ServiceError::RequestNotFoundOrProcessed)?;

        if !source.is_approved() {
            return Err(ServiceError::SettlementNotApproved(request_id));
        }

        match paymentdb::mark_request_paid(conn, request_id, source.method()).await? {
            Some(request) => Ok(request),
            None => already_settled(paymentdb::get_request(conn, request_id).await?),
        }
    }

    /// Opens a Razorpay order for an approved request. The stored amount is in
    /// rupees; the gateway takes paise.
    pub async fn create_gateway_order(
        &self,
        homeowner_id: Uuid,
        request_id: Uuid,
    ) -> Result<GatewayOrderResponseDto, ServiceError> {
        let request = self
            .db_client
            .get_payment_request(request_id)
            .await?
            .filter(|r| r.homeowner_id == homeowner_id)
            .ok_or(ServiceError::RequestNotFoundOrProcessed)?;

        if request.status != PaymentRequestStatus::Approved {
            return Err(ServiceError::RequestNotFoundOrProcessed);
        }

        let amount = request
            .approved_amount
            .clone()
            .unwrap_or_else(|| request.requested_amount.clone());

        if amount < BigDecimal::from(self.min_payment_amount)
            || amount > BigDecimal::from(self.max_payment_amount)
        {
            return Err(ServiceError::InvalidAmount(format!(
                "Gateway payments must be between ₹{} and ₹{}",
                self.min_payment_amount, self.max_payment_amount
            )));
        }

        let amount_paise = rupees_to_paise(&amount);
        let reference = generate_transaction_reference();

        let order = self
            .gateway
            .create_order(amount_paise, &self.currency, &reference)
            .await?;

        if order.amount != amount_paise {
            tracing::warn!(
                "gateway order {} amount differs: requested {}, got {}",
                order.order_id,
                format_rupees(&amount),
                format_rupees(&paise_to_rupees(order.amount))
            );
        }

        let transaction = self
            .db_client
            .create_payment_transaction(
                request.id,
                request.homeowner_id,
                request.contractor_id,
                amount,
                self.currency.clone(),
                order.order_id.clone(),
            )
            .await?;

        tracing::info!(
            "gateway order {} opened for request {} ({} paise)",
            order.order_id,
            request.id,
            amount_paise
        );

        Ok(GatewayOrderResponseDto {
            transaction_id: transaction.id,
            razorpay_order_id: order.order_id,
            amount: amount_paise,
            currency: order.currency,
            key_id: self.gateway.key_id().to_string(),
        })
    }

    /// Validates the checkout callback signature and, on success, completes
    /// the attempt and settles the request in one database transaction. A bad
    /// signature marks the attempt `failed` and leaves the request `approved`
    /// for a retry with a fresh attempt row.
    pub async fn verify_gateway_callback(
        &self,
        homeowner_id: Uuid,
        request_id: Uuid,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<PaymentRequest, ServiceError> {
        let transaction = self
            .db_client
            .get_open_transaction(request_id, homeowner_id, order_id)
            .await?
            .ok_or(ServiceError::PaymentNotFoundOrProcessed)?;

        if !self.gateway.verify_signature(order_id, payment_id, signature) {
            self.db_client
                .fail_payment_transaction(
                    transaction.id,
                    payment_id.to_string(),
                    signature.to_string(),
                )
                .await?;

            tracing::warn!(
                "signature mismatch on gateway callback for transaction {}",
                transaction.id
            );
            return Err(ServiceError::SignatureMismatch);
        }

        let mut tx = self.db_client.pool.begin().await?;

        let transaction = paymentdb::complete_transaction(
            &mut *tx,
            transaction.id,
            payment_id.to_string(),
            signature.to_string(),
        )
        .await?
        .ok_or(ServiceError::PaymentNotFoundOrProcessed)?;

        let request = self.settle_in(&mut *tx, &transaction).await?;

        tx.commit().await?;

        if let Err(e) = self.notification_service.notify_request_settled(&request).await {
            tracing::warn!("failed to notify settlement of request {}: {}", request.id, e);
        }

        Ok(request)
    }

    pub async fn get_request_for_user(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<PaymentRequest, ServiceError> {
        self.db_client
            .get_payment_request(request_id)
            .await?
            .filter(|r| r.homeowner_id == user_id || r.contractor_id == user_id)
            .ok_or(ServiceError::RequestNotFoundOrProcessed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn bd(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_approved_amount_defaults_to_requested() {
        let resolved = resolve_approved_amount(&bd("150000.00"), None).unwrap();
        assert_eq!(resolved, bd("150000.00"));
    }

    #[test]
    fn test_approved_amount_can_be_reduced() {
        let resolved = resolve_approved_amount(&bd("150000.00"), Some(bd("120000.00"))).unwrap();
        assert_eq!(resolved, bd("120000.00"));
    }

    #[test]
    fn test_approved_amount_cannot_exceed_requested() {
        let result = resolve_approved_amount(&bd("60000.00"), Some(bd("60000.01")));
        assert!(matches!(result, Err(ServiceError::InvalidAmount(_))));
    }

    #[test]
    fn test_approved_amount_must_be_positive() {
        let result = resolve_approved_amount(&bd("60000.00"), Some(bd("0")));
        assert!(matches!(result, Err(ServiceError::InvalidAmount(_))));
    }

    #[test]
    fn test_settlement_sources_cross_task_boundaries() {
        fn assert_send_sync<T: ?Sized + Send + Sync>() {}
        assert_send_sync::<dyn SettlementSource>();
    }

    fn request_in(status: PaymentRequestStatus) -> PaymentRequest {
        PaymentRequest {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            contractor_id: Uuid::new_v4(),
            homeowner_id: Uuid::new_v4(),
            stage_name: "Foundation".to_string(),
            requested_amount: bd("150000.00"),
            approved_amount: Some(bd("150000.00")),
            completion_percentage: bd("25.00"),
            work_description: "Excavation and footing complete".to_string(),
            materials_used: None,
            labor_count: None,
            contractor_notes: None,
            homeowner_notes: None,
            rejection_reason: None,
            status,
            settlement_method: None,
            request_date: None,
            response_date: None,
            payment_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_second_settle_of_paid_request_is_a_no_op() {
        // the paid-guard matched zero rows because an earlier settlement won
        let paid = request_in(PaymentRequestStatus::Paid);
        let id = paid.id;

        let resolved = already_settled(Some(paid)).unwrap();
        assert_eq!(resolved.id, id);
        assert_eq!(resolved.status, PaymentRequestStatus::Paid);
    }

    #[test]
    fn test_unmatched_guard_on_live_request_is_an_error() {
        for status in [
            PaymentRequestStatus::Pending,
            PaymentRequestStatus::Approved,
            PaymentRequestStatus::Rejected,
        ] {
            let result = already_settled(Some(request_in(status)));
            assert!(matches!(
                result,
                Err(ServiceError::RequestNotFoundOrProcessed)
            ));
        }
    }

    #[test]
    fn test_unmatched_guard_on_missing_request_is_an_error() {
        assert!(matches!(
            already_settled(None),
            Err(ServiceError::RequestNotFoundOrProcessed)
        ));
    }

    #[test]
    fn test_completed_transaction_is_approved_source() {
        let transaction = PaymentTransaction {
            id: Uuid::new_v4(),
            payment_request_id: Uuid::new_v4(),
            homeowner_id: Uuid::new_v4(),
            contractor_id: Uuid::new_v4(),
            amount: bd("150000.00"),
            currency: "INR".to_string(),
            razorpay_order_id: Some("order_123".to_string()),
            razorpay_payment_id: Some("pay_456".to_string()),
            razorpay_signature: None,
            status: TransactionStatus::Completed,
            created_at: None,
            updated_at: None,
        };

        assert!(transaction.is_approved());
        assert_eq!(transaction.method(), SettlementMethod::Gateway);
        assert_eq!(
            transaction.stage_request_id(),
            Some(transaction.payment_request_id)
        );
    }

    #[test]
    fn test_pending_transaction_is_not_approved_source() {
        let transaction = PaymentTransaction {
            id: Uuid::new_v4(),
            payment_request_id: Uuid::new_v4(),
            homeowner_id: Uuid::new_v4(),
            contractor_id: Uuid::new_v4(),
            amount: bd("1000.00"),
            currency: "INR".to_string(),
            razorpay_order_id: Some("order_123".to_string()),
            razorpay_payment_id: None,
            razorpay_signature: None,
            status: TransactionStatus::Pending,
            created_at: None,
            updated_at: None,
        };

        assert!(!transaction.is_approved());
    }

    fn alternative_payment(
        kind: PaymentTargetKind,
        verification_status: VerificationStatus,
    ) -> AlternativePayment {
        AlternativePayment {
            id: Uuid::new_v4(),
            payment_type: kind,
            reference_id: Uuid::new_v4(),
            homeowner_id: Uuid::new_v4(),
            contractor_id: Uuid::new_v4(),
            amount: bd("60000.00"),
            currency: "INR".to_string(),
            payment_method: AltPaymentMethod::BankTransfer,
            payment_status: AltPaymentStatus::PendingVerification,
            transaction_reference: None,
            payment_date: None,
            verification_status,
            verified_by: None,
            verified_at: None,
            receipt_files: None,
            homeowner_notes: None,
            contractor_notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_approved_manual_payment_is_settlement_source() {
        let payment = alternative_payment(
            PaymentTargetKind::StagePayment,
            VerificationStatus::Approved,
        );

        assert!(payment.is_approved());
        assert_eq!(payment.method(), SettlementMethod::Manual);
        assert_eq!(payment.stage_request_id(), Some(payment.reference_id));
    }

    #[test]
    fn test_technical_details_payment_settles_no_request() {
        let payment = alternative_payment(
            PaymentTargetKind::TechnicalDetails,
            VerificationStatus::Approved,
        );

        assert_eq!(payment.stage_request_id(), None);
    }

    #[test]
    fn test_rejected_manual_payment_is_not_approved_source() {
        let payment = alternative_payment(
            PaymentTargetKind::StagePayment,
            VerificationStatus::Rejected,
        );

        assert!(!payment.is_approved());
    }
}
