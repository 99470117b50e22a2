// dtos/paymentdtos.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::paymentmodel::*;
use crate::utils::currency::rupees_to_f64;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitPaymentRequestDto {
    pub project_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Stage name is required"))]
    pub stage_name: String,

    #[validate(range(min = 0.01, message = "Requested amount must be positive"))]
    pub requested_amount: f64,

    #[validate(range(
        min = 0.01,
        max = 100.0,
        message = "Completion percentage must be between 0 and 100"
    ))]
    pub completion_percentage: f64,

    #[validate(length(min = 10, message = "Work description is required"))]
    pub work_description: String,

    pub materials_used: Option<String>,
    pub labor_count: Option<i32>,
    pub contractor_notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Approve,
    Reject,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RespondPaymentRequestDto {
    pub action: DecisionAction,

    /// Defaults to the requested amount when omitted on approval.
    pub approved_amount: Option<f64>,

    pub homeowner_notes: Option<String>,

    /// Required when rejecting.
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VerifyGatewayPaymentDto {
    #[validate(length(min = 1, message = "Missing Razorpay order id"))]
    pub razorpay_order_id: String,

    #[validate(length(min = 1, message = "Missing Razorpay payment id"))]
    pub razorpay_payment_id: String,

    #[validate(length(min = 1, message = "Missing Razorpay signature"))]
    pub razorpay_signature: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InitiateAlternativePaymentDto {
    pub payment_type: PaymentTargetKind,
    pub reference_id: Uuid,
    pub payment_method: AltPaymentMethod,

    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,

    pub homeowner_notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum VerificationDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VerifyReceiptDto {
    pub decision: VerificationDecision,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListQueryDto {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub unread_only: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentMethodsQueryDto {
    pub amount: f64,
}

// Response DTOs

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentRequestResponseDto {
    pub id: Uuid,
    pub project_id: Uuid,
    pub contractor_id: Uuid,
    pub homeowner_id: Uuid,
    pub stage_name: String,
    pub requested_amount: f64,
    pub approved_amount: Option<f64>,
    pub completion_percentage: f64,
    pub work_description: String,
    pub materials_used: Option<String>,
    pub labor_count: Option<i32>,
    pub contractor_notes: Option<String>,
    pub homeowner_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub status: PaymentRequestStatus,
    pub settlement_method: Option<SettlementMethod>,
    pub request_date: Option<DateTime<Utc>>,
    pub response_date: Option<DateTime<Utc>>,
    pub payment_date: Option<DateTime<Utc>>,
}

impl From<PaymentRequest> for PaymentRequestResponseDto {
    fn from(request: PaymentRequest) -> Self {
        Self {
            id: request.id,
            project_id: request.project_id,
            contractor_id: request.contractor_id,
            homeowner_id: request.homeowner_id,
            stage_name: request.stage_name,
            requested_amount: rupees_to_f64(&request.requested_amount),
            approved_amount: request.approved_amount.as_ref().map(rupees_to_f64),
            completion_percentage: rupees_to_f64(&request.completion_percentage),
            work_description: request.work_description,
            materials_used: request.materials_used,
            labor_count: request.labor_count,
            contractor_notes: request.contractor_notes,
            homeowner_notes: request.homeowner_notes,
            rejection_reason: request.rejection_reason,
            status: request.status,
            settlement_method: request.settlement_method,
            request_date: request.request_date,
            response_date: request.response_date,
            payment_date: request.payment_date,
        }
    }
}

/// Everything the browser needs to open Razorpay checkout.
#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayOrderResponseDto {
    pub transaction_id: Uuid,
    pub razorpay_order_id: String,
    pub amount: i64, // paise, as the checkout widget expects
    pub currency: String,
    pub key_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponseDto {
    pub id: Uuid,
    pub payment_request_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub status: TransactionStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<PaymentTransaction> for TransactionResponseDto {
    fn from(transaction: PaymentTransaction) -> Self {
        Self {
            id: transaction.id,
            payment_request_id: transaction.payment_request_id,
            amount: rupees_to_f64(&transaction.amount),
            currency: transaction.currency,
            razorpay_order_id: transaction.razorpay_order_id,
            razorpay_payment_id: transaction.razorpay_payment_id,
            status: transaction.status,
            created_at: transaction.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlternativePaymentResponseDto {
    pub id: Uuid,
    pub target: PaymentTarget,
    pub homeowner_id: Uuid,
    pub contractor_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub payment_method: AltPaymentMethod,
    pub payment_status: AltPaymentStatus,
    pub transaction_reference: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub verification_status: VerificationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub receipt_files: Vec<ReceiptFile>,
    pub homeowner_notes: Option<String>,
    pub contractor_notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<AlternativePayment> for AlternativePaymentResponseDto {
    fn from(payment: AlternativePayment) -> Self {
        let receipt_files = payment.receipt_files();
        Self {
            id: payment.id,
            target: payment.target(),
            homeowner_id: payment.homeowner_id,
            contractor_id: payment.contractor_id,
            amount: rupees_to_f64(&payment.amount),
            currency: payment.currency,
            payment_method: payment.payment_method,
            payment_status: payment.payment_status,
            transaction_reference: payment.transaction_reference,
            payment_date: payment.payment_date,
            verification_status: payment.verification_status,
            verified_at: payment.verified_at,
            receipt_files,
            homeowner_notes: payment.homeowner_notes,
            contractor_notes: payment.contractor_notes,
            created_at: payment.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentMethodInfoDto {
    pub method: AltPaymentMethod,
    pub name: String,
    pub max_amount: f64,
    pub processing_time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponseDto {
    pub id: Uuid,
    pub payment_request_id: Option<Uuid>,
    pub alternative_payment_id: Option<Uuid>,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<PaymentNotification> for NotificationResponseDto {
    fn from(notification: PaymentNotification) -> Self {
        Self {
            id: notification.id,
            payment_request_id: notification.payment_request_id,
            alternative_payment_id: notification.alternative_payment_id,
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}
