// models/paymentmodel.rs
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "payment_request_status", rename_all = "snake_case")]
pub enum PaymentRequestStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl PaymentRequestStatus {
    pub fn to_str(&self) -> &'static str {
        match self {
            PaymentRequestStatus::Pending => "pending",
            PaymentRequestStatus::Approved => "approved",
            PaymentRequestStatus::Rejected => "rejected",
            PaymentRequestStatus::Paid => "paid",
        }
    }

    /// Monotonic lifecycle: pending -> approved | rejected, approved -> paid.
    pub fn can_transition(&self, to: PaymentRequestStatus) -> bool {
        matches!(
            (self, to),
            (PaymentRequestStatus::Pending, PaymentRequestStatus::Approved)
                | (PaymentRequestStatus::Pending, PaymentRequestStatus::Rejected)
                | (PaymentRequestStatus::Approved, PaymentRequestStatus::Paid)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentRequestStatus::Rejected | PaymentRequestStatus::Paid
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
pub enum TransactionStatus {
    Created,
    Pending,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "alt_payment_method", rename_all = "snake_case")]
pub enum AltPaymentMethod {
    BankTransfer,
    Upi,
    Cash,
    Cheque,
}

impl AltPaymentMethod {
    pub fn to_str(&self) -> &'static str {
        match self {
            AltPaymentMethod::BankTransfer => "bank_transfer",
            AltPaymentMethod::Upi => "upi",
            AltPaymentMethod::Cash => "cash",
            AltPaymentMethod::Cheque => "cheque",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "alt_payment_status", rename_all = "snake_case")]
pub enum AltPaymentStatus {
    Initiated,
    PendingVerification,
    Verified,
    Completed,
    Failed,
    Cancelled,
}

impl AltPaymentStatus {
    pub fn can_transition(&self, to: AltPaymentStatus) -> bool {
        matches!(
            (self, to),
            (AltPaymentStatus::Initiated, AltPaymentStatus::PendingVerification)
                | (AltPaymentStatus::Initiated, AltPaymentStatus::Cancelled)
                | (AltPaymentStatus::PendingVerification, AltPaymentStatus::Completed)
                | (AltPaymentStatus::PendingVerification, AltPaymentStatus::Failed)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Discriminator column for the record an alternative payment settles.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "payment_target_kind", rename_all = "snake_case")]
pub enum PaymentTargetKind {
    StagePayment,
    TechnicalDetails,
}

/// Typed view over the (payment_type, reference_id) column pair.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "payment_type", content = "reference_id", rename_all = "snake_case")]
pub enum PaymentTarget {
    StagePayment(Uuid),
    TechnicalDetails(Uuid),
}

impl PaymentTarget {
    pub fn kind(&self) -> PaymentTargetKind {
        match self {
            PaymentTarget::StagePayment(_) => PaymentTargetKind::StagePayment,
            PaymentTarget::TechnicalDetails(_) => PaymentTargetKind::TechnicalDetails,
        }
    }

    pub fn reference_id(&self) -> Uuid {
        match self {
            PaymentTarget::StagePayment(id) | PaymentTarget::TechnicalDetails(id) => *id,
        }
    }
}

/// How a paid request was settled, recorded on the request row.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "settlement_method", rename_all = "snake_case")]
pub enum SettlementMethod {
    Gateway,
    Manual,
}

impl SettlementMethod {
    pub fn to_str(&self) -> &'static str {
        match self {
            SettlementMethod::Gateway => "gateway",
            SettlementMethod::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentRequest {
    pub id: Uuid,
    pub project_id: Uuid,
    pub contractor_id: Uuid,
    pub homeowner_id: Uuid,
    pub stage_name: String,
    pub requested_amount: BigDecimal,
    pub approved_amount: Option<BigDecimal>,
    pub completion_percentage: BigDecimal,
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
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub payment_request_id: Uuid,
    pub homeowner_id: Uuid,
    pub contractor_id: Uuid,
    pub amount: BigDecimal,
    pub currency: String,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub status: TransactionStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Sidecar metadata for one uploaded proof file, stored as a JSONB list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiptFile {
    pub original_name: String,
    pub stored_name: String,
    pub path: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlternativePayment {
    pub id: Uuid,
    pub payment_type: PaymentTargetKind,
    pub reference_id: Uuid,
    pub homeowner_id: Uuid,
    pub contractor_id: Uuid,
    pub amount: BigDecimal,
    pub currency: String,
    pub payment_method: AltPaymentMethod,
    pub payment_status: AltPaymentStatus,
    pub transaction_reference: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub verification_status: VerificationStatus,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub receipt_files: Option<serde_json::Value>,
    pub homeowner_notes: Option<String>,
    pub contractor_notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AlternativePayment {
    pub fn target(&self) -> PaymentTarget {
        match self.payment_type {
            PaymentTargetKind::StagePayment => PaymentTarget::StagePayment(self.reference_id),
            PaymentTargetKind::TechnicalDetails => {
                PaymentTarget::TechnicalDetails(self.reference_id)
            }
        }
    }

    pub fn receipt_files(&self) -> Vec<ReceiptFile> {
        self.receipt_files
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "recipient_type", rename_all = "snake_case")]
pub enum RecipientType {
    Homeowner,
    Contractor,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentNotification {
    pub id: Uuid,
    pub payment_request_id: Option<Uuid>,
    pub alternative_payment_id: Option<Uuid>,
    pub recipient_id: Uuid,
    pub recipient_type: RecipientType,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_lifecycle_edges() {
        use PaymentRequestStatus::*;

        assert!(Pending.can_transition(Approved));
        assert!(Pending.can_transition(Rejected));
        assert!(Approved.can_transition(Paid));

        assert!(!Pending.can_transition(Paid));
        assert!(!Approved.can_transition(Rejected));
        assert!(!Rejected.can_transition(Approved));
        assert!(!Rejected.can_transition(Paid));
        assert!(!Paid.can_transition(Approved));
        assert!(!Paid.can_transition(Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(PaymentRequestStatus::Rejected.is_terminal());
        assert!(PaymentRequestStatus::Paid.is_terminal());
        assert!(!PaymentRequestStatus::Pending.is_terminal());
        assert!(!PaymentRequestStatus::Approved.is_terminal());
    }

    #[test]
    fn test_alt_payment_lifecycle_edges() {
        use AltPaymentStatus::*;

        assert!(Initiated.can_transition(PendingVerification));
        assert!(Initiated.can_transition(Cancelled));
        assert!(PendingVerification.can_transition(Completed));
        assert!(PendingVerification.can_transition(Failed));

        assert!(!Initiated.can_transition(Completed));
        assert!(!Completed.can_transition(Failed));
        assert!(!Failed.can_transition(PendingVerification));
    }

    #[test]
    fn test_status_labels_outlive_their_values() {
        // labels come out of by-value copies, e.g. Option::map
        let label = Some(SettlementMethod::Gateway).map(|m| m.to_str());
        assert_eq!(label, Some("gateway"));

        let label = Some(AltPaymentMethod::BankTransfer).map(|m| m.to_str());
        assert_eq!(label, Some("bank_transfer"));

        let label = Some(PaymentRequestStatus::Paid).map(|s| s.to_str());
        assert_eq!(label, Some("paid"));
    }

    #[test]
    fn test_payment_target_round_trip() {
        let id = Uuid::new_v4();
        let target = PaymentTarget::StagePayment(id);
        assert_eq!(target.kind(), PaymentTargetKind::StagePayment);
        assert_eq!(target.reference_id(), id);
    }
}
