// service/receipt_service.rs
use std::{path::Path, sync::Arc};

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    config::Config,
    db::{
        alternativedb,
        alternativedb::AlternativePaymentExt,
        db::DBClient,
        paymentdb::StagePaymentExt,
        userdb::UserExt,
    },
    dtos::paymentdtos::{
        AlternativePaymentResponseDto, InitiateAlternativePaymentDto, PaymentMethodInfoDto,
        VerificationDecision, VerifyReceiptDto,
    },
    models::paymentmodel::*,
    service::{
        error::ServiceError,
        notification_service::NotificationService,
        payment_service::{PaymentLifecycleService, SettlementSource},
    },
    utils::{
        currency::{format_rupees, rupees_from_f64},
        reference::generate_stored_name,
    },
};

const MAX_RECEIPT_SIZE: u64 = 10 * 1024 * 1024;

/// Request-body ceiling for the receipt upload route: the largest admissible
/// file plus headroom for additional parts and multipart framing.
pub(crate) const RECEIPT_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// One multipart file as extracted by the handler, held in memory until
/// validation passes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Per-method ceiling in rupees.
pub fn method_limit(method: AltPaymentMethod) -> BigDecimal {
    let rupees: i64 = match method {
        AltPaymentMethod::BankTransfer => 10_000_000,
        AltPaymentMethod::Upi => 1_000_000,
        AltPaymentMethod::Cash => 200_000,
        AltPaymentMethod::Cheque => 50_000_000,
    };
    BigDecimal::from(rupees)
}

fn method_display_name(method: AltPaymentMethod) -> &'static str {
    match method {
        AltPaymentMethod::BankTransfer => "Bank Transfer (NEFT/RTGS/IMPS)",
        AltPaymentMethod::Upi => "UPI",
        AltPaymentMethod::Cash => "Cash",
        AltPaymentMethod::Cheque => "Cheque",
    }
}

fn method_processing_time(method: AltPaymentMethod) -> &'static str {
    match method {
        AltPaymentMethod::BankTransfer => "1-2 business days",
        AltPaymentMethod::Upi => "Instant",
        AltPaymentMethod::Cash => "Immediate on handover",
        AltPaymentMethod::Cheque => "3-5 business days after clearing",
    }
}

fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

/// Checks the whole batch before anything touches disk, so a rejected upload
/// leaves the payment row `initiated`.
pub fn validate_receipt_files(files: &[UploadedFile]) -> Result<(), ServiceError> {
    if files.is_empty() {
        return Err(ServiceError::Validation(
            "At least one receipt file is required".to_string(),
        ));
    }

    for file in files {
        if extension_for_mime(&file.mime_type).is_none() {
            return Err(ServiceError::Validation(format!(
                "Unsupported receipt file type: {}",
                file.mime_type
            )));
        }
        if file.data.is_empty() {
            return Err(ServiceError::Validation(format!(
                "Receipt file {} is empty",
                file.original_name
            )));
        }
        if file.data.len() as u64 > MAX_RECEIPT_SIZE {
            return Err(ServiceError::Validation(format!(
                "Receipt file {} exceeds the 10 MB limit",
                file.original_name
            )));
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct ReceiptService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    payment_service: Arc<PaymentLifecycleService>,
    currency: String,
    upload_dir: String,
}

impl ReceiptService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
        payment_service: Arc<PaymentLifecycleService>,
        config: &Config,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            payment_service,
            currency: config.currency.clone(),
            upload_dir: config.upload_dir.clone(),
        }
    }

    /// Homeowner opens a manual payment against an approved stage request (or
    /// a technical-details unlock). The row starts `initiated` with
    /// verification `pending`.
    pub async fn initiate(
        &self,
        homeowner_id: Uuid,
        dto: InitiateAlternativePaymentDto,
    ) -> Result<AlternativePayment, ServiceError> {
        let amount = rupees_from_f64(dto.amount);
        if amount <= BigDecimal::from(0) {
            return Err(ServiceError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }

        let limit = method_limit(dto.payment_method);
        if amount > limit {
            return Err(ServiceError::InvalidAmount(format!(
                "{} payments are limited to {}",
                method_display_name(dto.payment_method),
                format_rupees(&limit)
            )));
        }

        let (target, contractor_id) = match dto.payment_type {
            PaymentTargetKind::StagePayment => {
                let request = self
                    .db_client
                    .get_payment_request(dto.reference_id)
                    .await?
                    .filter(|r| {
                        r.homeowner_id == homeowner_id
                            && r.status == PaymentRequestStatus::Approved
                    })
                    .ok_or(ServiceError::RequestNotFoundOrProcessed)?;

                (
                    PaymentTarget::StagePayment(request.id),
                    request.contractor_id,
                )
            }
            PaymentTargetKind::TechnicalDetails => {
                let contractor_id = self
                    .db_client
                    .get_technical_details_contractor(dto.reference_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Validation("Technical details record not found".to_string())
                    })?;

                (PaymentTarget::TechnicalDetails(dto.reference_id), contractor_id)
            }
        };

        let payment = self
            .db_client
            .create_alternative_payment(
                target,
                homeowner_id,
                contractor_id,
                amount,
                self.currency.clone(),
                dto.payment_method,
                dto.homeowner_notes,
            )
            .await?;

        tracing::info!(
            "alternative payment {} initiated via {}",
            payment.id,
            payment.payment_method.to_str()
        );

        Ok(payment)
    }

    /// Homeowner attaches proof of payment. Valid only while `initiated`;
    /// moves the row to `pending_verification` and notifies the contractor.
    pub async fn upload_receipt(
        &self,
        homeowner_id: Uuid,
        payment_id: Uuid,
        files: Vec<UploadedFile>,
        transaction_reference: String,
        payment_date: NaiveDate,
        homeowner_notes: Option<String>,
    ) -> Result<AlternativePayment, ServiceError> {
        let payment = self
            .db_client
            .get_alternative_payment(payment_id)
            .await?
            .filter(|p| p.homeowner_id == homeowner_id)
            .ok_or(ServiceError::PaymentNotFoundOrProcessed)?;

        if payment.payment_status != AltPaymentStatus::Initiated {
            return Err(ServiceError::PaymentNotFoundOrProcessed);
        }

        if transaction_reference.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Transaction reference is required".to_string(),
            ));
        }

        validate_receipt_files(&files)?;

        let receipt_files = self.store_files(payment_id, &files).await?;
        let metadata = serde_json::to_value(&receipt_files)?;

        let attached = self
            .db_client
            .attach_receipt(
                payment_id,
                homeowner_id,
                metadata,
                transaction_reference,
                payment_date,
                homeowner_notes,
            )
            .await;

        // the guard lost a race (concurrent upload/cancel): the files on disk
        // belong to no row, drop them
        let payment = match attached {
            Ok(Some(payment)) => payment,
            Ok(None) => {
                remove_stored_files(&receipt_files).await;
                return Err(ServiceError::PaymentNotFoundOrProcessed);
            }
            Err(e) => {
                remove_stored_files(&receipt_files).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.notification_service.notify_receipt_uploaded(&payment).await {
            tracing::warn!("failed to notify receipt upload for {}: {}", payment.id, e);
        }

        Ok(payment)
    }

    async fn store_files(
        &self,
        payment_id: Uuid,
        files: &[UploadedFile],
    ) -> Result<Vec<ReceiptFile>, ServiceError> {
        let dir = Path::new(&self.upload_dir).join(payment_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            // validate_receipt_files already checked the mime type
            let ext = extension_for_mime(&file.mime_type).unwrap_or("bin");
            let stored_name = generate_stored_name(ext);
            let path = dir.join(&stored_name);

            tokio::fs::write(&path, &file.data).await?;

            stored.push(ReceiptFile {
                original_name: file.original_name.clone(),
                stored_name,
                path: path.to_string_lossy().into_owned(),
                size: file.data.len() as u64,
                mime_type: file.mime_type.clone(),
            });
        }

        Ok(stored)
    }

    /// Contractor verifies the uploaded proof. Approval completes the payment
    /// and settles the parent stage request in the same database transaction;
    /// rejection marks the attempt `failed` and leaves the parent `approved`
    /// for a fresh attempt.
    pub async fn verify(
        &self,
        contractor_id: Uuid,
        payment_id: Uuid,
        dto: VerifyReceiptDto,
    ) -> Result<AlternativePayment, ServiceError> {
        let payment = match dto.decision {
            VerificationDecision::Approved => {
                let mut tx = self.db_client.pool.begin().await?;

                let payment =
                    alternativedb::approve_payment(&mut *tx, payment_id, contractor_id, dto.notes)
                        .await?
                        .ok_or(ServiceError::PaymentNotFoundOrProcessed)?;

                if payment.stage_request_id().is_some() {
                    self.payment_service.settle_in(&mut *tx, &payment).await?;
                }

                tx.commit().await?;
                payment
            }
            VerificationDecision::Rejected => self
                .db_client
                .reject_verification(payment_id, contractor_id, dto.notes)
                .await?
                .ok_or(ServiceError::PaymentNotFoundOrProcessed)?,
        };

        tracing::info!(
            "alternative payment {} verification: {:?}",
            payment.id,
            dto.decision
        );

        if let Err(e) = self.notification_service.notify_verification_result(&payment).await {
            tracing::warn!(
                "failed to notify verification result for {}: {}",
                payment.id,
                e
            );
        }

        Ok(payment)
    }

    pub async fn pending_verifications(
        &self,
        contractor_id: Uuid,
    ) -> Result<Vec<AlternativePayment>, ServiceError> {
        Ok(self
            .db_client
            .get_pending_verifications(contractor_id)
            .await?)
    }

    pub async fn homeowner_payments(
        &self,
        homeowner_id: Uuid,
    ) -> Result<Vec<AlternativePayment>, ServiceError> {
        Ok(self
            .db_client
            .get_homeowner_alternative_payments(homeowner_id)
            .await?)
    }

    pub async fn get_payment_for_user(
        &self,
        user_id: Uuid,
        payment_id: Uuid,
    ) -> Result<AlternativePaymentResponseDto, ServiceError> {
        self.db_client
            .get_alternative_payment(payment_id)
            .await?
            .filter(|p| p.homeowner_id == user_id || p.contractor_id == user_id)
            .map(AlternativePaymentResponseDto::from)
            .ok_or(ServiceError::PaymentNotFoundOrProcessed)
    }
}

async fn remove_stored_files(files: &[ReceiptFile]) {
    for file in files {
        if let Err(e) = tokio::fs::remove_file(&file.path).await {
            tracing::warn!("failed to remove orphaned receipt {}: {}", file.path, e);
        }
    }
}

/// Methods whose limit admits the amount, for the checkout method picker.
pub fn available_methods_for(amount: &BigDecimal) -> Vec<PaymentMethodInfoDto> {
    use crate::utils::currency::rupees_to_f64;

    [
        AltPaymentMethod::BankTransfer,
        AltPaymentMethod::Upi,
        AltPaymentMethod::Cash,
        AltPaymentMethod::Cheque,
    ]
    .into_iter()
    .filter(|method| amount <= &method_limit(*method))
    .map(|method| PaymentMethodInfoDto {
        method,
        name: method_display_name(method).to_string(),
        max_amount: rupees_to_f64(&method_limit(method)),
        processing_time: method_processing_time(method).to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: usize) -> UploadedFile {
        UploadedFile {
            original_name: name.to_string(),
            mime_type: mime.to_string(),
            data: vec![0u8; size],
        }
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(matches!(
            validate_receipt_files(&[]),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_valid_batch_accepted() {
        let files = vec![
            file("neft.pdf", "application/pdf", 4096),
            file("screenshot.png", "image/png", 2048),
        ];
        assert!(validate_receipt_files(&files).is_ok());
    }

    #[test]
    fn test_oversized_file_rejected() {
        let files = vec![file("huge.jpg", "image/jpeg", 11 * 1024 * 1024)];
        assert!(matches!(
            validate_receipt_files(&files),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_unsupported_mime_rejected() {
        let files = vec![file("receipt.exe", "application/octet-stream", 100)];
        assert!(matches!(
            validate_receipt_files(&files),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_file_rejected() {
        let files = vec![file("blank.png", "image/png", 0)];
        assert!(matches!(
            validate_receipt_files(&files),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_body_limit_admits_a_maximum_size_receipt() {
        // a full-size file plus the text fields and multipart framing
        assert!(RECEIPT_BODY_LIMIT as u64 >= MAX_RECEIPT_SIZE + 64 * 1024);
    }

    #[test]
    fn test_method_limits() {
        assert_eq!(
            method_limit(AltPaymentMethod::BankTransfer),
            BigDecimal::from(10_000_000)
        );
        assert_eq!(
            method_limit(AltPaymentMethod::Upi),
            BigDecimal::from(1_000_000)
        );
        assert_eq!(method_limit(AltPaymentMethod::Cash), BigDecimal::from(200_000));
        assert_eq!(
            method_limit(AltPaymentMethod::Cheque),
            BigDecimal::from(50_000_000)
        );
    }

    #[test]
    fn test_small_amount_admits_all_methods() {
        let methods = available_methods_for(&BigDecimal::from(50_000));
        assert_eq!(methods.len(), 4);
    }

    #[test]
    fn test_large_amount_narrows_methods() {
        let methods = available_methods_for(&BigDecimal::from(5_000_000));
        let names: Vec<_> = methods.iter().map(|m| m.method).collect();
        assert_eq!(
            names,
            vec![AltPaymentMethod::BankTransfer, AltPaymentMethod::Cheque]
        );
    }

    #[test]
    fn test_amount_over_every_limit_yields_nothing() {
        let methods = available_methods_for(&BigDecimal::from(60_000_000));
        assert!(methods.is_empty());
    }

    #[test]
    fn test_limit_boundary_is_inclusive() {
        let methods = available_methods_for(&BigDecimal::from(200_000));
        assert!(methods.iter().any(|m| m.method == AltPaymentMethod::Cash));

        let methods = available_methods_for(&BigDecimal::from(200_001));
        assert!(!methods.iter().any(|m| m.method == AltPaymentMethod::Cash));
    }

    #[tokio::test]
    async fn test_orphaned_receipts_are_removed_from_disk() {
        let dir = std::env::temp_dir().join(format!("receipts_{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let stored_name = generate_stored_name("png");
        let path = dir.join(&stored_name);
        tokio::fs::write(&path, b"not a real png").await.unwrap();

        let files = vec![ReceiptFile {
            original_name: "upi.png".to_string(),
            stored_name,
            path: path.to_string_lossy().into_owned(),
            size: 14,
            mime_type: "image/png".to_string(),
        }];

        remove_stored_files(&files).await;
        assert!(!path.exists());

        tokio::fs::remove_dir(&dir).await.unwrap();
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for_mime("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_mime("application/pdf"), Some("pdf"));
        assert_eq!(extension_for_mime("text/html"), None);
    }
}
