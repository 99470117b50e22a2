// handler/alternative.rs
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::paymentdtos::{
        AlternativePaymentResponseDto, ApiResponse, InitiateAlternativePaymentDto,
        VerifyReceiptDto,
    },
    error::HttpError,
    middleware::{require_role, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::receipt_service::{UploadedFile, RECEIPT_BODY_LIMIT},
    AppState,
};

pub fn alternative_handler() -> Router {
    Router::new()
        .route(
            "/",
            post(initiate_alternative_payment).get(list_alternative_payments),
        )
        .route("/pending", get(list_pending_verifications))
        .route("/:id", get(get_alternative_payment))
        .route(
            "/:id/receipt",
            post(upload_receipt).layer(DefaultBodyLimit::max(RECEIPT_BODY_LIMIT)),
        )
        .route("/:id/verify", post(verify_receipt))
}

/// Homeowner opens a manual payment against an approved stage request or a
/// technical-details unlock.
pub async fn initiate_alternative_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(dto): Json<InitiateAlternativePaymentDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Homeowner)?;
    dto.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let payment = app_state
        .receipt_service
        .initiate(auth.user.id, dto)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Alternative payment initiated",
        AlternativePaymentResponseDto::from(payment),
    )))
}

pub async fn list_alternative_payments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Homeowner)?;

    let payments = app_state
        .receipt_service
        .homeowner_payments(auth.user.id)
        .await
        .map_err(HttpError::from)?;

    let payments: Vec<AlternativePaymentResponseDto> = payments
        .into_iter()
        .map(AlternativePaymentResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::success("Alternative payments", payments)))
}

pub async fn get_alternative_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let payment = app_state
        .receipt_service
        .get_payment_for_user(auth.user.id, payment_id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success("Alternative payment", payment)))
}

/// Homeowner uploads proof of payment as a multipart form: one or more
/// `files` parts plus `transaction_reference`, `payment_date` (YYYY-MM-DD)
/// and optional `notes` text fields.
pub async fn upload_receipt(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(payment_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Homeowner)?;

    let mut files: Vec<UploadedFile> = Vec::new();
    let mut transaction_reference: Option<String> = None;
    let mut payment_date: Option<NaiveDate> = None;
    let mut notes: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" => {
                let original_name = field.file_name().unwrap_or("receipt").to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?
                    .to_vec();

                files.push(UploadedFile {
                    original_name,
                    mime_type,
                    data,
                });
            }
            "transaction_reference" => {
                transaction_reference = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| HttpError::bad_request(e.to_string()))?,
                );
            }
            "payment_date" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| HttpError::bad_request(e.to_string()))?;
                payment_date = Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(
                    |_| HttpError::bad_request("payment_date must be YYYY-MM-DD".to_string()),
                )?);
            }
            "notes" => {
                notes = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| HttpError::bad_request(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let transaction_reference = transaction_reference
        .ok_or_else(|| HttpError::bad_request("transaction_reference is required".to_string()))?;
    let payment_date = payment_date
        .ok_or_else(|| HttpError::bad_request("payment_date is required".to_string()))?;

    let payment = app_state
        .receipt_service
        .upload_receipt(
            auth.user.id,
            payment_id,
            files,
            transaction_reference,
            payment_date,
            notes,
        )
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Receipt uploaded, awaiting verification",
        AlternativePaymentResponseDto::from(payment),
    )))
}

/// Contractor confirms or disputes the uploaded proof.
pub async fn verify_receipt(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(payment_id): Path<Uuid>,
    Json(dto): Json<VerifyReceiptDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Contractor)?;
    dto.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let payment = app_state
        .receipt_service
        .verify(auth.user.id, payment_id, dto)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Verification recorded",
        AlternativePaymentResponseDto::from(payment),
    )))
}

pub async fn list_pending_verifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Contractor)?;

    let payments = app_state
        .receipt_service
        .pending_verifications(auth.user.id)
        .await
        .map_err(HttpError::from)?;

    let payments: Vec<AlternativePaymentResponseDto> = payments
        .into_iter()
        .map(AlternativePaymentResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::success(
        "Payments awaiting verification",
        payments,
    )))
}
