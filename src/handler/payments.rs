// handler/payments.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::paymentdb::StagePaymentExt,
    dtos::paymentdtos::{
        ApiResponse, ListQueryDto, PaymentMethodsQueryDto, PaymentRequestResponseDto,
        RespondPaymentRequestDto, SubmitPaymentRequestDto, TransactionResponseDto,
        VerifyGatewayPaymentDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{require_role, JWTAuthMiddeware},
    models::usermodel::UserRole,
    service::receipt_service::available_methods_for,
    utils::currency::rupees_from_f64,
    AppState,
};

pub fn payments_handler() -> Router {
    Router::new()
        .route(
            "/requests",
            post(submit_payment_request).get(list_payment_requests),
        )
        .route("/requests/:id", get(get_payment_request))
        .route("/requests/:id/respond", post(respond_payment_request))
        .route("/requests/:id/order", post(create_gateway_order))
        .route("/requests/:id/verify", post(verify_gateway_payment))
        .route("/requests/:id/transactions", get(list_request_transactions))
        .route("/methods", get(list_payment_methods))
}

/// Contractor raises a partial payment request against a project stage.
pub async fn submit_payment_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(dto): Json<SubmitPaymentRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Contractor)?;
    dto.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state
        .payment_service
        .submit(auth.user.id, dto)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Payment request submitted",
        PaymentRequestResponseDto::from(request),
    )))
}

/// Role-scoped listing: contractors see requests they raised, homeowners see
/// requests raised against their projects.
pub async fn list_payment_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;

    let requests = match auth.user.role {
        UserRole::Contractor => {
            app_state
                .db_client
                .get_contractor_payment_requests(auth.user.id, limit, offset)
                .await
        }
        UserRole::Homeowner => {
            app_state
                .db_client
                .get_homeowner_payment_requests(auth.user.id, limit, offset)
                .await
        }
        _ => {
            return Err(HttpError::unauthorized(
                ErrorMessage::PermissionDenied.to_string(),
            ))
        }
    }
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let requests: Vec<PaymentRequestResponseDto> = requests
        .into_iter()
        .map(PaymentRequestResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::success("Payment requests", requests)))
}

pub async fn get_payment_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .payment_service
        .get_request_for_user(auth.user.id, request_id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Payment request",
        PaymentRequestResponseDto::from(request),
    )))
}

/// Homeowner approves or rejects a pending request.
pub async fn respond_payment_request(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
    Json(dto): Json<RespondPaymentRequestDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Homeowner)?;
    dto.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state
        .payment_service
        .decide(auth.user.id, request_id, dto)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Payment request updated",
        PaymentRequestResponseDto::from(request),
    )))
}

/// Homeowner opens a Razorpay checkout order for an approved request.
pub async fn create_gateway_order(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Homeowner)?;

    let order = app_state
        .payment_service
        .create_gateway_order(auth.user.id, request_id)
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success("Payment order created", order)))
}

/// Razorpay checkout callback: the browser posts back the order, payment and
/// signature for verification.
pub async fn verify_gateway_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
    Json(dto): Json<VerifyGatewayPaymentDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Homeowner)?;
    dto.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state
        .payment_service
        .verify_gateway_callback(
            auth.user.id,
            request_id,
            &dto.razorpay_order_id,
            &dto.razorpay_payment_id,
            &dto.razorpay_signature,
        )
        .await
        .map_err(HttpError::from)?;

    Ok(Json(ApiResponse::success(
        "Payment verified and settled",
        PaymentRequestResponseDto::from(request),
    )))
}

/// Attempt history for a request, visible to either party.
pub async fn list_request_transactions(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let request = app_state
        .payment_service
        .get_request_for_user(auth.user.id, request_id)
        .await
        .map_err(HttpError::from)?;

    let transactions = app_state
        .db_client
        .get_request_transactions(request.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let transactions: Vec<TransactionResponseDto> = transactions
        .into_iter()
        .map(TransactionResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::success("Payment attempts", transactions)))
}

/// Alternative payment methods whose limit admits the given amount.
pub async fn list_payment_methods(
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(query): Query<PaymentMethodsQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, UserRole::Homeowner)?;

    if query.amount <= 0.0 {
        return Err(HttpError::bad_request("Amount must be positive".to_string()));
    }

    let methods = available_methods_for(&rupees_from_f64(query.amount));

    Ok(Json(ApiResponse::success("Available payment methods", methods)))
}
