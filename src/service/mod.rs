pub mod error;
pub mod notification_service;
pub mod payment_service;
pub mod razorpay;
pub mod receipt_service;
