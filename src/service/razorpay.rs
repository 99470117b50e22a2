// service/razorpay.rs
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{config::Config, service::error::ServiceError};

type HmacSha256 = Hmac<Sha256>;

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount: i64, // paise
    pub currency: String,
    pub status: String,
}

/// Thin Razorpay client: order creation over HTTPS and offline signature
/// verification for the checkout callback.
#[derive(Debug, Clone)]
pub struct RazorpayClient {
    key_id: String,
    key_secret: String,
    client: reqwest::Client,
}

impl RazorpayClient {
    pub fn new(config: &Config) -> Self {
        Self {
            key_id: config.razorpay_key_id.clone(),
            key_secret: config.razorpay_key_secret.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Opens a gateway order. `amount_paise` is in the gateway's minor unit;
    /// conversion from rupees happens before this call.
    pub async fn create_order(
        &self,
        amount_paise: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, ServiceError> {
        let payload = serde_json::json!({
            "amount": amount_paise,
            "currency": currency,
            "receipt": receipt,
            "payment_capture": 1
        });

        let response = self
            .client
            .post(format!("{}/orders", RAZORPAY_API_BASE))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::Gateway(e.to_string()))?;

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::Gateway(e.to_string()))?;

        if let Some(error) = response_body.get("error") {
            let description = error["description"]
                .as_str()
                .unwrap_or("Order creation failed");
            return Err(ServiceError::Gateway(description.to_string()));
        }

        let order_id = response_body["id"]
            .as_str()
            .ok_or_else(|| ServiceError::Gateway("Missing order id in response".to_string()))?;

        Ok(GatewayOrder {
            order_id: order_id.to_string(),
            amount: response_body["amount"].as_i64().unwrap_or(amount_paise),
            currency: response_body["currency"]
                .as_str()
                .unwrap_or(currency)
                .to_string(),
            status: response_body["status"].as_str().unwrap_or("created").to_string(),
        })
    }

    /// Hex HMAC-SHA256 over `"{order_id}|{payment_id}"`, the signature
    /// Razorpay checkout hands back to the client.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time comparison against the recomputed signature.
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let expected = self.sign(order_id, payment_id);
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> RazorpayClient {
        RazorpayClient {
            key_id: "rzp_test_key".to_string(),
            key_secret: "test_secret_key".to_string(),
            client: reqwest::Client::new(),
        }
    }

    #[test]
    fn test_signature_round_trip() {
        let client = test_client();
        let signature = client.sign("order_123", "pay_456");
        assert!(client.verify_signature("order_123", "pay_456", &signature));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let client = test_client();
        let mut signature = client.sign("order_123", "pay_456");
        signature.replace_range(0..1, if signature.starts_with('0') { "1" } else { "0" });
        assert!(!client.verify_signature("order_123", "pay_456", &signature));
    }

    #[test]
    fn test_signature_bound_to_order_and_payment() {
        let client = test_client();
        let signature = client.sign("order_123", "pay_456");
        assert!(!client.verify_signature("order_999", "pay_456", &signature));
        assert!(!client.verify_signature("order_123", "pay_999", &signature));
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let client = test_client();
        let signature = client.sign("order_123", "pay_456");
        assert!(!client.verify_signature("order_123", "pay_456", &signature[..10]));
    }
}
