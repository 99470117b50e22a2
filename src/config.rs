// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub app_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    // Razorpay gateway configuration
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub currency: String,
    pub min_payment_amount: i64,
    pub max_payment_amount: i64,
    // Receipt upload storage
    pub upload_dir: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let app_url = std::env::var("APP_URL").expect("APP_URL must be set");

        // Gateway configuration (with test-mode defaults)
        let razorpay_key_id = std::env::var("RAZORPAY_KEY_ID")
            .unwrap_or_else(|_| "rzp_test_key".to_string());
        let razorpay_key_secret = std::env::var("RAZORPAY_KEY_SECRET")
            .unwrap_or_else(|_| "test_secret_key".to_string());
        let currency = std::env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string());

        // Gateway order limits, in rupees
        let min_payment_amount = std::env::var("MIN_PAYMENT_AMOUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(100);
        let max_payment_amount = std::env::var("MAX_PAYMENT_AMOUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500_000);

        let upload_dir = std::env::var("UPLOAD_DIR")
            .unwrap_or_else(|_| "uploads/payment_receipts".to_string());

        Config {
            database_url,
            app_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port: 8000,
            razorpay_key_id,
            razorpay_key_secret,
            currency,
            min_payment_amount,
            max_payment_amount,
            upload_dir,
        }
    }
}
