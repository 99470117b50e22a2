use rand::{distr::Alphanumeric, Rng};

/// Unique reference passed to Razorpay as the order receipt, e.g. `STG-AB12CD34`.
pub fn generate_transaction_reference() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(10)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("STG-{}", suffix)
}

/// Randomized on-disk name for an uploaded receipt, keeping the extension.
pub fn generate_stored_name(extension: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("receipt_{}.{}", suffix, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_reference_shape() {
        let reference = generate_transaction_reference();
        assert!(reference.starts_with("STG-"));
        assert_eq!(reference.len(), 14);
    }

    #[test]
    fn test_stored_name_keeps_extension() {
        let name = generate_stored_name("pdf");
        assert!(name.starts_with("receipt_"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_stored_names_do_not_collide() {
        let a = generate_stored_name("png");
        let b = generate_stored_name("png");
        assert_ne!(a, b);
    }
}
