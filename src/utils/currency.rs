/// Currency utility functions for handling Rupee conversions
///
/// All monetary values are stored in rupees (NUMERIC(15,2)); Razorpay
/// expects integer paise (1 Rupee = 100 paise), so the conversion happens
/// only at the gateway boundary.
use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;
use std::str::FromStr;

/// Convert a rupee amount to integer paise (multiply by 100)
pub fn rupees_to_paise(rupees: &BigDecimal) -> i64 {
    (rupees * BigDecimal::from(100)).to_i64().unwrap_or(0)
}

/// Convert integer paise back to a rupee amount (divide by 100)
pub fn paise_to_rupees(paise: i64) -> BigDecimal {
    BigDecimal::from(paise) / BigDecimal::from(100)
}

/// Format a rupee amount for display with 2 decimal places
pub fn format_rupees(rupees: &BigDecimal) -> String {
    format!("₹{:.2}", rupees)
}

/// Lossless-enough bridge from JSON number input, rounded to 2 decimal places
pub fn rupees_from_f64(rupees: f64) -> BigDecimal {
    BigDecimal::from_str(&format!("{:.2}", rupees)).unwrap_or_default()
}

/// Display bridge back to JSON responses
pub fn rupees_to_f64(rupees: &BigDecimal) -> f64 {
    rupees.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bd(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_rupees_to_paise() {
        assert_eq!(rupees_to_paise(&bd("100.00")), 10000);
        assert_eq!(rupees_to_paise(&bd("0.50")), 50);
        assert_eq!(rupees_to_paise(&bd("150000")), 15000000);
    }

    #[test]
    fn test_paise_to_rupees() {
        assert_eq!(paise_to_rupees(10000), bd("100.00"));
        assert_eq!(paise_to_rupees(50), bd("0.50"));
        assert_eq!(paise_to_rupees(15000000), bd("150000"));
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(&bd("100")), "₹100.00");
        assert_eq!(format_rupees(&bd("0.5")), "₹0.50");
    }

    #[test]
    fn test_rupees_from_f64_rounds_to_paise() {
        assert_eq!(rupees_from_f64(150000.0), bd("150000.00"));
        assert_eq!(rupees_from_f64(99.999), bd("100.00"));
    }

}
