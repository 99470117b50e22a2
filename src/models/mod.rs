pub mod paymentmodel;
pub mod usermodel;
