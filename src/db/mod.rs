pub mod alternativedb;
pub mod db;
pub mod notificationdb;
pub mod paymentdb;
pub mod userdb;
