pub mod alternative;
pub mod notifications;
pub mod payments;
