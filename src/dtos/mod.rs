pub mod paymentdtos;
