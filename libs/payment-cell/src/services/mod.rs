pub mod payment;
pub mod paymob;
pub mod revenue;

pub use payment::PaymentService;
pub use paymob::PaymobClient;
pub use revenue::RevenueService;
