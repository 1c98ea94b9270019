pub mod email;

pub use email::EmailService;
