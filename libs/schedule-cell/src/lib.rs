pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::Shift;
pub use router::create_schedule_router;
