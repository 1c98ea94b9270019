pub mod branch;
pub mod medical_service;
pub mod specialization;

pub use branch::BranchService;
pub use medical_service::MedicalServiceCatalog;
pub use specialization::SpecializationService;
