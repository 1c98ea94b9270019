pub mod agenda;
pub mod doctor;

pub use agenda::DoctorAgendaService;
pub use doctor::DoctorService;
