use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub specialization_id: Uuid,
    pub branch_ids: Vec<Uuid>,
    pub consultation_fee: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDoctorRequest {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub specialization_id: Uuid,
    pub branch_ids: Vec<Uuid>,
    pub consultation_fee: String,
    pub bio: Option<String>,
    pub temporary_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub specialization_id: Option<Uuid>,
    pub branch_ids: Option<Vec<Uuid>>,
    pub consultation_fee: Option<String>,
    pub bio: Option<String>,
}

/// Self-service subset of the update payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDoctorPersonalInfoRequest {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithPatient {
    pub id: Uuid,
    pub date: NaiveDate,
    pub shift: String,
    pub status: String,
    pub patient: Option<PatientSummary>,
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor with email {email} already exists")]
    EmailAlreadyExists { email: String },

    #[error("Specialization not found")]
    SpecializationNotFound,

    #[error("Branches not found: {0}")]
    BranchesNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for DoctorError {
    fn from(err: anyhow::Error) -> Self {
        DoctorError::Database(err.to_string())
    }
}
