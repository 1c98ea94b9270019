use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub visit_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMedicalRecordRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub visit_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMedicalRecordRequest {
    pub diagnosis: Option<String>,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub visit_date: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum MedicalRecordError {
    #[error("Medical record not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for MedicalRecordError {
    fn from(err: anyhow::Error) -> Self {
        MedicalRecordError::Database(err.to_string())
    }
}
