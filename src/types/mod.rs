//! Type definitions for the risk simulator

pub mod diagnosis;
pub mod record;
pub mod request;

pub use diagnosis::{Diagnosis, SeverityTier};
pub use record::{FeatureRow, FeatureValue, PatientRecord};
pub use request::{DiagnosisRequest, DiagnosisResponse, FailureKind};
