//! Wire envelopes for diagnosis requests and responses

use crate::error::InferenceError;
use crate::labels::Locale;
use crate::types::diagnosis::Diagnosis;
use crate::types::record::PatientRecord;
use serde::{Deserialize, Serialize};

/// One form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    /// Correlation id echoed back in the response
    #[serde(default)]
    pub request_id: Option<String>,

    /// Language of the form choices and of the returned label
    #[serde(default)]
    pub locale: Option<Locale>,

    pub record: PatientRecord,
}

/// Category of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Payload could not be parsed
    MalformedRequest,
    /// A numeric field is outside the form domain
    InvalidInput,
    /// The pipeline rejected the record or the backend failed
    InferenceFailed,
}

impl From<&InferenceError> for FailureKind {
    fn from(err: &InferenceError) -> Self {
        match err {
            InferenceError::OutOfRange { .. } => FailureKind::InvalidInput,
            _ => FailureKind::InferenceFailed,
        }
    }
}

/// Reply to a [`DiagnosisRequest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DiagnosisResponse {
    Ok {
        diagnosis: Diagnosis,
    },
    Error {
        #[serde(default)]
        request_id: Option<String>,
        kind: FailureKind,
        message: String,
    },
}

impl DiagnosisResponse {
    pub fn failure(request_id: Option<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        DiagnosisResponse::Error {
            request_id,
            kind,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, DiagnosisResponse::Ok { .. })
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            DiagnosisResponse::Ok { diagnosis } => diagnosis.request_id.as_deref(),
            DiagnosisResponse::Error { request_id, .. } => request_id.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = r#"{
        "request_id": "form-42",
        "locale": "pt-br",
        "record": {
            "Age": 30, "Gender": "Masculino", "Height": 1.70, "Weight": 130,
            "family_history": "Sim", "FAVC": "Sim", "FCVC": 2.4, "NCP": 3.0,
            "CAEC": "Às vezes", "SMOKE": "Não", "CH2O": 2.0, "SCC": "Não",
            "FAF": 1.0, "TUE": 1.0, "CALC": "Não", "MTRANS": "Carro"
        }
    }"#;

    #[test]
    fn test_request_parsing() {
        let request: DiagnosisRequest = serde_json::from_str(REQUEST).unwrap();

        assert_eq!(request.request_id.as_deref(), Some("form-42"));
        assert_eq!(request.locale, Some(Locale::PtBr));
        assert_eq!(request.record.age, 30.0);
        assert_eq!(request.record.gender, "Masculino");
    }

    #[test]
    fn test_request_missing_field_rejected() {
        let without_mtrans = REQUEST.replace(r#", "MTRANS": "Carro""#, "");
        assert!(serde_json::from_str::<DiagnosisRequest>(&without_mtrans).is_err());
    }

    #[test]
    fn test_error_response_shape() {
        let err = InferenceError::UnseenCategory {
            feature: "Gender".to_string(),
            value: "Unknown".to_string(),
        };
        let response = DiagnosisResponse::failure(
            Some("form-1".to_string()),
            FailureKind::from(&err),
            err.to_string(),
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "inference_failed");
        assert_eq!(json["request_id"], "form-1");
        assert!(!response.is_ok());
    }

    #[test]
    fn test_out_of_range_is_invalid_input() {
        let err = InferenceError::OutOfRange {
            feature: "Age".to_string(),
            value: 5.0,
            min: 10.0,
            max: 100.0,
        };
        assert_eq!(FailureKind::from(&err), FailureKind::InvalidInput);
    }
}
