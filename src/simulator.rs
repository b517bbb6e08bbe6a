//! Risk simulator: the normalize -> predict -> translate chain for one record

use crate::error::InferenceError;
use crate::labels::Locale;
use crate::models::inference::Pipeline;
use crate::preprocessing;
use crate::types::diagnosis::Diagnosis;
use crate::types::record::PatientRecord;
use crate::types::request::{DiagnosisRequest, DiagnosisResponse, FailureKind};
use tracing::{debug, warn};

/// Turns submitted patient records into translated diagnoses.
///
/// Holds the loaded pipeline read-only for the life of the process.
pub struct RiskSimulator {
    pipeline: Pipeline,
    locale: Locale,
}

impl RiskSimulator {
    pub fn new(pipeline: Pipeline) -> Self {
        Self::with_locale(pipeline, Locale::default())
    }

    pub fn with_locale(pipeline: Pipeline, locale: Locale) -> Self {
        Self { pipeline, locale }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Diagnose a record using the default display locale.
    pub fn diagnose(&self, record: &PatientRecord) -> Result<Diagnosis, InferenceError> {
        self.diagnose_in(record, self.locale)
    }

    /// Diagnose a record, translating the label into `locale`.
    pub fn diagnose_in(
        &self,
        record: &PatientRecord,
        locale: Locale,
    ) -> Result<Diagnosis, InferenceError> {
        record.check_ranges()?;

        // The pipeline re-applies its registered transforms; normalize is idempotent.
        let row = preprocessing::normalize(&record.to_row());
        let raw_label = self.pipeline.predict(&row)?;
        let display_label = locale.translate(&raw_label).to_string();

        let diagnosis = Diagnosis::new(raw_label, display_label);
        debug!(
            raw_label = %diagnosis.raw_label,
            display_label = %diagnosis.display_label,
            severity = %diagnosis.severity,
            "Record diagnosed"
        );
        Ok(diagnosis)
    }

    /// Answer one raw request payload. Never fails: every problem becomes an
    /// error response so the caller can keep serving.
    pub fn handle(&self, payload: &[u8]) -> DiagnosisResponse {
        let request = match serde_json::from_slice::<DiagnosisRequest>(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Failed to deserialize diagnosis request");
                return DiagnosisResponse::failure(None, FailureKind::MalformedRequest, e.to_string());
            }
        };

        let locale = request.locale.unwrap_or(self.locale);
        let record = request.record.decode_choices(locale);

        match self.diagnose_in(&record, locale) {
            Ok(diagnosis) => DiagnosisResponse::Ok {
                diagnosis: diagnosis.with_request_id(request.request_id),
            },
            Err(e) => DiagnosisResponse::failure(request.request_id, FailureKind::from(&e), e.to_string()),
        }
    }

    /// Diagnose several records; each succeeds or fails on its own.
    pub fn diagnose_batch(&self, records: &[PatientRecord]) -> Vec<Result<Diagnosis, InferenceError>> {
        records.iter().map(|r| self.diagnose(r)).collect()
    }
}
