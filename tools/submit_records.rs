//! Test Record Submitter
//!
//! Generates random in-domain patient records and sends them to the risk
//! simulator as NATS requests, logging each diagnosis it gets back.
//!
//! Usage: submit-records [nats_url] [subject] [count] [invalid_rate] [delay_ms]

use obesity_risk_simulator::types::{DiagnosisRequest, DiagnosisResponse, PatientRecord};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Random record generator covering the simulator form's domains
struct RecordGenerator {
    rng: rand::rngs::ThreadRng,
    counter: u64,
}

impl RecordGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("form_{:08}", self.counter)
    }

    /// Generate a record with every field inside its form domain
    fn generate_valid(&mut self) -> PatientRecord {
        PatientRecord {
            age: self.rng.gen_range(14.0..61.0_f64).round(),
            gender: self.random_choice(&["Male", "Female"]).to_string(),
            height: self.rng.gen_range(1.45..1.98),
            weight: self.rng.gen_range(39.0..173.0),
            family_history: self.random_choice(&["yes", "no"]).to_string(),
            favc: self.random_choice(&["yes", "no"]).to_string(),
            fcvc: self.rng.gen_range(1.0..=3.0),
            ncp: self.rng.gen_range(1.0..=4.0),
            caec: self
                .random_choice(&["no", "Sometimes", "Frequently", "Always"])
                .to_string(),
            smoke: self.random_choice(&["yes", "no"]).to_string(),
            ch2o: self.rng.gen_range(1.0..=3.0),
            scc: self.random_choice(&["yes", "no"]).to_string(),
            faf: self.rng.gen_range(0.0..=3.0),
            tue: self.rng.gen_range(0.0..=2.0),
            calc: self
                .random_choice(&["no", "Sometimes", "Frequently", "Always"])
                .to_string(),
            mtrans: self
                .random_choice(&[
                    "Public_Transportation",
                    "Walking",
                    "Automobile",
                    "Motorbike",
                    "Bike",
                ])
                .to_string(),
        }
    }

    /// Generate a record the pipeline must reject
    fn generate_invalid(&mut self) -> PatientRecord {
        let mut record = self.generate_valid();
        match self.rng.gen_range(0..3) {
            0 => record.gender = "Unknown".to_string(),
            1 => record.mtrans = "Scooter".to_string(),
            _ => record.height = 2.9,
        }
        record
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("submit_records=info".parse()?),
        )
        .init();

    info!("Starting Test Record Submitter");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("risk.diagnose");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(20);
    let invalid_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(200);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        invalid_rate = invalid_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, invalid_rate).await;
        }
    };

    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();
    let (mut served, mut rejected) = (0u64, 0u64);

    for _ in 0..count {
        let record = if rng.gen_bool(invalid_rate) {
            generator.generate_invalid()
        } else {
            generator.generate_valid()
        };
        let request = DiagnosisRequest {
            request_id: Some(generator.next_id()),
            locale: None,
            record,
        };

        let payload = serde_json::to_vec(&request)?;
        let reply = client.request(subject.to_string(), payload.into()).await?;

        match serde_json::from_slice::<DiagnosisResponse>(&reply.payload)? {
            DiagnosisResponse::Ok { diagnosis } => {
                served += 1;
                info!(
                    request_id = ?diagnosis.request_id,
                    label = %diagnosis.display_label,
                    severity = %diagnosis.severity,
                    "Diagnosis received"
                );
            }
            DiagnosisResponse::Error {
                request_id,
                kind,
                message,
            } => {
                rejected += 1;
                warn!(request_id = ?request_id, kind = ?kind, error = %message, "Request rejected");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} records ({} diagnosed, {} rejected)",
        count, served, rejected
    );

    Ok(())
}

async fn run_dry_mode(count: u64, invalid_rate: f64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let record = if rng.gen_bool(invalid_rate) {
            generator.generate_invalid()
        } else {
            generator.generate_valid()
        };
        let request = DiagnosisRequest {
            request_id: Some(generator.next_id()),
            locale: None,
            record,
        };

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, serde_json::to_string_pretty(&request)?);
        }
    }

    Ok(())
}
