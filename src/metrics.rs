//! Request metrics and periodic summaries for the risk simulator service.

use crate::types::diagnosis::SeverityTier;
use crate::types::request::{DiagnosisResponse, FailureKind};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the request loop
pub struct ServiceMetrics {
    /// Total requests answered
    pub requests: AtomicU64,
    /// Requests answered with an error
    pub failures: AtomicU64,
    /// Diagnoses by severity tier
    by_severity: RwLock<HashMap<SeverityTier, u64>>,
    /// Diagnoses by raw model label
    by_label: RwLock<HashMap<String, u64>>,
    /// Failures by kind
    by_failure: RwLock<HashMap<FailureKind, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            by_severity: RwLock::new(HashMap::new()),
            by_label: RwLock::new(HashMap::new()),
            by_failure: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record one answered request
    pub fn record(&self, response: &DiagnosisResponse, processing_time: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        match response {
            DiagnosisResponse::Ok { diagnosis } => {
                if let Ok(mut by_severity) = self.by_severity.write() {
                    *by_severity.entry(diagnosis.severity).or_insert(0) += 1;
                }
                if let Ok(mut by_label) = self.by_label.write() {
                    *by_label.entry(diagnosis.raw_label.clone()).or_insert(0) += 1;
                }
            }
            DiagnosisResponse::Error { kind, .. } => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut by_failure) = self.by_failure.write() {
                    *by_failure.entry(*kind).or_insert(0) += 1;
                }
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Requests per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_by_severity(&self) -> HashMap<SeverityTier, u64> {
        self.by_severity.read().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn get_by_label(&self) -> HashMap<String, u64> {
        self.by_label.read().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn get_by_failure(&self) -> HashMap<FailureKind, u64> {
        self.by_failure.read().map(|m| m.clone()).unwrap_or_default()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let requests = self.requests.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let failure_rate = if requests > 0 {
            (failures as f64 / requests as f64) * 100.0
        } else {
            0.0
        };
        let processing = self.get_processing_stats();

        info!(
            requests,
            failures,
            failure_rate = format!("{:.1}%", failure_rate),
            throughput = format!("{:.2} req/s", self.get_throughput()),
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Risk simulator summary"
        );

        for tier in [SeverityTier::Normal, SeverityTier::Medium, SeverityTier::High] {
            let count = self.get_by_severity().get(&tier).copied().unwrap_or(0);
            info!(severity = %tier, count, "Diagnoses by severity");
        }

        let mut labels: Vec<(String, u64)> = self.get_by_label().into_iter().collect();
        labels.sort();
        for (label, count) in labels {
            info!(label = %label, count, "Diagnoses by label");
        }

        for (kind, count) in self.get_by_failure() {
            info!(kind = ?kind, count, "Failures by kind");
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics summary logger
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::diagnosis::Diagnosis;

    fn ok(raw: &str, display: &str) -> DiagnosisResponse {
        DiagnosisResponse::Ok {
            diagnosis: Diagnosis::new(raw.to_string(), display.to_string()),
        }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record(&ok("Obesity_Type_I", "Obesity Grade I"), Duration::from_micros(100));
        metrics.record(&ok("Obesity_Type_I", "Obesity Grade I"), Duration::from_micros(300));
        metrics.record(&ok("Normal_Weight", "Normal Weight"), Duration::from_micros(200));
        metrics.record(
            &DiagnosisResponse::failure(None, FailureKind::MalformedRequest, "bad json"),
            Duration::from_micros(10),
        );

        assert_eq!(metrics.requests.load(Ordering::Relaxed), 4);
        assert_eq!(metrics.failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_by_severity().get(&SeverityTier::High), Some(&2));
        assert_eq!(metrics.get_by_severity().get(&SeverityTier::Normal), Some(&1));
        assert_eq!(metrics.get_by_label().get("Obesity_Type_I"), Some(&2));
        assert_eq!(metrics.get_by_failure().get(&FailureKind::MalformedRequest), Some(&1));
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);

        for us in [100, 200, 300, 400] {
            metrics.record(&ok("Normal_Weight", "Normal Weight"), Duration::from_micros(us));
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
    }
}
