//! Obesity Risk Simulator - Main Entry Point
//!
//! Loads the classifier pipeline, then answers diagnosis requests from NATS.
//! Startup fails if the model cannot be loaded; per-request failures are
//! answered with an error response and the loop keeps serving.

use anyhow::{Context, Result};
use futures::StreamExt;
use obesity_risk_simulator::{
    config::{AppConfig, LoggingConfig},
    consumer::{InFlight, RequestConsumer},
    metrics::{MetricsReporter, ServiceMetrics},
    models::ModelLoader,
    producer::DiagnosisResponder,
    simulator::RiskSimulator,
    types::DiagnosisResponse,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("obesity_risk_simulator={}", logging.level)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Obesity Risk Simulator");
    info!(
        model = %config.model.model_path,
        locale = ?config.display.locale,
        workers = config.service.workers,
        "Configuration loaded successfully"
    );

    // No model, no service
    let pipeline = ModelLoader::with_threads(config.model.onnx_threads)
        .load(&config.model)
        .context("Failed to load classifier pipeline")?;
    info!(
        model = %pipeline.name(),
        backend = %pipeline.backend(),
        transforms = ?pipeline.transform_names(),
        features = pipeline.feature_names().len(),
        "Classifier pipeline loaded"
    );

    let simulator = Arc::new(RiskSimulator::with_locale(pipeline, config.display.locale));
    let metrics = Arc::new(ServiceMetrics::new());

    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let responder = DiagnosisResponder::new(client.clone(), &config.nats.result_subject);
    info!(
        requests = %consumer.subject(),
        results = %responder.result_subject(),
        "Serving diagnosis requests"
    );

    let metrics_clone = metrics.clone();
    let interval = config.service.metrics_interval_secs;
    tokio::spawn(async move {
        MetricsReporter::new(metrics_clone, interval).start().await;
    });

    let in_flight = InFlight::new(config.service.workers);
    let mut subscription = consumer.subscribe().await?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => break,
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        let permit = in_flight.acquire().await?;
        let simulator = simulator.clone();
        let responder = responder.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();
            let response: DiagnosisResponse = simulator.handle(&message.payload);
            let processing_time = start_time.elapsed();

            metrics.record(&response, processing_time);

            match &response {
                DiagnosisResponse::Ok { diagnosis } => info!(
                    request_id = ?diagnosis.request_id,
                    raw_label = %diagnosis.raw_label,
                    display_label = %diagnosis.display_label,
                    severity = %diagnosis.severity,
                    processing_time_us = processing_time.as_micros(),
                    "Diagnosis served"
                ),
                DiagnosisResponse::Error { request_id, kind, message: reason } => error!(
                    request_id = ?request_id,
                    kind = ?kind,
                    error = %reason,
                    "Diagnosis failed"
                ),
            }

            if let Err(e) = responder.publish(&response, message.reply.clone()).await {
                error!(error = %e, "Failed to publish diagnosis response");
            }

            drop(permit);
        });
    }

    info!("Risk simulator shutting down...");

    // Every permit back means every in-flight request has been answered
    in_flight.drain().await?;
    if let Err(e) = client.flush().await {
        error!(error = %e, "Failed to flush pending responses");
    }
    metrics.print_summary();

    Ok(())
}
