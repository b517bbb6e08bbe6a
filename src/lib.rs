//! Obesity Risk Simulator Library
//!
//! Normalizes patient survey records into the encoding an exported
//! obesity classifier expects, runs the classifier and translates its class
//! label into a display label with a severity tier.

pub mod config;
pub mod consumer;
pub mod error;
pub mod labels;
pub mod metrics;
pub mod models;
pub mod preprocessing;
pub mod producer;
pub mod simulator;
pub mod types;

pub use config::AppConfig;
pub use error::{InferenceError, ModelLoadError};
pub use labels::{translate, Locale};
pub use models::{Classifier, ModelLoader, Pipeline};
pub use preprocessing::normalize;
pub use simulator::RiskSimulator;
pub use types::{Diagnosis, PatientRecord, SeverityTier};
