//! NATS publisher for diagnosis responses

use crate::types::request::DiagnosisResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes responses to the requester's inbox and the result subject
#[derive(Clone)]
pub struct DiagnosisResponder {
    client: Client,
    result_subject: String,
}

impl DiagnosisResponder {
    pub fn new(client: Client, result_subject: &str) -> Self {
        Self {
            client,
            result_subject: result_subject.to_string(),
        }
    }

    /// Publish a response, replying directly when the request carried an inbox
    pub async fn publish(&self, response: &DiagnosisResponse, reply: Option<Subject>) -> Result<()> {
        let payload = serde_json::to_vec(response)?;

        if let Some(inbox) = reply {
            self.client.publish(inbox, payload.clone().into()).await?;
        }
        self.client
            .publish(self.result_subject.clone(), payload.into())
            .await?;

        debug!(
            request_id = ?response.request_id(),
            ok = response.is_ok(),
            "Published diagnosis response"
        );

        Ok(())
    }

    pub fn result_subject(&self) -> &str {
        &self.result_subject
    }
}
