/*
Copyright 2024 The Kubernetes Authors.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Signed notifications about canary weight changes.
//!
//! When a Rollout carries the webhook annotations, every weight change can be announced to an
//! external endpoint. The request body is signed with HMAC-SHA256 over `<timestamp>:<body>` so
//! that receivers can both authenticate the sender and reject stale replays.

use std::{future::Future, time::Duration};

use crate::{
    consts::{
        ANNOTATION_ROLLOUT_ID, ANNOTATION_TARGET_URL, WEBHOOK_SECRET_ENV_VAR,
        WEBHOOK_SIGNATURE_HEADER, WEBHOOK_TIMESTAMP_HEADER,
    },
    RolloutContext,
};

use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

// Total time allowed for a single webhook delivery.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("variable {0:?} is not set")]
    MissingSecret(&'static str),
    #[error("no annotations found for {0:?}")]
    MissingAnnotations(String),
    #[error("annotation {0:?} is not set")]
    MissingAnnotation(&'static str),
    #[error("error building body: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("error signing request: {0}")]
    Signing(String),
    #[error("error sending request: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Body of the weight change notification.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SetWeightEvent {
    pub rollout_id: String,
    pub desired_weight: i32,
    pub verified_at: String,
}

/// A notification ready to be delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedRequest {
    pub url: String,
    pub timestamp: String,
    pub signature: String,
    pub body: Vec<u8>,
}

/// Delivers signed notifications.
pub trait WebhookTransport {
    fn post(
        &self,
        request: &SignedRequest,
    ) -> impl Future<Output = Result<(), WebhookError>> + Send;
}

/// HTTP delivery with a bounded total request time.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl WebhookTransport for HttpTransport {
    async fn post(&self, request: &SignedRequest) -> Result<(), WebhookError> {
        let response = self
            .client
            .post(request.url.as_str())
            .header(WEBHOOK_TIMESTAMP_HEADER, request.timestamp.as_str())
            .header(WEBHOOK_SIGNATURE_HEADER, request.signature.as_str())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(request.body.clone())
            .send()
            .await
            .map_err(WebhookError::Transport)?;
        debug!(status = %response.status(), url = %request.url, "rollout webhook delivered");
        Ok(())
    }
}

// Computes the hex encoded HMAC-SHA256 of `<timestamp>:<body>` keyed by the secret.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| WebhookError::Signing(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Notifies an external endpoint about canary weight changes.
///
/// Notifications are best effort. Nothing is sent without a signing secret, and delivery
/// failures are logged and dropped so they can never hold up traffic routing.
pub struct Webhook<T = HttpTransport> {
    secret: Option<String>,
    transport: T,
}

impl Webhook<HttpTransport> {
    pub fn new(secret: Option<String>) -> Self {
        Self::with_transport(secret, HttpTransport::new())
    }
}

impl<T: WebhookTransport> Webhook<T> {
    pub fn with_transport(secret: Option<String>, transport: T) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends the weight change event for the rollout. Errors are logged, never returned.
    pub async fn send_set_weight_event(&self, desired_weight: i32, rollout: &RolloutContext) {
        if let Err(error) = self.try_send_set_weight_event(desired_weight, rollout).await {
            warn!(rollout = %rollout.name, "rollout webhook error: {error}");
        }
    }

    pub async fn try_send_set_weight_event(
        &self,
        desired_weight: i32,
        rollout: &RolloutContext,
    ) -> Result<(), WebhookError> {
        let request = self.build_request(desired_weight, rollout, Utc::now())?;
        self.transport.post(&request).await
    }

    // Builds and signs the notification as of `now`.
    pub fn build_request(
        &self,
        desired_weight: i32,
        rollout: &RolloutContext,
        now: DateTime<Utc>,
    ) -> Result<SignedRequest, WebhookError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or(WebhookError::MissingSecret(WEBHOOK_SECRET_ENV_VAR))?;
        let annotations = rollout
            .annotations
            .as_ref()
            .ok_or_else(|| WebhookError::MissingAnnotations(rollout.name.clone()))?;
        let annotation = |key: &'static str| {
            annotations
                .get(key)
                .filter(|value| !value.is_empty())
                .cloned()
                .ok_or(WebhookError::MissingAnnotation(key))
        };
        let url = annotation(ANNOTATION_TARGET_URL)?;
        let rollout_id = annotation(ANNOTATION_ROLLOUT_ID)?;

        let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        let event = SetWeightEvent {
            rollout_id,
            desired_weight,
            verified_at: timestamp.clone(),
        };
        let body = serde_json::to_vec(&event).map_err(WebhookError::Serialization)?;
        let signature = sign(secret, &timestamp, &body)?;

        Ok(SignedRequest {
            url,
            timestamp,
            signature,
            body,
        })
    }
}
