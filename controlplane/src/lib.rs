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

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ObjectReference;
use thiserror::Error;

pub use events::{EventRecorder, EventType, KubeEventRecorder, LogEventRecorder};
pub use mapping::{
    build_canary_mapping, canary_mapping_name, get_mapping_weight, mapping_api,
    set_mapping_weight, Mapping, MappingSpec,
};
pub use reconciler::Reconciler;
pub use traits::{MappingClient, TrafficRoutingReconciler};
pub use webhook::{
    sign, HttpTransport, SetWeightEvent, SignedRequest, Webhook, WebhookError, WebhookTransport,
    WEBHOOK_TIMEOUT,
};

pub mod config;
pub mod consts;
mod events;
mod mapping;
mod reconciler;
mod traits;
mod utils;
mod webhook;

#[derive(Error, Debug)]
pub enum Error {
    #[error("kube error: {0}")]
    KubeError(#[source] kube::Error),
    #[error("invalid configuration: `{0}`")]
    InvalidConfigError(String),
    #[error("ambassador mapping `{0}` not found")]
    MappingNotFound(String, #[source] kube::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The parts of an Argo Rollout that the Ambassador traffic router needs.
#[derive(Clone, Debug, Default)]
pub struct RolloutContext {
    /// Name of the Rollout.
    pub name: String,
    /// Namespace of the Rollout, its mappings live in the same namespace.
    pub namespace: String,
    /// Name of the operator-authored base Mapping.
    pub mapping: String,
    /// Service receiving canary traffic.
    pub canary_service: String,
    /// Annotations of the Rollout. `None` when the Rollout carries none at all.
    pub annotations: Option<BTreeMap<String, String>>,
}

impl RolloutContext {
    // Reference to the Rollout object, used as the regarding object of events.
    pub fn object_ref(&self) -> ObjectReference {
        ObjectReference {
            api_version: Some(consts::ROLLOUT_API_VERSION.to_string()),
            kind: Some(consts::ROLLOUT_KIND.to_string()),
            name: Some(self.name.clone()),
            namespace: Some(self.namespace.clone()),
            ..Default::default()
        }
    }
}
