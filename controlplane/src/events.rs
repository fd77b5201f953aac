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

use std::future::Future;

use crate::{consts::EVENT_REPORTER, RolloutContext};

use kube::{
    runtime::events::{self, Recorder, Reporter},
    Client,
};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    Normal,
    Warning,
}

/// Sink for the operator facing events emitted while converging the canary mapping.
///
/// Recording is best effort: implementations must never fail the caller.
pub trait EventRecorder {
    fn record(
        &self,
        type_: EventType,
        reason: &str,
        message: String,
    ) -> impl Future<Output = ()> + Send;

    fn normal(&self, reason: &str, message: String) -> impl Future<Output = ()> + Send {
        self.record(EventType::Normal, reason, message)
    }

    fn warning(&self, reason: &str, message: String) -> impl Future<Output = ()> + Send {
        self.record(EventType::Warning, reason, message)
    }
}

/// Publishes events to the Kubernetes API against the Rollout object.
pub struct KubeEventRecorder {
    recorder: Recorder,
}

impl KubeEventRecorder {
    pub fn new(client: Client, rollout: &RolloutContext) -> Self {
        let reporter = Reporter {
            controller: EVENT_REPORTER.to_string(),
            instance: std::env::var("HOSTNAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter, rollout.object_ref()),
        }
    }
}

impl EventRecorder for KubeEventRecorder {
    async fn record(&self, type_: EventType, reason: &str, message: String) {
        let event = events::Event {
            type_: match type_ {
                EventType::Normal => events::EventType::Normal,
                EventType::Warning => events::EventType::Warning,
            },
            reason: reason.to_string(),
            note: Some(message),
            action: reason.to_string(),
            secondary: None,
        };
        if let Err(error) = self.recorder.publish(event).await {
            warn!(reason, "failed to publish event: {error}");
        }
    }
}

/// Writes events to the log only. Used where no Kubernetes API is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogEventRecorder;

impl EventRecorder for LogEventRecorder {
    async fn record(&self, type_: EventType, reason: &str, message: String) {
        match type_ {
            EventType::Normal => info!(reason, "{message}"),
            EventType::Warning => warn!(reason, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{ROLLOUT_API_VERSION, ROLLOUT_KIND};

    #[test]
    fn events_regard_the_rollout() {
        let rollout = RolloutContext {
            name: "rollout".to_string(),
            namespace: "default".to_string(),
            ..Default::default()
        };
        let reference = rollout.object_ref();
        assert_eq!(reference.api_version.as_deref(), Some(ROLLOUT_API_VERSION));
        assert_eq!(reference.kind.as_deref(), Some(ROLLOUT_KIND));
        assert_eq!(reference.name.as_deref(), Some("rollout"));
        assert_eq!(reference.namespace.as_deref(), Some("default"));
    }

    #[tokio::test]
    async fn log_recorder_never_fails() {
        let recorder = LogEventRecorder;
        recorder.normal("SomeReason", "normal".to_string()).await;
        recorder.warning("SomeReason", "warning".to_string()).await;
    }
}
