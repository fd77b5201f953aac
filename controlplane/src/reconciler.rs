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

use std::{ops::Sub, time::Instant};

use crate::{
    consts::{
        AMBASSADOR_MAPPING_CONFIG_ERROR, AMBASSADOR_MAPPING_NOT_FOUND, AMBASSADOR_ROUTING_TYPE,
        CANARY_MAPPING_CLEANUP_ERROR, CANARY_MAPPING_CREATION_ERROR, CANARY_MAPPING_UPDATE_ERROR,
        CANARY_MAPPING_WEIGHT_UPDATE,
    },
    *,
};
use utils::check_if_not_found_err;

use kube::ResourceExt;
use tracing::{debug, info};

/// Ambassador traffic router.
///
/// Traffic is shifted by cloning the base mapping of the Rollout into a canary mapping that
/// points to the canary service and carries the desired weight. The canary mapping is removed
/// again once the desired weight drops back to 0.
pub struct Reconciler<C, R> {
    rollout: RolloutContext,
    client: C,
    recorder: R,
}

impl<C, R> Reconciler<C, R>
where
    C: MappingClient,
    R: EventRecorder,
{
    pub fn new(rollout: RolloutContext, client: C, recorder: R) -> Self {
        Self {
            rollout,
            client,
            recorder,
        }
    }

    pub fn rollout(&self) -> &RolloutContext {
        &self.rollout
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    async fn create_canary_mapping(
        &self,
        base_mapping_name: &str,
        desired_weight: i32,
    ) -> Result<()> {
        if desired_weight == 0 {
            debug!(mapping = base_mapping_name, "no canary mapping to create for weight 0");
            return Ok(());
        }

        let base_mapping = match self.client.get(base_mapping_name).await {
            Ok(mapping) => mapping,
            Err(error) if check_if_not_found_err(&error) => {
                let msg = format!("Ambassador mapping {base_mapping_name:?} not found");
                self.recorder.warning(AMBASSADOR_MAPPING_NOT_FOUND, msg).await;
                return Err(Error::MappingNotFound(base_mapping_name.to_string(), error));
            }
            Err(error) => return Err(Error::KubeError(error)),
        };

        if get_mapping_weight(&base_mapping) != 0 {
            let msg = format!("Ambassador mapping {base_mapping_name:?} can not define weight");
            self.recorder
                .warning(AMBASSADOR_MAPPING_CONFIG_ERROR, msg.clone())
                .await;
            return Err(Error::InvalidConfigError(msg));
        }

        let canary_mapping =
            build_canary_mapping(&base_mapping, &self.rollout.canary_service, desired_weight);
        if let Err(error) = self.client.create(&canary_mapping).await {
            let msg = format!("Error creating canary mapping: {error}");
            self.recorder.warning(CANARY_MAPPING_CREATION_ERROR, msg).await;
            return Err(Error::KubeError(error));
        }
        info!(
            mapping = %canary_mapping.name_any(),
            weight = desired_weight,
            "created canary mapping"
        );
        Ok(())
    }

    async fn update_canary_mapping(
        &self,
        mut canary_mapping: Mapping,
        desired_weight: i32,
    ) -> Result<()> {
        // the canary mapping is removed once the rollout concludes
        if desired_weight == 0 {
            return self.delete_canary_mapping(&canary_mapping).await;
        }

        set_mapping_weight(&mut canary_mapping, desired_weight);
        if let Err(error) = self.client.update(&canary_mapping).await {
            let msg = format!(
                "Error updating canary mapping {:?}: {error}",
                canary_mapping.name_any()
            );
            self.recorder.warning(CANARY_MAPPING_UPDATE_ERROR, msg).await;
            return Err(Error::KubeError(error));
        }
        info!(
            mapping = %canary_mapping.name_any(),
            weight = desired_weight,
            "updated canary mapping weight"
        );
        Ok(())
    }

    async fn delete_canary_mapping(&self, canary_mapping: &Mapping) -> Result<()> {
        let name = canary_mapping.name_any();
        if let Err(error) = self.client.delete(&name).await {
            let msg = format!("Error deleting canary mapping {name:?}: {error}");
            self.recorder.warning(CANARY_MAPPING_CLEANUP_ERROR, msg).await;
            return Err(Error::KubeError(error));
        }
        info!(mapping = %name, "deleted canary mapping");
        Ok(())
    }
}

impl<C, R> TrafficRoutingReconciler for Reconciler<C, R>
where
    C: MappingClient + Sync,
    R: EventRecorder + Sync,
{
    fn type_name(&self) -> &'static str {
        AMBASSADOR_ROUTING_TYPE
    }

    // Configures the canary mapping with the given weight. The canary mapping is created by
    // cloning the base mapping of the Rollout when it does not exist yet, updated when it does
    // and deleted when the desired weight is 0.
    async fn set_weight(&self, desired_weight: i32) -> Result<()> {
        let start = Instant::now();
        self.recorder
            .normal(
                CANARY_MAPPING_WEIGHT_UPDATE,
                format!("Updating canary mapping weight to {desired_weight}"),
            )
            .await;

        let base_mapping_name = self.rollout.mapping.as_str();
        let canary_name = canary_mapping_name(base_mapping_name);

        let result = match self.client.get(&canary_name).await {
            Ok(canary_mapping) => {
                self.update_canary_mapping(canary_mapping, desired_weight)
                    .await
            }
            Err(error) if check_if_not_found_err(&error) => {
                debug!(mapping = %canary_name, "canary mapping not found");
                self.create_canary_mapping(base_mapping_name, desired_weight)
                    .await
            }
            Err(error) => Err(Error::KubeError(error)),
        };

        let duration = Instant::now().sub(start);
        debug!("finished setting weight in {:?} ms", duration.as_millis());
        result
    }

    // There is no way to observe the weight Ambassador applies, a successful write is all there
    // is to verify.
    async fn verify_weight(&self, _desired_weight: i32) -> Result<bool> {
        Ok(true)
    }
}
