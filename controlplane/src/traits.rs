use std::future::Future;

use crate::{mapping::Mapping, Result};

use kube::{
    api::{Api, DeleteParams, PostParams},
    ResourceExt,
};

/// The subset of store operations the Ambassador reconciler needs against mappings in a single
/// namespace.
pub trait MappingClient {
    fn get(&self, name: &str) -> impl Future<Output = Result<Mapping, kube::Error>> + Send;
    fn create(&self, mapping: &Mapping)
        -> impl Future<Output = Result<Mapping, kube::Error>> + Send;
    fn update(&self, mapping: &Mapping)
        -> impl Future<Output = Result<Mapping, kube::Error>> + Send;
    fn delete(&self, name: &str) -> impl Future<Output = Result<(), kube::Error>> + Send;
}

impl MappingClient for Api<Mapping> {
    async fn get(&self, name: &str) -> Result<Mapping, kube::Error> {
        Api::get(self, name).await
    }

    async fn create(&self, mapping: &Mapping) -> Result<Mapping, kube::Error> {
        Api::create(self, &PostParams::default(), mapping).await
    }

    // Replaces the whole object, the resource version of the provided mapping is used for
    // conflict detection.
    async fn update(&self, mapping: &Mapping) -> Result<Mapping, kube::Error> {
        Api::replace(self, &mapping.name_any(), &PostParams::default(), mapping).await
    }

    async fn delete(&self, name: &str) -> Result<(), kube::Error> {
        Api::delete(self, name, &DeleteParams::default())
            .await
            .map(|_| ())
    }
}

/// A traffic router able to shift a weight of the traffic to the canary.
pub trait TrafficRoutingReconciler {
    fn type_name(&self) -> &'static str;
    fn set_weight(&self, desired_weight: i32) -> impl Future<Output = Result<()>> + Send;
    fn verify_weight(&self, desired_weight: i32) -> impl Future<Output = Result<bool>> + Send;
}
