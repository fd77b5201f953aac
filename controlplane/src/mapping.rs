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

use crate::consts::{CANARY_MAPPING_SUFFIX, MAX_RESOURCE_NAME_LEN};

use kube::{Api, Client, CustomResource, ResourceExt};
use serde::{Deserialize, Deserializer, Serialize};

/// Spec of an Ambassador `Mapping`.
///
/// Only the fields the canary logic reads or writes are typed. Everything else
/// the operator put in the spec is kept in `extra` so that it survives cloning
/// and updates untouched.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(
    group = "getambassador.io",
    version = "v2",
    kind = "Mapping",
    plural = "mappings",
    namespaced,
    schema = "disabled",
    derive = "PartialEq"
)]
pub struct MappingSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
    #[serde(default)]
    pub service: String,
    #[serde(
        default,
        deserialize_with = "deserialize_weight",
        skip_serializing_if = "Option::is_none"
    )]
    pub weight: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// Anything other than an integer weight reads as unset.
fn deserialize_weight<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(serde_json::Value::as_i64))
}

// Returns a namespaced API handle for Ambassador mappings.
pub fn mapping_api(client: Client, namespace: &str) -> Api<Mapping> {
    Api::namespaced(client, namespace)
}

// Returns the weight of the mapping, or 0 when no weight is set.
pub fn get_mapping_weight(mapping: &Mapping) -> i64 {
    mapping.spec.weight.unwrap_or(0)
}

pub fn set_mapping_weight(mapping: &mut Mapping, weight: i32) {
    mapping.spec.weight = Some(i64::from(weight));
}

// Builds the canary mapping name for the provided base mapping name. The base name is truncated
// so that the result never exceeds the Kubernetes object name limit.
pub fn canary_mapping_name(name: &str) -> String {
    let max_base_len = MAX_RESOURCE_NAME_LEN - CANARY_MAPPING_SUFFIX.len();
    let mut end = name.len().min(max_base_len);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &name[..end], CANARY_MAPPING_SUFFIX)
}

// Clones the base mapping into a canary mapping pointing to the canary service with the provided
// weight. None of the base metadata is carried over except for the namespace.
pub fn build_canary_mapping(base: &Mapping, canary_service: &str, desired_weight: i32) -> Mapping {
    let name = canary_mapping_name(&base.name_any());
    let mut canary = Mapping::new(&name, base.spec.clone());
    canary.metadata.namespace = base.namespace();
    canary.spec.service = canary_service.to_string();
    set_mapping_weight(&mut canary, desired_weight);
    canary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAPPING_GROUP, MAPPING_PLURAL, MAPPING_VERSION};
    use kube::Resource;
    use serde_json::json;

    fn base_mapping() -> Mapping {
        serde_json::from_value(json!({
            "apiVersion": "getambassador.io/v2",
            "kind": "Mapping",
            "metadata": {
                "name": "myapp-mapping",
                "namespace": "default",
                "uid": "0b1c4f6e-6a43-4f0e-9b55-0f1d0d0c0a11",
                "resourceVersion": "4711",
                "labels": { "app": "myapp" }
            },
            "spec": {
                "host": "somedomain.com",
                "prefix": "/myapp/",
                "rewrite": "/myapp/",
                "service": "myapp:8080",
                "timeout_ms": 3000
            }
        }))
        .unwrap()
    }

    #[test]
    fn canary_name_appends_suffix() {
        assert_eq!(canary_mapping_name("myapp-mapping"), "myapp-mapping-canary");
        assert_eq!(canary_mapping_name(""), "-canary");
    }

    #[test]
    fn canary_name_is_deterministic() {
        let name = "x".repeat(300);
        assert_eq!(canary_mapping_name(&name), canary_mapping_name(&name));
    }

    #[test]
    fn canary_name_respects_max_length() {
        for len in [0, 1, 245, 246, 247, 253, 261, 1000] {
            let name = "a".repeat(len);
            let canary = canary_mapping_name(&name);
            assert!(canary.len() <= MAX_RESOURCE_NAME_LEN, "len {len}");
            assert!(canary.ends_with(CANARY_MAPPING_SUFFIX), "len {len}");
        }
    }

    #[test]
    fn canary_name_truncates_only_the_base() {
        let name = format!("{}{}", "b".repeat(246), "c".repeat(15));
        assert_eq!(name.len(), 261);

        let canary = canary_mapping_name(&name);
        assert_eq!(canary.len(), 253);
        assert_eq!(canary, format!("{}-canary", "b".repeat(246)));
    }

    #[test]
    fn canary_name_keeps_names_at_the_limit() {
        let name = "d".repeat(246);
        assert_eq!(canary_mapping_name(&name), format!("{name}-canary"));
    }

    #[test]
    fn canary_name_truncates_on_char_boundary() {
        let name = format!("{}é{}", "a".repeat(245), "z".repeat(20));
        let canary = canary_mapping_name(&name);
        assert!(canary.len() <= MAX_RESOURCE_NAME_LEN);
        assert_eq!(canary, format!("{}-canary", "a".repeat(245)));
    }

    #[test]
    fn weight_defaults_to_zero() {
        assert_eq!(get_mapping_weight(&base_mapping()), 0);
    }

    #[test]
    fn malformed_weight_reads_as_zero() {
        for weight in [json!("20"), json!(20.5), json!(true), json!(null), json!({"v": 1})] {
            let mut value = serde_json::to_value(base_mapping()).unwrap();
            value["spec"]["weight"] = weight.clone();
            let mapping: Mapping = serde_json::from_value(value).unwrap();
            assert_eq!(get_mapping_weight(&mapping), 0, "weight {weight}");
            assert_eq!(mapping.spec.service, "myapp:8080");
        }
    }

    #[test]
    fn weight_round_trips() {
        let mut mapping = base_mapping();
        for weight in [0, 1, 13, 100, -5, i32::MAX] {
            set_mapping_weight(&mut mapping, weight);
            assert_eq!(get_mapping_weight(&mapping), i64::from(weight));
        }
    }

    #[test]
    fn weight_is_serialized_under_spec() {
        let mut mapping = base_mapping();
        set_mapping_weight(&mut mapping, 42);
        let value = serde_json::to_value(&mapping).unwrap();
        assert_eq!(value["spec"]["weight"], json!(42));
    }

    #[test]
    fn canary_mapping_is_built_from_base() {
        let base = base_mapping();
        let canary = build_canary_mapping(&base, "canary-service", 13);

        assert_eq!(canary.name_any(), "myapp-mapping-canary");
        assert_eq!(canary.namespace().as_deref(), Some("default"));
        assert_eq!(canary.spec.service, "canary-service");
        assert_eq!(get_mapping_weight(&canary), 13);
        assert_eq!(canary.spec.host.as_deref(), Some("somedomain.com"));
        assert_eq!(canary.spec.prefix.as_deref(), Some("/myapp/"));
        assert_eq!(canary.spec.extra.get("timeout_ms"), Some(&json!(3000)));

        assert!(canary.metadata.uid.is_none());
        assert!(canary.metadata.resource_version.is_none());
        assert!(canary.metadata.labels.is_none());

        // the base mapping must be left untouched
        assert_eq!(base.spec.service, "myapp:8080");
        assert_eq!(get_mapping_weight(&base), 0);
    }

    #[test]
    fn mapping_resource_coordinates() {
        assert_eq!(Mapping::group(&()), MAPPING_GROUP);
        assert_eq!(Mapping::version(&()), MAPPING_VERSION);
        assert_eq!(Mapping::kind(&()), "Mapping");
        assert_eq!(Mapping::plural(&()), MAPPING_PLURAL);
    }
}
