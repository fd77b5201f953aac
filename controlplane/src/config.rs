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

use crate::{consts::WEBHOOK_SECRET_ENV_VAR, Error, Result, RolloutContext};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(name = "controller", about = "Shift Rollout traffic through Ambassador canary mappings")]
pub struct Opt {
    /// Namespace of the Rollout and its mappings.
    #[clap(short, long, default_value = "default")]
    pub namespace: String,
    /// Name of the Rollout.
    #[clap(short, long)]
    pub rollout: String,
    /// Name of the base Ambassador mapping.
    #[clap(short, long)]
    pub mapping: String,
    /// Service receiving the canary traffic.
    #[clap(short, long)]
    pub canary_service: String,
    /// Rollout annotation as `key=value`, may be repeated.
    #[clap(short, long = "annotation")]
    pub annotations: Vec<String>,
    /// Log events instead of publishing them to the Kubernetes API.
    #[clap(long)]
    pub no_events: bool,
    /// Secret used to sign webhook notifications.
    #[clap(long, env = WEBHOOK_SECRET_ENV_VAR, hide_env_values = true)]
    pub webhook_secret: Option<String>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Converge the canary mapping to the given weight.
    SetWeight {
        #[clap(short, long)]
        weight: i32,
        /// Also send the signed weight change webhook.
        #[clap(long)]
        notify: bool,
    },
    /// Check whether the given weight has been applied.
    VerifyWeight {
        #[clap(short, long)]
        weight: i32,
    },
}

impl Opt {
    pub fn rollout_context(&self) -> Result<RolloutContext> {
        Ok(RolloutContext {
            name: self.rollout.clone(),
            namespace: self.namespace.clone(),
            mapping: self.mapping.clone(),
            canary_service: self.canary_service.clone(),
            annotations: parse_annotations(&self.annotations)?,
        })
    }
}

// Parses `key=value` pairs. No pairs at all means the Rollout has no annotations.
pub fn parse_annotations(pairs: &[String]) -> Result<Option<BTreeMap<String, String>>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    let mut annotations = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::InvalidConfigError(format!("annotation {pair:?} must be of the form key=value"))
        })?;
        if key.is_empty() {
            return Err(Error::InvalidConfigError(format!(
                "annotation {pair:?} has an empty key"
            )));
        }
        annotations.insert(key.to_string(), value.to_string());
    }
    Ok(Some(annotations))
}
