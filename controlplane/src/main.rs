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

use controlplane::config::{Command, Opt};
use controlplane::*;

use anyhow::Context as _;
use clap::Parser;
use kube::{Api, Client};
use tracing::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rollout = opt.rollout_context()?;
    let client = Client::try_default()
        .await
        .context("failed to create kube Client")?;
    let mappings = mapping_api(client.clone(), &rollout.namespace);

    if opt.no_events {
        let reconciler = Reconciler::new(rollout, mappings, LogEventRecorder);
        run(&opt, &reconciler).await
    } else {
        let recorder = KubeEventRecorder::new(client, &rollout);
        let reconciler = Reconciler::new(rollout, mappings, recorder);
        run(&opt, &reconciler).await
    }
}

async fn run<R>(opt: &Opt, reconciler: &Reconciler<Api<Mapping>, R>) -> anyhow::Result<()>
where
    R: EventRecorder + Sync,
{
    let rollout = reconciler.rollout();
    match opt.command {
        Command::SetWeight { weight, notify } => {
            info!(
                router = reconciler.type_name(),
                rollout = %rollout.name,
                weight,
                "setting canary weight"
            );
            reconciler.set_weight(weight).await?;
            if notify {
                Webhook::new(opt.webhook_secret.clone())
                    .send_set_weight_event(weight, rollout)
                    .await;
            }
        }
        Command::VerifyWeight { weight } => {
            let verified = reconciler.verify_weight(weight).await?;
            println!("{verified}");
        }
    }
    Ok(())
}
